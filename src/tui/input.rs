// poll for input, resolve key presses into InputEvents.
//
// Keybinds:
//   1234 qwer asdf zxcv   the 16 pads
//   Space                 play/pause
//   g                     auto chop (ask the analyzer for slices)
//   0                     clear slices
//   Tab                   next wav in the project dir
//   [ / ]                 strip zoom out / in
//   Esc                   quit

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::pads;
use crate::shared::InputEvent;

use super::mode::TuiState;

// repeats inside this window are treated as one press
const PAD_DEBOUNCE: Duration = Duration::from_millis(50);

pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        // with keyboard enhancement on, auto-repeat arrives as Repeat and
        // gets filtered here; the time window below catches the rest
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, ts));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],
        KeyCode::Tab => vec![InputEvent::NextTrack],
        KeyCode::Char('g') | KeyCode::Char('G') => vec![InputEvent::AutoChop],
        KeyCode::Char('0') => vec![InputEvent::ClearSlices],
        KeyCode::Char('[') => vec![InputEvent::ZoomOut],
        KeyCode::Char(']') => vec![InputEvent::ZoomIn],

        KeyCode::Char(c) => match pads::key_to_slot(c) {
            Some(slot) if debounced(slot, ts) => vec![InputEvent::PadDown(slot as u8)],
            _ => vec![],
        },

        _ => vec![],
    }
}

// true if the press should go through, recording it as the latest
fn debounced(slot: usize, ts: &mut TuiState) -> bool {
    let now = Instant::now();
    let pass = match ts.last_pad_press[slot] {
        Some(last) => now.duration_since(last) >= PAD_DEBOUNCE,
        None => true,
    };
    if pass {
        ts.last_pad_press[slot] = Some(now);
    }
    pass
}

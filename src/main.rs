mod analysis;
mod coordinator;
mod pads;
mod player;
mod region;
mod shared;
mod slice;
mod transport;
mod tui;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use analysis::{start_analysis_worker, CommandAnalyzer};
use coordinator::Coordinator;
use shared::InputEvent;
use tui::mode::TuiState;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;
    // Enable keyboard enhancement so auto-repeat is distinguishable from
    // real presses. Falls back gracefully if the terminal doesn't support it.
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        )
    );
    let _guard = RawModeGuard; // auto drops when out of scope

    let player = player::start_player()?;
    let analysis = start_analysis_worker(Box::new(CommandAnalyzer::from_env()));
    let mut coordinator = Coordinator::new(player, analysis);

    let project_dir: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let tracks = wav_files(&project_dir);
    log::info!("{} wav file(s) in {}", tracks.len(), project_dir.display());

    let mut track_idx = 0;
    if let Some(first) = tracks.first() {
        coordinator.select_track(first.clone());
    }

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let blink_start = Instant::now();
    let mut tui_state = TuiState::default();

    loop {
        // drain player events and analysis results, then draw the snapshot
        coordinator.tick();
        let ds = coordinator.display_state();
        let blink_on = (blink_start.elapsed().as_millis() / 250) % 2 == 0;

        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, tui_state.zoom, blink_on);
        })?;

        let events = tui::input::poll_input(tick_rate, &mut tui_state)?;
        for event in events {
            match event {
                InputEvent::Quit => {
                    drop(term);
                    return Ok(());
                }
                InputEvent::NextTrack => {
                    if !tracks.is_empty() {
                        track_idx = (track_idx + 1) % tracks.len();
                        coordinator.select_track(tracks[track_idx].clone());
                    }
                }
                InputEvent::ZoomIn => tui_state.zoom = (tui_state.zoom * 1.25).min(40.0),
                InputEvent::ZoomOut => tui_state.zoom = (tui_state.zoom / 1.25).max(1.0),
                other => coordinator.handle_input(other),
            }
        }
    }
}

fn wav_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
        })
        .collect();
    files.sort();
    files
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}

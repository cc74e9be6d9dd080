// Types shared between the tui, the coordinator, and the player.
//
// The flow of a frame:
//   - tui::input resolves key presses into InputEvents
//   - main hands them to the coordinator (except quit/track cycling/zoom,
//     which it handles itself)
//   - the coordinator talks to the player and the analysis worker
//   - tui::view renders whatever `coordinator.display_state()` says, and
//     nothing else. The tui never touches the player.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::region::Region;

pub const NUM_PADS: usize = 16;

// slices closer together than this are considered the same slice
pub const SLICE_EPSILON: f64 = 0.05;

// fancy atomic counter lets us mint unique track ids from any thread
static NEXT_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrackId(pub u64);

pub fn next_track_id() -> TrackId {
    TrackId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // one of the 16 grid pads (1234 qwer asdf zxcv)
    PadDown(u8),

    // "play/pause" button (space)
    PlayPress,

    // "auto chop" button (g): ask the analyzer for slice points
    AutoChop,

    // clear all slices (0)
    ClearSlices,

    // cycle to the next wav in the project dir (tab)
    NextTrack,

    // region strip zoom ([ / ])
    ZoomIn,
    ZoomOut,

    // quit button (esc)
    Quit,
}

// Everything the tui needs to draw one frame. Built fresh by the
// coordinator each tick; the view holds no state of its own besides zoom.
#[derive(Clone, Debug)]
pub struct DisplayState {
    pub pads_live: [bool; NUM_PADS],
    pub flash_pad: Option<u8>, // pad that was just triggered, for feedback
    pub playing: bool,
    pub state_label: &'static str, // "IDLE", "LOADED", ...
    pub track_name: String,
    pub current_time: f64,
    pub duration: Option<f64>, // None until the player reports ready
    pub processing: bool,
    pub status_message: String,
    pub bpm: Option<f32>,
    pub genre: Option<String>,
    pub regions: Vec<Region>,
}

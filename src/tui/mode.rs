// state local to the tui: per-pad debounce timestamps and the strip zoom.
// everything else the view needs comes from DisplayState each frame.

use std::time::Instant;

use crate::shared::NUM_PADS;

#[derive(Clone, Debug)]
pub struct TuiState {
    pub last_pad_press: [Option<Instant>; NUM_PADS],
    pub zoom: f64, // region strip columns per second
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            last_pad_press: [None; NUM_PADS],
            zoom: 4.0,
        }
    }
}

// The seam between the coordinator and the player. The coordinator owns
// exactly one Transport and nothing else in the app is allowed to command
// playback; that keeps the state machine authoritative. Tests swap in a fake
// that records what was sent.

use std::path::Path;

use crate::shared::TrackId;

pub trait Transport {
    // start decoding a new track; Ready (or LoadFailed) comes back tagged
    // with the same id
    fn load(&mut self, track: TrackId, path: &Path);

    fn play_pause(&mut self);

    // seek to `start` and play until `end`, in seconds
    fn play_region(&mut self, start: f64, end: f64);

    // drain one pending event, if any. The coordinator calls this in a loop
    // every tick so events are processed in arrival order.
    fn poll_event(&mut self) -> Option<TransportEvent>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    Ready { track: TrackId, duration: f64 },
    LoadFailed { track: TrackId, message: String },
    TimeUpdate(f64),
    Finished,
}

// Playback engine living inside the cpal callback. Holds at most one decoded
// track and a single playhead; a bounded-region trigger is just a seek plus
// an end fence. No allocation in the render path.

use crossbeam_channel::Sender;

use super::buffer::{StereoFrame, TrackBuffer};

// ~10 time updates a second is plenty for a status line
const TIME_UPDATE_INTERVAL: usize = 4096;

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Time(f64),
    Finished,
}

pub enum EngineCommand {
    SetTrack(TrackBuffer),
    PlayPause,
    PlayRegion { start: f64, end: f64 },
}

pub struct Engine {
    sample_rate: f64,
    buffer: Option<TrackBuffer>,
    pos: usize,                // playhead, in frames
    fence: Option<usize>,      // stop here when playing a region
    playing: bool,
    frames_since_update: usize,
    events: Sender<EngineEvent>,
}

impl Engine {
    pub fn new(sample_rate: u32, events: Sender<EngineEvent>) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            buffer: None,
            pos: 0,
            fence: None,
            playing: false,
            frames_since_update: 0,
            events,
        }
    }

    pub fn handle_cmd(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::SetTrack(buffer) => {
                self.buffer = Some(buffer);
                self.pos = 0;
                self.fence = None;
                self.playing = false;
            }
            EngineCommand::PlayPause => {
                if let Some(buffer) = &self.buffer {
                    if !self.playing {
                        // resuming past the end restarts from the top
                        if self.pos >= buffer.data.len() {
                            self.pos = 0;
                        }
                        self.fence = None;
                    }
                    self.playing = !self.playing;
                }
            }
            EngineCommand::PlayRegion { start, end } => {
                if let Some(buffer) = &self.buffer {
                    let len = buffer.data.len();
                    self.pos = (self.to_frames(start)).min(len);
                    self.fence = Some(self.to_frames(end).min(len));
                    self.playing = true;
                }
            }
        }
    }

    fn to_frames(&self, seconds: f64) -> usize {
        (seconds.max(0.0) * self.sample_rate) as usize
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            *frame = StereoFrame::default();
        }
        let Some(buffer) = &self.buffer else { return };
        if !self.playing {
            return;
        }

        let end = self.fence.unwrap_or(buffer.data.len()).min(buffer.data.len());

        for frame in out.iter_mut() {
            if self.pos >= end {
                self.playing = false;
                self.fence = None;
                let _ = self.events.try_send(EngineEvent::Finished);
                break;
            }
            *frame = buffer.data[self.pos];
            self.pos += 1;
            self.frames_since_update += 1;
        }

        if self.frames_since_update >= TIME_UPDATE_INTERVAL {
            self.frames_since_update = 0;
            let t = self.pos as f64 / self.sample_rate;
            let _ = self.events.try_send(EngineEvent::Time(t));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_track(seconds: f64) -> (Engine, crossbeam_channel::Receiver<EngineEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(64);
        let mut engine = Engine::new(100, tx); // 100 Hz keeps the math readable
        let frames = (seconds * 100.0) as usize;
        engine.handle_cmd(EngineCommand::SetTrack(TrackBuffer {
            data: vec![StereoFrame { left: 0.5, right: 0.5 }; frames],
            sample_rate: 100,
        }));
        (engine, rx)
    }

    #[test]
    fn region_playback_stops_at_the_fence() {
        let (mut engine, rx) = engine_with_track(10.0);
        engine.handle_cmd(EngineCommand::PlayRegion { start: 1.0, end: 2.0 });

        // 1s of audio at 100 Hz is 100 frames; render a little more
        let mut out = vec![StereoFrame::default(); 150];
        engine.render_block(&mut out);

        assert!(out[99].left != 0.0);
        assert_eq!(out[100].left, 0.0); // silence past the fence
        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.contains(&EngineEvent::Finished));
    }

    #[test]
    fn play_pause_toggles_and_silence_while_paused() {
        let (mut engine, _rx) = engine_with_track(10.0);
        let mut out = vec![StereoFrame::default(); 10];

        engine.render_block(&mut out);
        assert_eq!(out[0].left, 0.0); // not playing yet

        engine.handle_cmd(EngineCommand::PlayPause);
        engine.render_block(&mut out);
        assert!(out[0].left != 0.0);

        engine.handle_cmd(EngineCommand::PlayPause);
        engine.render_block(&mut out);
        assert_eq!(out[0].left, 0.0);
    }

    #[test]
    fn commands_without_a_track_are_noops() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let mut engine = Engine::new(100, tx);
        engine.handle_cmd(EngineCommand::PlayPause);
        engine.handle_cmd(EngineCommand::PlayRegion { start: 0.0, end: 1.0 });
        let mut out = vec![StereoFrame::default(); 4];
        engine.render_block(&mut out);
        assert!(rx.try_recv().is_err());
    }
}

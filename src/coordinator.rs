// The playback coordinator: the one place where transport state lives and
// the only holder of the Transport handle. Input events, player events, and
// analysis results all land here, one at a time, on the event loop.
//
// Everything that arrives asynchronously (decode readiness, analysis
// results) is tagged with the TrackId it was requested for; a tag that no
// longer matches the current track means the result is stale and gets
// dropped on the floor. Undefined (state, event) combinations are no-ops,
// never errors.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::analysis::{AnalysisHandle, AnalysisJob, AnalysisResult};
use crate::pads;
use crate::region::{self, Region};
use crate::shared::{next_track_id, DisplayState, InputEvent, TrackId, NUM_PADS};
use crate::slice;
use crate::transport::{Transport, TransportEvent};

// how long a triggered pad stays lit
const PAD_FLASH: Duration = Duration::from_millis(150);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Idle,   // no track ready; transport must not be commanded
    Loaded, // duration known, not playing
    Playing,
    Paused,
}

impl TransportState {
    fn label(self) -> &'static str {
        match self {
            TransportState::Idle => "IDLE",
            TransportState::Loaded => "LOADED",
            TransportState::Playing => "PLAYING",
            TransportState::Paused => "PAUSED",
        }
    }
}

struct Track {
    id: TrackId,
    path: PathBuf,
    name: String,
    duration: Option<f64>,
}

pub struct Coordinator<T: Transport> {
    transport: T,
    analysis: AnalysisHandle,
    state: TransportState,
    track: Option<Track>,
    slices: Vec<f64>,
    regions: Vec<Region>,
    outstanding: Option<TrackId>, // analysis request in flight, if any
    processing: bool,
    status: String,
    bpm: Option<f32>,
    genre: Option<String>,
    current_time: f64,
    flash: Option<(u8, Instant)>,
}

impl<T: Transport> Coordinator<T> {
    pub fn new(transport: T, analysis: AnalysisHandle) -> Self {
        Self {
            transport,
            analysis,
            state: TransportState::Idle,
            track: None,
            slices: Vec::new(),
            regions: Vec::new(),
            outstanding: None,
            processing: false,
            status: String::new(),
            bpm: None,
            genre: None,
            current_time: 0.0,
            flash: None,
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PadDown(slot) => self.trigger_pad(slot as usize),
            InputEvent::PlayPress => self.toggle_play(),
            InputEvent::AutoChop => self.request_analysis(),
            InputEvent::ClearSlices => self.clear_slices(),
            // quit, track cycling and zoom are main's business
            _ => {}
        }
    }

    // Selecting a file replaces the track wholesale: fresh id, empty slice
    // set, state back to Idle until the player reports the decoded duration.
    // Anything still in flight for the old id becomes stale by definition.
    pub fn select_track(&mut self, path: PathBuf) {
        let id = next_track_id();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        log::info!("track selected: {name} ({id:?})");

        self.state = TransportState::Idle;
        self.slices.clear();
        self.regions.clear();
        self.outstanding = None;
        self.bpm = None;
        self.genre = None;
        self.current_time = 0.0;
        self.processing = true;
        self.status = format!("loading {name}...");

        self.transport.load(id, &path);
        self.track = Some(Track { id, path, name, duration: None });
    }

    fn toggle_play(&mut self) {
        match self.state {
            // duration unknown; commanding the player here is the one misuse
            // it can't survive, so the guard is the feature
            TransportState::Idle => {}
            TransportState::Loaded | TransportState::Paused => {
                self.transport.play_pause();
                self.state = TransportState::Playing;
            }
            TransportState::Playing => {
                self.transport.play_pause();
                self.state = TransportState::Paused;
            }
        }
    }

    fn trigger_pad(&mut self, slot: usize) {
        if self.state == TransportState::Idle {
            return;
        }
        if let Some(r) = pads::resolve(slot, &self.regions) {
            self.transport.play_region(r.start, r.end);
            self.state = TransportState::Playing;
            self.flash = Some((slot as u8, Instant::now()));
        }
        // inert pad: no-op
    }

    fn clear_slices(&mut self) {
        self.slices.clear();
        self.resync_regions();
    }

    fn request_analysis(&mut self) {
        let Some(track) = &self.track else { return };
        if self.outstanding.is_some() {
            return; // one request at a time
        }
        let accepted = self.analysis.request(AnalysisJob {
            track: track.id,
            path: track.path.clone(),
            mime_type: mime_for_path(&track.path),
        });
        if accepted {
            self.outstanding = Some(track.id);
            self.processing = true;
            self.status = "analyzing audio...".to_string();
        } else {
            // queue refused the job; don't latch processing on a request
            // that will never come back
            self.status = "analyzer busy, try again".to_string();
        }
    }

    pub fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Ready { track, duration } => {
                let Some(t) = self.track.as_mut().filter(|t| t.id == track) else {
                    log::debug!("ignoring ready event for stale {track:?}");
                    return;
                };
                t.duration = Some(duration);
                if self.state == TransportState::Idle {
                    self.state = TransportState::Loaded;
                }
                self.processing = false;
                self.status.clear();
                self.resync_regions();
            }
            TransportEvent::LoadFailed { track, message } => {
                if self.track.as_ref().is_some_and(|t| t.id == track) {
                    self.processing = false;
                    self.status = format!("load failed: {message}");
                }
            }
            TransportEvent::TimeUpdate(t) => self.current_time = t,
            TransportEvent::Finished => {
                if self.state == TransportState::Playing {
                    self.state = TransportState::Loaded;
                }
            }
        }
    }

    pub fn on_analysis_result(&mut self, result: AnalysisResult) {
        if self.track.as_ref().map(|t| t.id) != Some(result.track) {
            log::debug!("discarding stale analysis result for {:?}", result.track);
            return;
        }
        self.outstanding = None;
        self.processing = false;

        if result.degraded {
            // keep whatever slices we already had; one status line is the
            // only thing the user sees of the failure
            self.status = "analysis failed".to_string();
            return;
        }

        self.slices = slice::normalize(&result.response.slices);
        self.bpm = result.response.bpm;
        self.genre = result.response.genre;
        self.status = format!("analysis complete: {} slices", self.slices.len());
        self.resync_regions();
    }

    fn resync_regions(&mut self) {
        let duration = self.track.as_ref().and_then(|t| t.duration);
        self.regions = region::synchronize(&self.slices, duration);
    }

    // Drain collaborators once per event-loop tick, in arrival order.
    pub fn tick(&mut self) {
        while let Some(event) = self.transport.poll_event() {
            self.on_transport_event(event);
        }
        while let Some(result) = self.analysis.poll() {
            self.on_analysis_result(result);
        }
        if let Some((_, since)) = self.flash {
            if since.elapsed() >= PAD_FLASH {
                self.flash = None;
            }
        }
    }

    pub fn display_state(&self) -> DisplayState {
        let mut pads_live = [false; NUM_PADS];
        for slot in 0..NUM_PADS {
            pads_live[slot] = pads::resolve(slot, &self.regions).is_some();
        }
        DisplayState {
            pads_live,
            flash_pad: self.flash.map(|(slot, _)| slot),
            playing: self.state == TransportState::Playing,
            state_label: self.state.label(),
            track_name: self
                .track
                .as_ref()
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            current_time: self.current_time,
            duration: self.track.as_ref().and_then(|t| t.duration),
            processing: self.processing,
            status_message: self.status.clone(),
            bpm: self.bpm,
            genre: self.genre.clone(),
            regions: self.regions.clone(),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn slices(&self) -> &[f64] {
        &self.slices
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

fn mime_for_path(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav".to_string(),
        Some("mp3") => "audio/mpeg".to_string(),
        Some("flac") => "audio/flac".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{start_analysis_worker, AnalysisRequest, AnalysisResponse, SliceAnalyzer};
    use std::collections::VecDeque;

    // records every command; events are fed in by the test
    #[derive(Default)]
    struct FakeTransport {
        commands: Vec<String>,
        events: VecDeque<TransportEvent>,
    }

    impl Transport for FakeTransport {
        fn load(&mut self, track: TrackId, path: &Path) {
            self.commands.push(format!("load {:?} {}", track, path.display()));
        }
        fn play_pause(&mut self) {
            self.commands.push("play_pause".to_string());
        }
        fn play_region(&mut self, start: f64, end: f64) {
            self.commands.push(format!("play_region {start} {end}"));
        }
        fn poll_event(&mut self) -> Option<TransportEvent> {
            self.events.pop_front()
        }
    }

    struct NeverCalled;
    impl SliceAnalyzer for NeverCalled {
        fn analyze(&self, _: &AnalysisRequest) -> anyhow::Result<AnalysisResponse> {
            anyhow::bail!("tests drive on_analysis_result directly");
        }
    }

    fn coordinator() -> Coordinator<FakeTransport> {
        Coordinator::new(
            FakeTransport::default(),
            start_analysis_worker(Box::new(NeverCalled)),
        )
    }

    fn current_id<T: Transport>(c: &Coordinator<T>) -> TrackId {
        c.track.as_ref().unwrap().id
    }

    fn ready(c: &mut Coordinator<FakeTransport>, duration: f64) {
        let track = current_id(c);
        c.on_transport_event(TransportEvent::Ready { track, duration });
    }

    fn analysis(track: TrackId, slices: Vec<f64>) -> AnalysisResult {
        AnalysisResult {
            track,
            response: AnalysisResponse { slices, bpm: Some(128.0), genre: None },
            degraded: false,
        }
    }

    #[test]
    fn scenario_a_analysis_then_ready_builds_live_pads() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("kick.wav"));
        let id = current_id(&c);

        c.on_analysis_result(analysis(id, vec![1.002, 0.0, 0.0, 3.5]));
        assert_eq!(c.slices(), &[0.0, 1.002, 3.5]);
        assert!(c.regions().is_empty()); // duration still unknown

        ready(&mut c, 5.0);
        let regions = c.regions();
        assert_eq!(regions.len(), 3);
        assert_eq!((regions[0].start, regions[0].end), (0.0, 1.002));
        assert_eq!((regions[1].start, regions[1].end), (1.002, 3.5));
        assert_eq!((regions[2].start, regions[2].end), (3.5, 5.0));

        let ds = c.display_state();
        assert_eq!(&ds.pads_live[..3], &[true, true, true]);
        assert!(ds.pads_live[3..].iter().all(|live| !live));
    }

    #[test]
    fn scenario_a_reversed_arrival_order_gives_the_same_regions() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("kick.wav"));
        let id = current_id(&c);

        ready(&mut c, 5.0);
        assert!(c.regions().is_empty()); // no slices yet

        c.on_analysis_result(analysis(id, vec![1.002, 0.0, 0.0, 3.5]));
        assert_eq!(c.regions().len(), 3);
        assert_eq!(c.regions()[2].end, 5.0);
    }

    #[test]
    fn scenario_b_toggle_and_finish_walk_the_state_machine() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("loop.wav"));
        assert_eq!(c.state(), TransportState::Idle);

        ready(&mut c, 12.0);
        assert_eq!(c.state(), TransportState::Loaded);

        c.handle_input(InputEvent::PlayPress);
        assert_eq!(c.state(), TransportState::Playing);

        c.on_transport_event(TransportEvent::Finished);
        assert_eq!(c.state(), TransportState::Loaded);
    }

    #[test]
    fn scenario_c_trigger_while_idle_is_a_noop() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("loop.wav"));
        let loads = c.transport.commands.len(); // just the load command

        c.handle_input(InputEvent::PadDown(0));
        c.handle_input(InputEvent::PlayPress);

        assert_eq!(c.state(), TransportState::Idle);
        assert_eq!(c.transport.commands.len(), loads); // nothing reached the player
    }

    #[test]
    fn scenario_d_stale_analysis_result_is_discarded() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("first.wav"));
        let old_id = current_id(&c);
        c.handle_input(InputEvent::AutoChop); // request outstanding for first.wav

        c.select_track(PathBuf::from("second.wav"));
        ready(&mut c, 8.0);

        c.on_analysis_result(analysis(old_id, vec![0.0, 1.0, 2.0]));
        assert!(c.slices().is_empty());
        assert!(c.regions().is_empty());
    }

    #[test]
    fn stale_ready_event_is_ignored() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("first.wav"));
        let old_id = current_id(&c);
        c.select_track(PathBuf::from("second.wav"));

        c.on_transport_event(TransportEvent::Ready { track: old_id, duration: 99.0 });
        assert_eq!(c.state(), TransportState::Idle);
        assert_eq!(c.display_state().duration, None);
    }

    #[test]
    fn trigger_plays_the_resolved_region_and_inert_pads_do_nothing() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("loop.wav"));
        let id = current_id(&c);
        ready(&mut c, 5.0);
        c.on_analysis_result(analysis(id, vec![0.0, 2.0]));

        c.handle_input(InputEvent::PadDown(1));
        assert_eq!(c.state(), TransportState::Playing);
        assert_eq!(c.transport.commands.last().unwrap(), "play_region 2 5");

        let before = c.transport.commands.len();
        c.handle_input(InputEvent::PadDown(9)); // inert
        assert_eq!(c.transport.commands.len(), before);
        assert_eq!(c.display_state().flash_pad, Some(1));
    }

    #[test]
    fn toggle_round_trips_between_playing_and_paused() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("loop.wav"));
        ready(&mut c, 3.0);

        c.handle_input(InputEvent::PlayPress);
        assert_eq!(c.state(), TransportState::Playing);
        c.handle_input(InputEvent::PlayPress);
        assert_eq!(c.state(), TransportState::Paused);
        c.handle_input(InputEvent::PlayPress);
        assert_eq!(c.state(), TransportState::Playing);
    }

    #[test]
    fn clear_slices_empties_regions_but_not_transport_state() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("loop.wav"));
        let id = current_id(&c);
        ready(&mut c, 5.0);
        c.on_analysis_result(analysis(id, vec![0.0, 1.0]));
        c.handle_input(InputEvent::PlayPress);

        c.handle_input(InputEvent::ClearSlices);
        assert!(c.slices().is_empty());
        assert!(c.regions().is_empty());
        assert_eq!(c.state(), TransportState::Playing);
    }

    #[test]
    fn degraded_result_keeps_prior_slices_and_reports_failure() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("loop.wav"));
        let id = current_id(&c);
        ready(&mut c, 5.0);
        c.on_analysis_result(analysis(id, vec![0.0, 1.0]));
        assert_eq!(c.slices().len(), 2);

        c.on_analysis_result(AnalysisResult {
            track: id,
            response: AnalysisResponse::degraded(),
            degraded: true,
        });
        assert_eq!(c.slices(), &[0.0, 1.0]);
        assert_eq!(c.display_state().status_message, "analysis failed");
    }

    #[test]
    fn selecting_a_track_resets_slices_and_metadata() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("a.wav"));
        let id = current_id(&c);
        ready(&mut c, 5.0);
        c.on_analysis_result(analysis(id, vec![0.0, 1.0]));
        assert!(!c.slices().is_empty());

        c.select_track(PathBuf::from("b.wav"));
        assert_eq!(c.state(), TransportState::Idle);
        assert!(c.slices().is_empty());
        assert!(c.regions().is_empty());
        assert_eq!(c.display_state().bpm, None);
    }

    #[test]
    fn only_one_analysis_request_may_be_outstanding() {
        let mut c = coordinator();
        c.select_track(PathBuf::from("a.wav"));
        c.handle_input(InputEvent::AutoChop);
        assert!(c.outstanding.is_some());
        let first = c.outstanding;

        c.handle_input(InputEvent::AutoChop);
        assert_eq!(c.outstanding, first);
    }

    #[test]
    fn refused_analysis_request_does_not_latch_processing() {
        let (handle, _jobs) = AnalysisHandle::with_full_queue();
        let mut c = Coordinator::new(FakeTransport::default(), handle);
        c.select_track(PathBuf::from("a.wav"));
        ready(&mut c, 4.0);

        c.handle_input(InputEvent::AutoChop);
        assert!(c.outstanding.is_none());
        assert!(!c.display_state().processing);
        assert_eq!(c.display_state().status_message, "analyzer busy, try again");
    }
}

// Background analysis worker. Reading the file, base64-encoding it, and the
// analyzer call itself are all slow; they run on this thread so the event
// loop never blocks. Results come back over a channel tagged with the
// TrackId they were requested for — the coordinator drops anything whose tag
// no longer matches the current track. That tag is the whole cancellation
// story: an outstanding request is never aborted, just ignored on arrival.

use std::path::PathBuf;
use std::thread;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use crossbeam_channel::{Receiver, Sender};

use crate::shared::TrackId;

use super::{analyze_or_degraded, AnalysisRequest, AnalysisResponse, SliceAnalyzer, ANALYSIS_TASK};

#[derive(Clone, Debug)]
pub struct AnalysisJob {
    pub track: TrackId,
    pub path: PathBuf,
    pub mime_type: String,
}

#[derive(Clone, Debug)]
pub struct AnalysisResult {
    pub track: TrackId,
    pub response: AnalysisResponse,
    pub degraded: bool,
}

pub struct AnalysisHandle {
    tx: Sender<AnalysisJob>,
    rx: Receiver<AnalysisResult>,
}

impl AnalysisHandle {
    // Returns false when the queue won't take the job (worker wedged or
    // gone); the caller must not treat it as outstanding in that case.
    pub fn request(&self, job: AnalysisJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("analysis queue refused job: {e}");
                false
            }
        }
    }

    pub fn poll(&self) -> Option<AnalysisResult> {
        self.rx.try_recv().ok()
    }

    // A handle whose job queue accepts nothing, for exercising the refusal
    // path without a worker thread. The returned receiver keeps the queue
    // connected.
    #[cfg(test)]
    pub(crate) fn with_full_queue() -> (Self, Receiver<AnalysisJob>) {
        let (tx, job_rx) = crossbeam_channel::bounded(0);
        let (_result_tx, result_rx) = crossbeam_channel::bounded(1);
        (Self { tx, rx: result_rx }, job_rx)
    }
}

pub fn start_analysis_worker(analyzer: Box<dyn SliceAnalyzer>) -> AnalysisHandle {
    let (job_tx, job_rx) = crossbeam_channel::bounded::<AnalysisJob>(8);
    let (result_tx, result_rx) = crossbeam_channel::bounded::<AnalysisResult>(8);

    thread::spawn(move || {
        log::info!("analysis worker started");
        for job in job_rx.iter() {
            let result = run_job(analyzer.as_ref(), job);
            if result_tx.try_send(result).is_err() {
                // main loop gone or wedged; nothing useful left to do
                break;
            }
        }
        log::info!("analysis worker shutting down");
    });

    AnalysisHandle { tx: job_tx, rx: result_rx }
}

fn run_job(analyzer: &dyn SliceAnalyzer, job: AnalysisJob) -> AnalysisResult {
    let (response, degraded) = match std::fs::read(&job.path) {
        Ok(bytes) => {
            let request = AnalysisRequest {
                audio: BASE64.encode(&bytes),
                mime_type: job.mime_type,
                task: ANALYSIS_TASK.to_string(),
            };
            analyze_or_degraded(analyzer, &request)
        }
        Err(e) => {
            log::warn!("could not read {} for analysis: {e}", job.path.display());
            (AnalysisResponse::degraded(), true)
        }
    };

    AnalysisResult { track: job.track, response, degraded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::next_track_id;

    fn job() -> AnalysisJob {
        AnalysisJob {
            track: next_track_id(),
            path: PathBuf::from("missing.wav"),
            mime_type: "audio/wav".to_string(),
        }
    }

    #[test]
    fn request_reports_a_refused_job() {
        let (handle, _jobs) = AnalysisHandle::with_full_queue();
        assert!(!handle.request(job()));
    }

    #[test]
    fn request_reports_acceptance() {
        struct NeverRuns;
        impl SliceAnalyzer for NeverRuns {
            fn analyze(&self, _: &AnalysisRequest) -> anyhow::Result<AnalysisResponse> {
                anyhow::bail!("not expected to run in this test");
            }
        }

        let handle = start_analysis_worker(Box::new(NeverRuns));
        assert!(handle.request(job()));
    }
}

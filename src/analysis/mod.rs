// The analyzer boundary. The actual analysis (transient detection, tempo,
// genre) happens in an external service; this module owns the wire schema,
// the SliceAnalyzer trait the coordinator is injected with, and the degraded
// fallback that turns any failure into a result the core can still chew on.

use serde::{Deserialize, Serialize};

mod command;
mod worker;

pub use command::CommandAnalyzer;
pub use worker::{start_analysis_worker, AnalysisHandle, AnalysisJob, AnalysisResult};

// the fixed task description sent with every request
pub const ANALYSIS_TASK: &str = "Chop this audio sample into playable slices \
for a 4x4 pad controller (16 pads). Identify up to 16 musically significant \
transient attacks (kicks, snares, sample starts) or phrase changes and return \
their start times in seconds. Always include 0.0 as the first slice. Keep \
slices distinct: no two closer than 0.05s. Respond with a JSON object \
containing 'slices' (array of numbers, required), 'bpm' (number, optional) \
and 'genre' (short string, optional).";

#[derive(Clone, Debug, Serialize)]
pub struct AnalysisRequest {
    // base64 of the raw file bytes
    pub audio: String,
    pub mime_type: String,
    pub task: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AnalysisResponse {
    pub slices: Vec<f64>,
    #[serde(default)]
    pub bpm: Option<f32>,
    #[serde(default)]
    pub genre: Option<String>,
}

impl AnalysisResponse {
    // what the boundary hands back when the service is unreachable or talks
    // nonsense: a single slice at the start of the track
    pub fn degraded() -> Self {
        Self {
            slices: vec![0.0],
            bpm: None,
            genre: Some("Unknown".to_string()),
        }
    }
}

pub trait SliceAnalyzer: Send {
    fn analyze(&self, request: &AnalysisRequest) -> anyhow::Result<AnalysisResponse>;
}

// Failures never leave this boundary; the second field says whether the
// response is the degraded fallback so the coordinator can show a failure
// status without special-casing the payload.
pub fn analyze_or_degraded(
    analyzer: &dyn SliceAnalyzer,
    request: &AnalysisRequest,
) -> (AnalysisResponse, bool) {
    match analyzer.analyze(request) {
        Ok(response) => (response, false),
        Err(e) => {
            log::warn!("analysis failed: {e:#}");
            (AnalysisResponse::degraded(), true)
        }
    }
}

// Subprocess-IPC analyzer: the request JSON goes to the child's stdin, the
// response JSON comes back on its stdout. Which executable to run comes from
// the environment, so the real service (or a shell script faking one) can be
// swapped in without a rebuild.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::Context;

use super::{AnalysisRequest, AnalysisResponse, SliceAnalyzer};

pub const ANALYZER_ENV: &str = "SLICEPAD_ANALYZER";

pub struct CommandAnalyzer {
    program: Option<PathBuf>,
}

impl CommandAnalyzer {
    pub fn from_env() -> Self {
        let program = std::env::var(ANALYZER_ENV).ok().map(PathBuf::from);
        if program.is_none() {
            log::warn!("{ANALYZER_ENV} not set; auto chop will return the degraded result");
        }
        Self { program }
    }
}

impl SliceAnalyzer for CommandAnalyzer {
    fn analyze(&self, request: &AnalysisRequest) -> anyhow::Result<AnalysisResponse> {
        let program = self
            .program
            .as_ref()
            .with_context(|| format!("{ANALYZER_ENV} is not set"))?;

        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn analyzer {}", program.display()))?;

        {
            let mut stdin = child.stdin.take().context("analyzer stdin unavailable")?;
            let body = serde_json::to_vec(request)?;
            stdin.write_all(&body).context("failed to write analysis request")?;
            // dropping stdin closes the pipe so the child sees EOF
        }

        let output = child.wait_with_output().context("analyzer did not exit")?;
        if !output.status.success() {
            anyhow::bail!("analyzer exited with {}", output.status);
        }

        serde_json::from_slice(&output.stdout).context("analyzer returned invalid JSON")
    }
}

//! Result aggregation, console rendering, and durable report persistence

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compare::{Status, Verdict};
use crate::error::{VerifyError, VerifyResult};

/// Per-status counts over one run's verdicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub pass_rate_percent: f64,
}

/// Single pass over the verdict sequence. A zero-verdict run has a pass
/// rate of 0, not a division error.
pub fn summarize(verdicts: &[Verdict]) -> RunSummary {
    let mut passed = 0;
    let mut failed = 0;
    let mut errors = 0;
    for verdict in verdicts {
        match verdict.status {
            Status::Passed => passed += 1,
            Status::Failed => failed += 1,
            Status::Error => errors += 1,
        }
    }

    let total = verdicts.len();
    let pass_rate_percent = if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    };

    RunSummary {
        total,
        passed,
        failed,
        errors,
        pass_rate_percent,
    }
}

/// Where and how the run executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub platform: String,
    pub arch: String,
    pub cwd: String,
    pub runtime: String,
}

impl Environment {
    pub fn capture() -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cwd: std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            runtime: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

/// The durable, structured summary of one complete run. Created once at the
/// end of a run; written to disk exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: String,
    pub target: String,
    pub total_duration_ms: u64,
    pub summary: RunSummary,
    pub environment: Environment,
    pub results: Vec<Verdict>,
}

impl RunReport {
    pub fn new(target: &str, total_duration_ms: u64, results: Vec<Verdict>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            target: target.to_string(),
            total_duration_ms,
            summary: summarize(&results),
            environment: Environment::capture(),
            results,
        }
    }
}

/// Report file name derived from the run timestamp, with characters that are
/// unsafe in filenames replaced.
pub fn report_filename(timestamp: &str) -> String {
    let safe: String = timestamp
        .chars()
        .map(|c| if c == ':' || c == '.' { '-' } else { c })
        .collect();
    format!("test-report-{}.json", safe)
}

/// Serialize the report to a uniquely named file in `dir`.
///
/// The content is written to a temp file in the same directory and renamed
/// into place, so the caller either sees the full report or an error, never
/// a partial file.
pub fn write_report(dir: &Path, report: &RunReport) -> VerifyResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| VerifyError::ReportWrite(format!("{}: {}", dir.display(), e)))?;

    let path = dir.join(report_filename(&report.timestamp));
    let json = serde_json::to_vec_pretty(report)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| VerifyError::ReportWrite(e.to_string()))?;
    tmp.write_all(&json)
        .map_err(|e| VerifyError::ReportWrite(e.to_string()))?;
    tmp.persist(&path)
        .map_err(|e| VerifyError::ReportWrite(e.to_string()))?;

    info!("Report written to: {}", path.display());
    Ok(path)
}

/// Human-readable run summary. Presentation only, not a stable contract.
pub fn render_console(report: &RunReport) {
    let summary = &report.summary;

    info!("");
    info!("Test results for {}:", report.target);
    for (i, verdict) in report.results.iter().enumerate() {
        info!(
            "{:>2}. {} {} - {}",
            i + 1,
            verdict.status.glyph(),
            verdict.name,
            verdict.detail
        );
    }
    info!(
        "Total: {}  Passed: {}  Failed: {}  Errors: {}",
        summary.total, summary.passed, summary.failed, summary.errors
    );
    info!(
        "Pass rate: {:.1}%  ({} ms)",
        summary.pass_rate_percent, report.total_duration_ms
    );
}

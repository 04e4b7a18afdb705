//! Top-level run lifecycle
//!
//! The controller owns the driver's lifetime and the report's lifetime. The
//! driver is released on every exit path, whether the run reaches Done or
//! Failed. Scenario-level failures never reach this layer; only setup and
//! persistence failures are fatal here.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, warn};

use crate::compare::Verdict;
use crate::driver::{DocumentDriver, DEFAULT_WAIT_TIMEOUT_MS};
use crate::engine::ScenarioEngine;
use crate::error::VerifyResult;
use crate::playwright::{PlaywrightConfig, PlaywrightDriver};
use crate::report::{self, RunReport};
use crate::scenario::{Scenario, ScenarioSpec};
use crate::suite;
use crate::target::{resolve_target, TargetArtifact};

/// Run lifecycle states. `Failed` is terminal and reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Resolving,
    Driving,
    Aggregating,
    Reporting,
    Done,
    Failed,
}

/// Configuration for one verification run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory scanned for calculator versions
    pub search_dir: PathBuf,

    /// Artifact filename prefix
    pub prefix: String,

    /// Artifact filename suffix
    pub suffix: String,

    /// Directory of YAML scenario specs; `None` runs the built-in suite
    pub specs_dir: Option<PathBuf>,

    /// Where reports are written
    pub output_dir: PathBuf,

    /// Skip report persistence (console summary only)
    pub write_report: bool,

    /// Timeout for the results marker after each trigger
    pub results_timeout_ms: u64,

    /// Playwright driver settings
    pub driver: PlaywrightConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            search_dir: PathBuf::from("."),
            prefix: "ala-ghg-calculator".to_string(),
            suffix: ".html".to_string(),
            specs_dir: None,
            output_dir: PathBuf::from("test-results"),
            write_report: true,
            results_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            driver: PlaywrightConfig::default(),
        }
    }
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub report_path: Option<PathBuf>,
}

pub struct RunController {
    state: RunState,
}

impl Default for RunController {
    fn default() -> Self {
        Self::new()
    }
}

impl RunController {
    pub fn new() -> Self {
        Self {
            state: RunState::Init,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail<T>(&mut self, err: crate::VerifyError) -> VerifyResult<T> {
        self.transition(RunState::Failed);
        Err(err)
    }

    /// Resolve the target, launch the Playwright driver, and execute the
    /// configured scenarios.
    pub async fn run(&mut self, config: &RunConfig) -> VerifyResult<RunOutcome> {
        let scenarios = match &config.specs_dir {
            Some(dir) => {
                let specs = match ScenarioSpec::load_all(dir) {
                    Ok(specs) => specs,
                    Err(e) => return self.fail(e),
                };
                let mut scenarios = Vec::new();
                for spec in &specs {
                    match spec.expand() {
                        Ok(expanded) => scenarios.extend(expanded),
                        Err(e) => return self.fail(e),
                    }
                }
                scenarios
            }
            None => suite::builtin_suite(),
        };

        self.transition(RunState::Resolving);
        let target = match resolve_target(&config.search_dir, &config.prefix, &config.suffix) {
            Ok(target) => target,
            Err(e) => return self.fail(e),
        };

        let driver = match PlaywrightDriver::launch(config.driver.clone()).await {
            Ok(driver) => driver,
            Err(e) => return self.fail(e),
        };

        self.execute_with(driver, &target, &scenarios, config).await
    }

    /// Execute scenarios against an already-acquired driver. Generic over
    /// the driver so the whole lifecycle is testable against a fake.
    pub async fn execute_with<D: DocumentDriver>(
        &mut self,
        mut driver: D,
        target: &TargetArtifact,
        scenarios: &[Scenario],
        config: &RunConfig,
    ) -> VerifyResult<RunOutcome> {
        self.transition(RunState::Driving);
        let start = Instant::now();

        let drive_result = Self::drive(&mut driver, target, scenarios, config).await;

        // Release the driver before surfacing anything, on every path.
        if let Err(e) = driver.close().await {
            warn!("Driver release failed: {}", e);
        }

        let verdicts = match drive_result {
            Ok(verdicts) => verdicts,
            Err(e) => return self.fail(e),
        };

        self.transition(RunState::Aggregating);
        let report = RunReport::new(
            &target.name,
            start.elapsed().as_millis() as u64,
            verdicts,
        );

        self.transition(RunState::Reporting);
        // Console summary comes first; a persistence failure must not erase
        // the verdicts the operator already computed.
        report::render_console(&report);

        let report_path = if config.write_report {
            match report::write_report(&config.output_dir, &report) {
                Ok(path) => Some(path),
                Err(e) => return self.fail(e),
            }
        } else {
            None
        };

        self.transition(RunState::Done);
        Ok(RunOutcome {
            report,
            report_path,
        })
    }

    async fn drive<D: DocumentDriver>(
        driver: &mut D,
        target: &TargetArtifact,
        scenarios: &[Scenario],
        config: &RunConfig,
    ) -> VerifyResult<Vec<Verdict>> {
        // Initial load failure is fatal; nothing can run without a document.
        driver.navigate(&target.file_url()).await?;

        let engine = ScenarioEngine::with_results_timeout(config.results_timeout_ms);
        Ok(engine.run(driver, scenarios).await)
    }
}

//! Scenario execution against a live document
//!
//! Scenarios run strictly in declaration order against one driver instance.
//! A driver-level failure inside one scenario becomes an ERROR verdict and
//! execution moves on to the next scenario; one broken scenario must not
//! hide regressions the remaining scenarios would surface.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::compare::{compare, parse_numeric, Status, Verdict};
use crate::driver::{DocumentDriver, DEFAULT_WAIT_TIMEOUT_MS};
use crate::scenario::{AssignmentKind, Scenario};

pub struct ScenarioEngine {
    /// Timeout for the results marker after triggering.
    results_timeout_ms: u64,
}

impl Default for ScenarioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioEngine {
    pub fn new() -> Self {
        Self {
            results_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }

    pub fn with_results_timeout(results_timeout_ms: u64) -> Self {
        Self { results_timeout_ms }
    }

    /// Run every scenario in order, collecting all verdicts.
    pub async fn run<D: DocumentDriver>(
        &self,
        driver: &mut D,
        scenarios: &[Scenario],
    ) -> Vec<Verdict> {
        info!("Running {} scenario(s)...", scenarios.len());

        let mut verdicts = Vec::new();
        for scenario in scenarios {
            let scenario_verdicts = self.run_scenario(driver, scenario).await;
            for verdict in &scenario_verdicts {
                match verdict.status {
                    Status::Passed => info!("✓ {} ({} ms)", verdict.name, verdict.duration_ms),
                    Status::Failed => error!("✗ {} - {}", verdict.name, verdict.detail),
                    Status::Error => warn!("⚠ {} - {}", verdict.name, verdict.detail),
                }
            }
            verdicts.extend(scenario_verdicts);
        }
        verdicts
    }

    /// Run one scenario. Driver-level errors are contained here: they come
    /// back as verdicts, never as Err.
    pub async fn run_scenario<D: DocumentDriver>(
        &self,
        driver: &mut D,
        scenario: &Scenario,
    ) -> Vec<Verdict> {
        let start = Instant::now();
        let elapsed = || start.elapsed().as_millis() as u64;

        debug!("Running scenario: {}", scenario.name);

        if scenario.isolated {
            if let Err(e) = driver.reset().await {
                return vec![Verdict::error(
                    &scenario.name,
                    format!("reset failed: {}", e),
                    elapsed(),
                )];
            }
        }

        for assignment in &scenario.assignments {
            let result = match assignment.kind {
                AssignmentKind::Fill => {
                    driver.set_field(&assignment.field, &assignment.value).await
                }
                AssignmentKind::Select => {
                    driver
                        .select_option(&assignment.field, &assignment.value)
                        .await
                }
            };
            if let Err(e) = result {
                return vec![Verdict::error(
                    &scenario.name,
                    format!("could not assign {}: {}", assignment.field, e),
                    elapsed(),
                )];
            }
        }

        let mut verdicts = Vec::new();

        if scenario.verify_retention {
            let mut mismatches = Vec::new();
            for assignment in &scenario.assignments {
                match driver.read_value(&assignment.field).await {
                    Ok(value) if value == assignment.value => {}
                    Ok(value) => mismatches.push(format!(
                        "{}={:?} (assigned {:?})",
                        assignment.field, value, assignment.value
                    )),
                    Err(e) => {
                        return vec![Verdict::error(
                            &scenario.name,
                            format!("retention re-read of {} failed: {}", assignment.field, e),
                            elapsed(),
                        )]
                    }
                }
            }

            let retention_name = format!("{} data retention", scenario.name);
            if mismatches.is_empty() {
                verdicts.push(Verdict::synthetic(
                    retention_name,
                    true,
                    "All fields accept and retain data correctly",
                    elapsed(),
                ));
            } else {
                // An unretained input would make every downstream comparison
                // meaningless; skip the trigger but keep the run going.
                verdicts.push(Verdict::synthetic(
                    retention_name,
                    false,
                    format!("Fields not retaining data: {}", mismatches.join(", ")),
                    elapsed(),
                ));
                return verdicts;
            }
        }

        let trigger = match &scenario.trigger {
            Some(t) => t,
            None => return verdicts,
        };

        if let Err(e) = driver.trigger(trigger).await {
            verdicts.push(Verdict::error(
                &scenario.name,
                format!("trigger {} failed: {}", trigger, e),
                elapsed(),
            ));
            return verdicts;
        }

        if let Some(marker) = &scenario.results_marker {
            if let Err(e) = driver
                .wait_for_visible(marker, self.results_timeout_ms)
                .await
            {
                verdicts.push(Verdict::error(
                    &scenario.name,
                    format!("results did not appear: {}", e),
                    elapsed(),
                ));
                return verdicts;
            }
        }

        for expectation in &scenario.expectations {
            let label = expectation
                .label
                .clone()
                .unwrap_or_else(|| scenario.name.clone());

            let verdict = match driver.read_text(&expectation.output_field).await {
                Ok(text) => match parse_numeric(&expectation.output_field, &text) {
                    Ok(actual) => compare(
                        label,
                        expectation.expected,
                        actual,
                        expectation.tolerance,
                        expectation.factor,
                        elapsed(),
                    ),
                    Err(e) => Verdict::error(label, e.to_string(), elapsed()),
                },
                Err(e) => Verdict::error(label, e.to_string(), elapsed()),
            };
            verdicts.push(verdict);
        }

        verdicts
    }
}

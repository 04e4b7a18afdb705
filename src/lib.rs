//! GHG Calculator E2E Verification Harness
//!
//! This crate drives the emissions-calculator HTML document through a
//! sequence of input/assertion scenarios and verifies the computed
//! emissions against independently derived expected values:
//! - Resolves the latest calculator artifact in the project directory
//! - Controls a Chromium page via a Playwright helper process
//! - Executes declarative scenarios (built-in suite or YAML specs)
//! - Compares outputs within relative or absolute numeric tolerance
//! - Writes a structured JSON report per run
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Run Controller (controller)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  resolve_target() ─────────► TargetArtifact                 │
//! │  PlaywrightDriver::launch() ► dyn DocumentDriver            │
//! │  ScenarioEngine::run() ────► Vec<Verdict>                   │
//! │    ├── reset / set_field / select_option                    │
//! │    ├── retention re-read (read_value)                       │
//! │    ├── trigger + wait_for_visible(results marker)           │
//! │    └── read_text ──► parse ──► compare ──► Verdict          │
//! │  summarize() + write_report() ► test-report-<ts>.json       │
//! │  driver.close()  (all exit paths)                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod compare;
pub mod controller;
pub mod driver;
pub mod engine;
pub mod error;
pub mod playwright;
pub mod report;
pub mod scenario;
pub mod suite;
pub mod target;

#[cfg(test)]
pub(crate) mod fake;

pub use compare::{Status, Verdict};
pub use controller::{RunConfig, RunController};
pub use driver::DocumentDriver;
pub use error::{VerifyError, VerifyResult};
pub use scenario::{Scenario, Tolerance};
pub use target::TargetArtifact;

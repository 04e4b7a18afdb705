//! Harness entry point
//!
//! Exit codes: 0 when the run completes, regardless of individual verdict
//! outcomes (failures are reported, not treated as process failure); 2 on
//! unrecoverable setup failure or a fatal orchestration error.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ghgcalc_e2e::controller::{RunConfig, RunController, RunOutcome};
use ghgcalc_e2e::playwright::PlaywrightConfig;
use ghgcalc_e2e::VerifyResult;

#[derive(Parser, Debug)]
#[command(name = "ghgcalc-e2e")]
#[command(about = "E2E verification harness for the GHG emissions calculator")]
struct Args {
    /// Directory scanned for calculator versions
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Calculator filename prefix
    #[arg(long, default_value = "ala-ghg-calculator")]
    prefix: String,

    /// Calculator filename suffix
    #[arg(long, default_value = ".html")]
    suffix: String,

    /// Directory of YAML scenario specs (default: built-in suite)
    #[arg(short, long)]
    specs: Option<PathBuf>,

    /// Output directory for reports
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,

    /// Selector that marks the document as loaded
    #[arg(long, default_value = "#facilityName")]
    ready_marker: String,

    /// Wait timeout for ready/results markers, in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Run with a visible browser window
    #[arg(long)]
    headed: bool,

    /// Skip writing the JSON report
    #[arg(long)]
    no_report: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("info".parse().expect("valid directive")),
        )
        .init();

    let args = Args::parse();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    match rt.block_on(run(args)) {
        Ok(_outcome) => {
            // Verdict failures are in the report; the harness itself worked.
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn run(args: Args) -> VerifyResult<RunOutcome> {
    let config = RunConfig {
        search_dir: args.dir,
        prefix: args.prefix,
        suffix: args.suffix,
        specs_dir: args.specs,
        output_dir: args.output,
        write_report: !args.no_report,
        results_timeout_ms: args.timeout_ms,
        driver: PlaywrightConfig {
            ready_marker: args.ready_marker,
            ready_timeout_ms: args.timeout_ms,
            headed: args.headed,
            ..PlaywrightConfig::default()
        },
    };

    let mut controller = RunController::new();
    controller.run(&config).await
}

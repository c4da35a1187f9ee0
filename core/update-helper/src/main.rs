//! software-updates-helper: push helper for system image updates.
//!
//! Invoked by the push dispatcher with an input and an output file for every
//! push message addressed to system settings. The dispatcher allows a few
//! seconds per invocation; longer work happens in a detached worker.
//!
//! ## Exit codes
//!
//! - `0`: handled, including "nothing to show"
//! - `1`: malformed payload, I/O failure, detach failure, worker failure
//! - `2`: wrong arguments (usage printed by clap)

mod background;
mod bus;
mod dispatch;
mod logging;
mod supervisor;

use clap::Parser;
use dispatch::Disposition;
use software_updates_core::{load_config, HelperConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "software-updates-helper")]
#[command(about = "Turns system update pushes into user notifications")]
#[command(version)]
struct Cli {
    /// File holding the push message (JSON)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// File the notification decision is written to (JSON)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let (config, config_error) = match load_config(None) {
        Ok(config) => (config, None),
        Err(err) => (HelperConfig::default(), Some(err)),
    };

    logging::init(&config);
    logging::install_panic_hook();
    let helper_span = tracing::info_span!("helper", pid = std::process::id()).entered();

    if let Some(err) = config_error {
        tracing::warn!(error = %err, "Failed to load helper config; using defaults");
    }
    tracing::debug!(
        input = %cli.input.display(),
        output = %cli.output.display(),
        "Starting"
    );

    let code = match dispatch::run(&cli.input, &cli.output, &config) {
        Ok(Disposition::Finished) => {
            tracing::debug!("Done");
            0
        }
        Ok(Disposition::Worker) => {
            // The forked worker still holds the parent's span.
            drop(helper_span);
            run_worker(config)
        }
        Err(err) => {
            tracing::error!(error = %err, "Push helper failed");
            1
        }
    };

    std::process::exit(code);
}

fn run_worker(config: HelperConfig) -> i32 {
    let _span = tracing::info_span!("worker", pid = std::process::id()).entered();
    supervisor::isolate();

    match background::run(config) {
        Ok(report) => {
            tracing::info!(
                outcome = ?report.outcome,
                events = report.events_seen,
                published = report.published,
                "Worker finished"
            );
            0
        }
        Err(err) => {
            tracing::error!(error = %err, "Worker failed");
            1
        }
    }
}

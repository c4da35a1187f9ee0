//! Entry point of the detached worker process.

use crate::bus::{PostalClient, SystemImageClient};
use software_updates_core::{HelperConfig, Result, Worker, WorkerReport};

/// Connects to both services and runs one update check to completion.
pub fn run(config: HelperConfig) -> Result<WorkerReport> {
    let updates = SystemImageClient::connect(&config.system_image)?;
    let notifier = PostalClient::connect(&config.postal)?;

    Worker::new(updates, notifier, config).run()
}

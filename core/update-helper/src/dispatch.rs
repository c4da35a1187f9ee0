//! Push message handling for one dispatcher invocation.
//!
//! ```text
//! "system-image-update" → write {"notification": {...}}
//! "testing"             → write {"testing": true}
//! broadcast             → detach worker, write {}
//! malformed JSON        → error, output untouched
//! ```

use crate::supervisor::{self, Detached};
use software_updates_core::{
    write_output, BroadcastInfo, Cause, HelperConfig, Notification, Output, Payload, Result,
};
use std::path::Path;

/// Where control goes after the payload is handled.
#[derive(Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Output written; the process can exit.
    Finished,
    /// This process is the detached worker and must run the update check.
    Worker,
}

pub fn run(input: &Path, output: &Path, config: &HelperConfig) -> Result<Disposition> {
    let payload = Payload::read(input)?;
    tracing::info!(kind = payload.kind(), "Push payload classified");

    match payload {
        Payload::SystemImageUpdate => {
            let notification = Notification::now(Cause::UpdateReady, config);
            write_output(output, &Output::Notify(notification))?;
            tracing::debug!("Requested regular notification");
            Ok(Disposition::Finished)
        }
        Payload::Testing => {
            write_output(output, &Output::Testing)?;
            Ok(Disposition::Finished)
        }
        Payload::Broadcast(value) => {
            match BroadcastInfo::parse(&value) {
                Some(info) => tracing::info!(
                    channel = %info.channel,
                    device = %info.device,
                    build = info.build_number,
                    alias = %info.channel_alias,
                    "Image broadcast"
                ),
                None => tracing::debug!("Broadcast payload not in image format; checking anyway"),
            }
            detach_worker(output)
        }
    }
}

fn detach_worker(output: &Path) -> Result<Disposition> {
    match supervisor::detach() {
        Ok(Detached::Parent { child }) => {
            tracing::info!(child, "Worker detached");
            write_output(output, &Output::Empty)?;
            Ok(Disposition::Finished)
        }
        Ok(Detached::Child) => Ok(Disposition::Worker),
        Err(err) => {
            if let Err(write_err) = write_output(output, &Output::Empty) {
                tracing::warn!(error = %write_err, "Failed to write empty output");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_err as fs;
    use software_updates_core::HelperError;

    fn invoke(input: &str) -> (Result<Disposition>, Option<serde_json::Value>) {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("in.json");
        let output_path = dir.path().join("out.json");
        fs::write(&input_path, input).unwrap();

        let result = run(&input_path, &output_path, &HelperConfig::default());
        let output = fs::read(&output_path)
            .ok()
            .map(|bytes| serde_json::from_slice(&bytes).expect("output is JSON"));
        (result, output)
    }

    #[test]
    fn testing_sentinel_writes_marker() {
        let (result, output) = invoke("\"testing\"");
        assert_eq!(result.unwrap(), Disposition::Finished);
        assert_eq!(output, Some(serde_json::json!({ "testing": true })));
    }

    #[test]
    fn direct_check_writes_update_card() {
        let (result, output) = invoke("\"system-image-update\"");
        assert_eq!(result.unwrap(), Disposition::Finished);

        let output = output.expect("output written");
        let notification = &output["notification"];
        assert_eq!(notification["tag"], "system-image-update");
        assert_eq!(notification["card"]["persist"], true);
        assert_eq!(notification["vibrate"]["pattern"], serde_json::json!([50, 150]));
        assert_eq!(notification["vibrate"]["repeat"], 3);
    }

    #[test]
    fn malformed_payload_leaves_output_unwritten() {
        let (result, output) = invoke("{not json");
        assert!(matches!(
            result,
            Err(HelperError::MalformedPayload { .. })
        ));
        assert_eq!(output, None);
    }
}

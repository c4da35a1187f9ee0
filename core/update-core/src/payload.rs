//! Push payload classification.
//!
//! The dispatcher hands the helper one JSON document per push. Three shapes
//! matter:
//!
//! ```text
//! "system-image-update"  → DirectCheck  (compose the card now)
//! "testing"              → Testing      (harness sentinel)
//! anything else          → Broadcast    (check in the background)
//! ```

use crate::error::{HelperError, Result};
use crate::notification::SYSTEM_IMAGE_UPDATE_TAG;
use serde_json::Value;
use std::path::Path;

pub const TESTING_SENTINEL: &str = "testing";

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    SystemImageUpdate,
    Testing,
    Broadcast(Value),
}

impl Payload {
    /// Reads and classifies the dispatcher's input file.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs_err::read(path)
            .map_err(|err| HelperError::io("Failed to read push payload", err))?;
        serde_json::from_slice::<Value>(&bytes)
            .map(Self::classify)
            .map_err(|source| HelperError::MalformedPayload {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn classify(value: Value) -> Self {
        match value.as_str() {
            Some(SYSTEM_IMAGE_UPDATE_TAG) => Payload::SystemImageUpdate,
            Some(TESTING_SENTINEL) => Payload::Testing,
            _ => Payload::Broadcast(value),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Payload::SystemImageUpdate => "system-image-update",
            Payload::Testing => "testing",
            Payload::Broadcast(_) => "broadcast",
        }
    }
}

/// Decoded form of an image broadcast, e.g.
/// `{"ubuntu-touch/utopic-proposed/hammerhead": [265, ""]}`.
///
/// Only used for logging; an undecodable broadcast still triggers a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastInfo {
    pub channel: String,
    pub device: String,
    pub build_number: u64,
    pub channel_alias: String,
}

impl BroadcastInfo {
    pub fn parse(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.len() != 1 {
            return None;
        }
        let (key, details) = object.iter().next()?;
        let (channel, device) = key.rsplit_once('/')?;
        if channel.is_empty() || device.is_empty() {
            return None;
        }

        let details = details.as_array()?;
        let build_number = details.first()?.as_u64()?;
        let channel_alias = details
            .get(1)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Some(Self {
            channel: channel.to_string(),
            device: device.to_string(),
            build_number,
            channel_alias,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn payload_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write payload");
        file
    }

    #[test]
    fn direct_check_string_is_classified() {
        assert_eq!(
            Payload::classify(json!("system-image-update")),
            Payload::SystemImageUpdate
        );
    }

    #[test]
    fn testing_sentinel_is_classified() {
        assert_eq!(Payload::classify(json!("testing")), Payload::Testing);
    }

    #[test]
    fn other_strings_are_broadcasts() {
        assert_eq!(
            Payload::classify(json!("Testing")),
            Payload::Broadcast(json!("Testing"))
        );
    }

    #[test]
    fn objects_and_nulls_are_broadcasts() {
        let value = json!({"ubuntu-touch/utopic-proposed/hammerhead": [265, ""]});
        assert_eq!(
            Payload::classify(value.clone()),
            Payload::Broadcast(value)
        );
        assert_eq!(
            Payload::classify(Value::Null),
            Payload::Broadcast(Value::Null)
        );
    }

    #[test]
    fn read_classifies_file_contents() {
        let file = payload_file("\"testing\"\n");
        assert_eq!(Payload::read(file.path()).unwrap(), Payload::Testing);
    }

    #[test]
    fn read_rejects_malformed_json() {
        let file = payload_file("{\"ubuntu-touch/");
        let err = Payload::read(file.path()).expect_err("malformed");
        assert!(matches!(err, HelperError::MalformedPayload { .. }));
    }

    #[test]
    fn read_reports_missing_file_as_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = Payload::read(&dir.path().join("absent.json")).expect_err("missing");
        assert!(matches!(err, HelperError::Io { .. }));
    }

    #[test]
    fn broadcast_info_parses_channel_and_build() {
        let info = BroadcastInfo::parse(&json!({
            "ubuntu-touch/utopic-proposed/hammerhead": [265, ""]
        }))
        .expect("broadcast info");
        assert_eq!(info.channel, "ubuntu-touch/utopic-proposed");
        assert_eq!(info.device, "hammerhead");
        assert_eq!(info.build_number, 265);
        assert_eq!(info.channel_alias, "");
    }

    #[test]
    fn broadcast_info_ignores_unexpected_shapes() {
        assert_eq!(BroadcastInfo::parse(&json!([1, 2])), None);
        assert_eq!(BroadcastInfo::parse(&json!({"nodevice": [1, ""]})), None);
        assert_eq!(BroadcastInfo::parse(&json!({"a/b": ["x", ""]})), None);
        assert_eq!(
            BroadcastInfo::parse(&json!({"a/b": [1, ""], "c/d": [2, ""]})),
            None
        );
    }
}

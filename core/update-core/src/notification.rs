//! Notification composition and the helper's output document.
//!
//! The dispatcher reads the output file after the helper exits. Its shape is
//! one of:
//!
//! ```text
//! {}                          nothing to show now
//! {"testing": true}           harness sentinel
//! {"notification": {...}}     show the update card
//! ```

use crate::config::HelperConfig;
use crate::error::{HelperError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

/// Dedup tag shared by every system image notification. Publishing relies on
/// it staying stable across releases.
pub const SYSTEM_IMAGE_UPDATE_TAG: &str = "system-image-update";

pub const UPDATE_SUMMARY: &str = "There's an updated system image.";
pub const UPDATE_BODY: &str = "Tap to open the system updater.";
pub const VIBRATE_PATTERN_MS: [u32; 2] = [50, 150];
pub const VIBRATE_REPEAT: u32 = 3;

/// Why a notification is being composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    UpdateReady,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub tag: String,
    #[serde(rename = "emblem-counter")]
    pub emblem_counter: EmblemCounter,
    pub vibrate: Vibration,
    pub card: Card,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmblemCounter {
    pub count: u32,
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vibration {
    pub pattern: Vec<u32>,
    pub repeat: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub summary: String,
    pub body: String,
    pub actions: Vec<String>,
    pub icon: String,
    pub timestamp: i64,
    pub persist: bool,
    #[serde(default)]
    pub popup: bool,
}

/// Builds the notification for `cause`, stamped with `timestamp` (Unix seconds).
pub fn compose(cause: Cause, config: &HelperConfig, timestamp: i64) -> Notification {
    match cause {
        Cause::UpdateReady => Notification {
            tag: SYSTEM_IMAGE_UPDATE_TAG.to_string(),
            emblem_counter: EmblemCounter {
                count: 1,
                visible: true,
            },
            vibrate: Vibration {
                pattern: VIBRATE_PATTERN_MS.to_vec(),
                repeat: VIBRATE_REPEAT,
            },
            card: Card {
                summary: UPDATE_SUMMARY.to_string(),
                body: UPDATE_BODY.to_string(),
                actions: vec![config.updater_action.clone()],
                icon: config.icon.clone(),
                timestamp,
                persist: true,
                popup: false,
            },
        },
    }
}

/// Push message that asks the dispatcher to show the notification for
/// `cause`. The dispatcher routes it back through the helper's direct-check
/// path, which composes the card.
pub fn push_message(cause: Cause) -> String {
    match cause {
        Cause::UpdateReady => Value::String(SYSTEM_IMAGE_UPDATE_TAG.to_string()).to_string(),
    }
}

impl Notification {
    pub fn now(cause: Cause, config: &HelperConfig) -> Self {
        compose(cause, config, Utc::now().timestamp())
    }
}

/// What the helper tells the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Empty,
    Testing,
    Notify(Notification),
}

impl Output {
    pub fn to_json(&self) -> Result<Value> {
        match self {
            Output::Empty => Ok(json!({})),
            Output::Testing => Ok(json!({ "testing": true })),
            Output::Notify(notification) => {
                let value = serde_json::to_value(notification).map_err(|source| {
                    HelperError::Json {
                        context: "Failed to serialize notification".to_string(),
                        source,
                    }
                })?;
                Ok(json!({ "notification": value }))
            }
        }
    }
}

/// Writes the dispatcher's output file. Called once per invocation.
pub fn write_output(path: &Path, output: &Output) -> Result<()> {
    let value = output.to_json()?;
    let content = serde_json::to_vec(&value).map_err(|source| HelperError::Json {
        context: "Failed to serialize output".to_string(),
        source,
    })?;
    fs_err::write(path, content).map_err(|err| HelperError::io("Failed to write output", err))
}

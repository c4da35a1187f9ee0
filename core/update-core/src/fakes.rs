//! In-memory collaborators for tests.
//!
//! `ScriptedUpdateService` replays a fixed list of reports after the check is
//! requested. `RecordingNotifier` records calls and tracks which tags have a
//! visible notification, resolving posted messages the way the dispatcher
//! would route them back through the helper.

use crate::check::UpdateEvent;
use crate::error::{HelperError, Result};
use crate::payload::Payload;
use crate::services::{NotificationService, UpdateService};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Default)]
pub struct ScriptedUpdateService {
    events: VecDeque<UpdateEvent>,
    checks: usize,
    fail_check: bool,
    delivered: usize,
}

impl ScriptedUpdateService {
    pub fn new(events: impl IntoIterator<Item = UpdateEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Self::default()
        }
    }

    /// A service whose check request is rejected.
    pub fn rejecting() -> Self {
        Self {
            fail_check: true,
            ..Self::default()
        }
    }

    pub fn checks(&self) -> usize {
        self.checks
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl UpdateService for ScriptedUpdateService {
    fn check_for_update(&mut self) -> Result<()> {
        if self.fail_check {
            return Err(HelperError::unavailable(
                "com.canonical.SystemImage",
                "CheckForUpdate rejected",
            ));
        }
        self.checks += 1;
        Ok(())
    }

    fn next_event(&mut self) -> Result<Option<UpdateEvent>> {
        if self.checks == 0 {
            return Ok(None);
        }
        let event = self.events.pop_front();
        if event.is_some() {
            self.delivered += 1;
        }
        Ok(event)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Clear { app_id: String, tag: String },
    Post { app_id: String, message: String },
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: RefCell<Vec<NotifierCall>>,
    visible: RefCell<BTreeMap<String, usize>>,
    fail_posts: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_posts() -> Self {
        Self {
            fail_posts: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.borrow().clone()
    }

    pub fn post_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, NotifierCall::Post { .. }))
            .count()
    }

    pub fn visible_count(&self, tag: &str) -> usize {
        self.visible.borrow().get(tag).copied().unwrap_or(0)
    }

    /// Tag the posted message ends up displayed under.
    fn tag_for(message: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(message).ok()?;
        if let Some(tag) = value
            .get("notification")
            .and_then(|notification| notification.get("tag"))
            .and_then(|tag| tag.as_str())
        {
            return Some(tag.to_string());
        }
        match Payload::classify(value) {
            Payload::SystemImageUpdate => {
                Some(crate::notification::SYSTEM_IMAGE_UPDATE_TAG.to_string())
            }
            _ => None,
        }
    }
}

impl NotificationService for RecordingNotifier {
    fn clear_persistent(&self, app_id: &str, tag: &str) -> Result<()> {
        self.calls.borrow_mut().push(NotifierCall::Clear {
            app_id: app_id.to_string(),
            tag: tag.to_string(),
        });
        self.visible.borrow_mut().remove(tag);
        Ok(())
    }

    fn post(&self, app_id: &str, message: &str) -> Result<()> {
        self.calls.borrow_mut().push(NotifierCall::Post {
            app_id: app_id.to_string(),
            message: message.to_string(),
        });
        if self.fail_posts {
            return Err(HelperError::unavailable("com.ubuntu.Postal", "Post rejected"));
        }
        if let Some(tag) = Self::tag_for(message) {
            *self.visible.borrow_mut().entry(tag).or_insert(0) += 1;
        }
        Ok(())
    }
}

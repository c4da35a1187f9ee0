//! Background update-check worker.
//!
//! Runs in the detached child. Requests a check, blocks on the update
//! service's reports until the state machine commits, and publishes at most
//! one notification.
//!
//! ## Lifecycle
//!
//! 1. `begin` the check and fire `CheckForUpdate`
//! 2. Block on `next_event` (the only suspension point)
//! 3. On `ShouldNotify`: clear + post under the stable tag
//! 4. Return; the caller exits the process
//!
//! There is no deadline on step 2. If the update service never answers the
//! worker stays alive until it is killed.

use crate::check::{CheckState, Outcome, UpdateCheck};
use crate::config::HelperConfig;
use crate::error::{HelperError, Result};
use crate::notification::{push_message, Cause, SYSTEM_IMAGE_UPDATE_TAG};
use crate::publisher::Publisher;
use crate::services::{NotificationService, UpdateService};

/// What a finished worker did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub outcome: Outcome,
    pub events_seen: usize,
    pub published: bool,
}

pub struct Worker<U, N> {
    updates: U,
    notifier: N,
    config: HelperConfig,
    check: UpdateCheck,
}

impl<U: UpdateService, N: NotificationService> Worker<U, N> {
    pub fn new(updates: U, notifier: N, config: HelperConfig) -> Self {
        Self {
            updates,
            notifier,
            config,
            check: UpdateCheck::new(),
        }
    }

    pub fn state(&self) -> CheckState {
        self.check.state()
    }

    pub fn run(mut self) -> Result<WorkerReport> {
        self.check.begin();
        tracing::info!("Checking for update");
        self.updates.check_for_update()?;

        let mut events_seen = 0usize;
        let outcome = loop {
            let event = match self.updates.next_event()? {
                Some(event) => event,
                None => {
                    return Err(HelperError::unavailable(
                        self.config.system_image.bus_name.clone(),
                        "report stream ended before a terminal report",
                    ))
                }
            };
            events_seen += 1;
            tracing::info!(event = event.name(), "Update service report");

            let outcome = self.check.apply(&event);
            if outcome.is_terminal() {
                break outcome;
            }
        };

        let published = match outcome {
            Outcome::ShouldNotify => self.notify(),
            _ => {
                tracing::info!(
                    available = self.check.available(),
                    "Not notifying"
                );
                false
            }
        };

        Ok(WorkerReport {
            outcome,
            events_seen,
            published,
        })
    }

    fn notify(&self) -> bool {
        tracing::info!("Notifying");
        let message = push_message(Cause::UpdateReady);
        match Publisher::new(&self.notifier, &self.config.app_id)
            .publish(SYSTEM_IMAGE_UPDATE_TAG, &message)
        {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Notification not published");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::UpdateEvent;
    use crate::fakes::{NotifierCall, RecordingNotifier, ScriptedUpdateService};

    fn run_with(events: Vec<UpdateEvent>, notifier: &RecordingNotifier) -> Result<WorkerReport> {
        let updates = ScriptedUpdateService::new(events);
        Worker::new(updates, notifier, HelperConfig::default()).run()
    }

    fn failed() -> UpdateEvent {
        UpdateEvent::Failed {
            consecutive_failures: 1,
            last_reason: "disk full".to_string(),
        }
    }

    #[test]
    fn available_without_download_publishes_once() {
        let notifier = RecordingNotifier::new();
        let report = run_with(vec![UpdateEvent::availability(true, false)], &notifier).unwrap();

        assert_eq!(report.outcome, Outcome::ShouldNotify);
        assert!(report.published);
        assert_eq!(notifier.post_count(), 1);
        assert_eq!(notifier.visible_count(SYSTEM_IMAGE_UPDATE_TAG), 1);
        assert_eq!(
            notifier.calls()[0],
            NotifierCall::Clear {
                app_id: "_ubuntu-system-settings".to_string(),
                tag: SYSTEM_IMAGE_UPDATE_TAG.to_string(),
            }
        );
    }

    #[test]
    fn unavailable_update_publishes_nothing() {
        for downloading in [false, true] {
            let notifier = RecordingNotifier::new();
            let report =
                run_with(vec![UpdateEvent::availability(false, downloading)], &notifier).unwrap();
            assert_eq!(report.outcome, Outcome::Suppress);
            assert!(!report.published);
            assert!(notifier.calls().is_empty());
        }
    }

    #[test]
    fn downloading_waits_for_completion_then_publishes() {
        let notifier = RecordingNotifier::new();
        let report = run_with(
            vec![UpdateEvent::availability(true, true), UpdateEvent::Downloaded],
            &notifier,
        )
        .unwrap();

        assert_eq!(report.events_seen, 2);
        assert_eq!(report.outcome, Outcome::ShouldNotify);
        assert_eq!(notifier.post_count(), 1);
    }

    #[test]
    fn downloading_then_failure_stays_silent() {
        let notifier = RecordingNotifier::new();
        let report = run_with(
            vec![UpdateEvent::availability(true, true), failed()],
            &notifier,
        )
        .unwrap();

        assert_eq!(report.outcome, Outcome::Suppress);
        assert!(notifier.calls().is_empty());
    }

    #[test]
    fn reports_after_terminal_are_not_consumed() {
        let notifier = RecordingNotifier::new();
        let mut updates = ScriptedUpdateService::new(vec![
            UpdateEvent::Downloaded,
            failed(),
            UpdateEvent::availability(false, false),
        ]);
        let report = Worker::new(&mut updates, &notifier, HelperConfig::default())
            .run()
            .unwrap();

        assert_eq!(report.events_seen, 1);
        assert_eq!(updates.remaining(), 2);
        assert_eq!(updates.checks(), 1);
        assert_eq!(notifier.post_count(), 1);
    }

    #[test]
    fn stream_ending_early_is_service_unavailable() {
        let notifier = RecordingNotifier::new();
        let err = run_with(vec![UpdateEvent::availability(true, true)], &notifier)
            .expect_err("stream ended");

        assert!(matches!(err, HelperError::RemoteServiceUnavailable { .. }));
        assert!(notifier.calls().is_empty());
    }

    #[test]
    fn rejected_check_is_fatal() {
        let notifier = RecordingNotifier::new();
        let err = Worker::new(
            ScriptedUpdateService::rejecting(),
            &notifier,
            HelperConfig::default(),
        )
        .run()
        .expect_err("check rejected");

        assert!(matches!(err, HelperError::RemoteServiceUnavailable { .. }));
    }

    #[test]
    fn publish_failure_does_not_fail_the_worker() {
        let notifier = RecordingNotifier::failing_posts();
        let report = run_with(vec![UpdateEvent::Downloaded], &notifier).unwrap();

        assert_eq!(report.outcome, Outcome::ShouldNotify);
        assert!(!report.published);
    }

    #[test]
    fn worker_starts_idle() {
        let notifier = RecordingNotifier::new();
        let worker = Worker::new(
            ScriptedUpdateService::default(),
            &notifier,
            HelperConfig::default(),
        );
        assert_eq!(worker.state(), CheckState::Idle);
    }
}

//! Clear-then-post publishing.
//!
//! At most one live notification exists per tag: every publish clears the
//! persisted notification under the tag before posting the new message.

use crate::error::{HelperError, Result};
use crate::services::NotificationService;

pub struct Publisher<'a, N: NotificationService + ?Sized> {
    service: &'a N,
    app_id: &'a str,
}

impl<'a, N: NotificationService + ?Sized> Publisher<'a, N> {
    pub fn new(service: &'a N, app_id: &'a str) -> Self {
        Self { service, app_id }
    }

    pub fn publish(&self, tag: &str, message: &str) -> Result<()> {
        self.service
            .clear_persistent(self.app_id, tag)
            .map_err(|err| publish_failure(tag, "clear", err))?;
        self.service
            .post(self.app_id, message)
            .map_err(|err| publish_failure(tag, "post", err))?;

        tracing::info!(app_id = self.app_id, tag, "Notification published");
        Ok(())
    }
}

fn publish_failure(tag: &str, step: &str, err: HelperError) -> HelperError {
    HelperError::PublishFailure {
        tag: tag.to_string(),
        details: format!("{} failed: {}", step, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{NotifierCall, RecordingNotifier};
    use crate::notification::SYSTEM_IMAGE_UPDATE_TAG;

    const APP_ID: &str = "_ubuntu-system-settings";
    const MESSAGE: &str = "\"system-image-update\"";

    #[test]
    fn publish_clears_before_posting() {
        let notifier = RecordingNotifier::new();
        Publisher::new(&notifier, APP_ID)
            .publish(SYSTEM_IMAGE_UPDATE_TAG, MESSAGE)
            .unwrap();

        assert_eq!(
            notifier.calls(),
            vec![
                NotifierCall::Clear {
                    app_id: APP_ID.to_string(),
                    tag: SYSTEM_IMAGE_UPDATE_TAG.to_string(),
                },
                NotifierCall::Post {
                    app_id: APP_ID.to_string(),
                    message: MESSAGE.to_string(),
                },
            ]
        );
    }

    #[test]
    fn publishing_twice_leaves_one_visible_notification() {
        let notifier = RecordingNotifier::new();
        let publisher = Publisher::new(&notifier, APP_ID);

        publisher.publish(SYSTEM_IMAGE_UPDATE_TAG, MESSAGE).unwrap();
        publisher.publish(SYSTEM_IMAGE_UPDATE_TAG, MESSAGE).unwrap();

        assert_eq!(notifier.visible_count(SYSTEM_IMAGE_UPDATE_TAG), 1);
        assert_eq!(notifier.post_count(), 2);
    }

    #[test]
    fn clearing_an_empty_tag_is_not_an_error() {
        let notifier = RecordingNotifier::new();
        assert_eq!(notifier.visible_count(SYSTEM_IMAGE_UPDATE_TAG), 0);
        Publisher::new(&notifier, APP_ID)
            .publish(SYSTEM_IMAGE_UPDATE_TAG, MESSAGE)
            .unwrap();
        assert_eq!(notifier.visible_count(SYSTEM_IMAGE_UPDATE_TAG), 1);
    }

    #[test]
    fn failed_post_is_reported_as_publish_failure() {
        let notifier = RecordingNotifier::failing_posts();
        let err = Publisher::new(&notifier, APP_ID)
            .publish(SYSTEM_IMAGE_UPDATE_TAG, MESSAGE)
            .expect_err("post should fail");

        assert!(matches!(err, HelperError::PublishFailure { ref tag, .. } if tag == SYSTEM_IMAGE_UPDATE_TAG));
    }
}

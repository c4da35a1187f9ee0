//! Collaborator seams.
//!
//! The worker talks to two platform services: the system update service and
//! the notification-forwarding service. The helper binary implements these
//! over D-Bus; tests use the in-memory fakes.

use crate::check::UpdateEvent;
use crate::error::Result;

/// The system update service, as seen by one check cycle.
///
/// Implementations must be subscribed to the service's reports before
/// `check_for_update` returns, so a reply racing the request is not lost.
pub trait UpdateService {
    /// Fires a check request. The answer arrives through `next_event`.
    fn check_for_update(&mut self) -> Result<()>;

    /// Blocks until the next report arrives. `None` means the report stream
    /// ended and no further events will come.
    fn next_event(&mut self) -> Result<Option<UpdateEvent>>;
}

/// The notification-forwarding service.
pub trait NotificationService {
    /// Removes persisted notifications for `app_id` tagged `tag`. Clearing a
    /// tag with nothing under it succeeds.
    fn clear_persistent(&self, app_id: &str, tag: &str) -> Result<()>;

    /// Posts a push message for `app_id`.
    fn post(&self, app_id: &str, message: &str) -> Result<()>;
}

impl<T: UpdateService + ?Sized> UpdateService for &mut T {
    fn check_for_update(&mut self) -> Result<()> {
        (**self).check_for_update()
    }

    fn next_event(&mut self) -> Result<Option<UpdateEvent>> {
        (**self).next_event()
    }
}

impl<T: NotificationService + ?Sized> NotificationService for &T {
    fn clear_persistent(&self, app_id: &str, tag: &str) -> Result<()> {
        (**self).clear_persistent(app_id, tag)
    }

    fn post(&self, app_id: &str, message: &str) -> Result<()> {
        (**self).post(app_id, message)
    }
}

//! D-Bus clients for the system update and notification services.
//!
//! Each client opens its own connection, so nothing is shared with other
//! processes or outlives the worker.
//!
//! ## System image service (system bus)
//!
//! ```text
//! CheckForUpdate()                         method
//! UpdateAvailableStatus(b b s i s s)       signal
//! UpdateDownloaded()                       signal
//! UpdateFailed(i s)                        signal
//! ```
//!
//! ## Postal (session bus)
//!
//! ```text
//! ClearPersistent(s app_id, s tag)
//! Post(s app_id, s message)
//! ```

use software_updates_core::{
    BusEndpoint, HelperError, NotificationService, Result, UpdateEvent, UpdateService,
};
use zbus::blocking::{Connection, MessageIterator};
use zbus::message::Type as MessageType;
use zbus::zvariant::{Structure, Value};
use zbus::{MatchRule, Message};

/// Reports buffered before the worker reads them.
const MAX_QUEUED_REPORTS: usize = 64;

const UPDATE_AVAILABLE_STATUS: &str = "UpdateAvailableStatus";
const UPDATE_DOWNLOADED: &str = "UpdateDownloaded";
const UPDATE_FAILED: &str = "UpdateFailed";

pub struct SystemImageClient {
    connection: Connection,
    reports: MessageIterator,
    endpoint: BusEndpoint,
}

impl SystemImageClient {
    /// Connects to the system bus and subscribes to the service's reports.
    pub fn connect(endpoint: &BusEndpoint) -> Result<Self> {
        let connection =
            Connection::system().map_err(|err| unavailable(endpoint, "system bus", err))?;
        let rule = report_rule(endpoint).map_err(|err| unavailable(endpoint, "match rule", err))?;
        let reports = MessageIterator::for_match_rule(rule, &connection, Some(MAX_QUEUED_REPORTS))
            .map_err(|err| unavailable(endpoint, "subscribe", err))?;

        tracing::debug!(
            bus_name = %endpoint.bus_name,
            path = %endpoint.object_path,
            "Subscribed to update reports"
        );

        Ok(Self {
            connection,
            reports,
            endpoint: endpoint.clone(),
        })
    }
}

fn report_rule(endpoint: &BusEndpoint) -> zbus::Result<MatchRule<'_>> {
    // Signals carry the sender's unique name, so the rule matches on
    // interface and path rather than the well-known name.
    Ok(MatchRule::builder()
        .msg_type(MessageType::Signal)
        .interface(endpoint.interface.as_str())?
        .path(endpoint.object_path.as_str())?
        .build())
}

impl UpdateService for SystemImageClient {
    fn check_for_update(&mut self) -> Result<()> {
        self.connection
            .call_method(
                Some(self.endpoint.bus_name.as_str()),
                self.endpoint.object_path.as_str(),
                Some(self.endpoint.interface.as_str()),
                "CheckForUpdate",
                &(),
            )
            .map(|_| ())
            .map_err(|err| unavailable(&self.endpoint, "CheckForUpdate", err))
    }

    fn next_event(&mut self) -> Result<Option<UpdateEvent>> {
        loop {
            let message = match self.reports.next() {
                Some(Ok(message)) => message,
                Some(Err(err)) => return Err(unavailable(&self.endpoint, "report stream", err)),
                None => return Ok(None),
            };

            match decode_report(&message) {
                Ok(Some(event)) => return Ok(Some(event)),
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "Skipping undecodable update report");
                }
            }
        }
    }
}

/// Maps one signal to an update event. Members the worker does not care about
/// (progress, pauses, settings changes) yield `None`.
///
/// Only the fields that decide the outcome are required: the two leading
/// booleans of `UpdateAvailableStatus`. `UpdateDownloaded` and `UpdateFailed`
/// are terminal by name; their arguments are decoded when they match.
pub(crate) fn decode_report(message: &Message) -> zbus::Result<Option<UpdateEvent>> {
    let header = message.header();
    let member = match header.member() {
        Some(member) => member.to_string(),
        None => return Ok(None),
    };
    let body = message.body();

    let event = match member.as_str() {
        UPDATE_AVAILABLE_STATUS => {
            let args: Structure<'_> = body.deserialize()?;
            let fields = args.fields();
            match (fields.first(), fields.get(1)) {
                (Some(Value::Bool(available)), Some(Value::Bool(downloading))) => {
                    UpdateEvent::Availability {
                        available: *available,
                        downloading: *downloading,
                        available_version: string_arg(fields, 2),
                        update_size: int_arg(fields, 3),
                        last_update_date: string_arg(fields, 4),
                        error_reason: string_arg(fields, 5),
                    }
                }
                _ => {
                    return Err(zbus::Error::Failure(format!(
                        "{} without leading (available, downloading) booleans",
                        UPDATE_AVAILABLE_STATUS
                    )))
                }
            }
        }
        UPDATE_DOWNLOADED => UpdateEvent::Downloaded,
        UPDATE_FAILED => {
            let args: Option<Structure<'_>> = body.deserialize().ok();
            let fields = args.as_ref().map(|args| args.fields()).unwrap_or(&[]);
            UpdateEvent::Failed {
                consecutive_failures: int_arg(fields, 0),
                last_reason: string_arg(fields, 1),
            }
        }
        other => {
            tracing::trace!(member = other, "Ignoring update service signal");
            return Ok(None);
        }
    };

    Ok(Some(event))
}

fn string_arg(fields: &[Value<'_>], index: usize) -> String {
    match fields.get(index) {
        Some(Value::Str(value)) => value.to_string(),
        _ => String::new(),
    }
}

fn int_arg(fields: &[Value<'_>], index: usize) -> i32 {
    match fields.get(index) {
        Some(Value::I32(value)) => *value,
        _ => 0,
    }
}

pub struct PostalClient {
    connection: Connection,
    endpoint: BusEndpoint,
}

impl PostalClient {
    pub fn connect(endpoint: &BusEndpoint) -> Result<Self> {
        let connection =
            Connection::session().map_err(|err| unavailable(endpoint, "session bus", err))?;
        Ok(Self {
            connection,
            endpoint: endpoint.clone(),
        })
    }

    fn call(&self, method: &str, app_id: &str, arg: &str) -> Result<()> {
        self.connection
            .call_method(
                Some(self.endpoint.bus_name.as_str()),
                self.endpoint.object_path.as_str(),
                Some(self.endpoint.interface.as_str()),
                method,
                &(app_id, arg),
            )
            .map(|_| ())
            .map_err(|err| unavailable(&self.endpoint, method, err))
    }
}

impl NotificationService for PostalClient {
    fn clear_persistent(&self, app_id: &str, tag: &str) -> Result<()> {
        self.call("ClearPersistent", app_id, tag)
    }

    fn post(&self, app_id: &str, message: &str) -> Result<()> {
        self.call("Post", app_id, message)
    }
}

fn unavailable(endpoint: &BusEndpoint, step: &str, err: zbus::Error) -> HelperError {
    HelperError::unavailable(endpoint.bus_name.clone(), format!("{}: {}", step, err))
}

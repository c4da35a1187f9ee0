//! # software-updates-core
//!
//! Logic behind the software updates push helper: what a push payload means,
//! what the update card looks like, and how one background update check runs
//! to completion.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. The worker blocks on one report stream.
//! - **Transport-agnostic**: Platform services sit behind [`UpdateService`] and
//!   [`NotificationService`]; the helper binary supplies the D-Bus clients.
//! - **Silent on failure**: Anything that goes wrong results in no
//!   notification, never a user-visible error.
//!
//! ```text
//! dispatcher → Payload ─┬─ SystemImageUpdate → compose → output file
//!                       ├─ Testing           → {"testing": true}
//!                       └─ Broadcast         → detach → Worker → Publisher
//! ```

pub mod check;
pub mod config;
pub mod error;
pub mod notification;
pub mod payload;
pub mod publisher;
pub mod services;
pub mod worker;

#[cfg(any(test, feature = "test-helpers"))]
pub mod fakes;

pub use check::{CheckState, Outcome, UpdateCheck, UpdateEvent};
pub use config::{load_config, BusEndpoint, HelperConfig};
pub use error::{HelperError, Result};
pub use notification::{
    compose, push_message, write_output, Cause, Notification, Output, SYSTEM_IMAGE_UPDATE_TAG,
};
pub use payload::{BroadcastInfo, Payload};
pub use publisher::Publisher;
pub use services::{NotificationService, UpdateService};
pub use worker::{Worker, WorkerReport};

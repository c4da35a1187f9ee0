//! Log setup for the helper and its detached worker.
//!
//! Logs go to a daily-rotated file in the per-application cache directory;
//! stdout and stderr stay silent. The appender writes synchronously (no
//! background writer thread), so a forked worker keeps logging to the same
//! file through the inherited subscriber.

use fs_err as fs;
use software_updates_core::HelperConfig;
use std::backtrace::Backtrace;
use std::env;
use std::path::Path;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "SOFTWARE_UPDATES_HELPER_DEBUG";
const LOG_PREFIX: &str = "software_updates_helper";
const LOG_SUFFIX: &str = "log";

pub fn init(config: &HelperConfig) {
    let filter = if debug_enabled() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // No subscriber exists yet, so a failure here can only go to stderr.
    let appender = match config.log_dir() {
        Some(dir) => match build_appender(&dir, config.log_retention) {
            Ok(appender) => Some(appender),
            Err(err) => {
                eprintln!(
                    "software-updates-helper: not logging to {}: {}",
                    dir.display(),
                    err
                );
                None
            }
        },
        None => None,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    // A second init (tests) keeps the first subscriber.
    let _ = match appender {
        Some(appender) => builder.with_writer(appender).try_init(),
        None => builder.with_writer(std::io::sink).try_init(),
    };
}

fn debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

fn build_appender(dir: &Path, retention: usize) -> Result<RollingFileAppender, AppenderError> {
    fs::create_dir_all(dir)?;
    Ok(RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(retention.max(1))
        .build(dir)?)
}

#[derive(Debug, thiserror::Error)]
enum AppenderError {
    #[error("cannot create log directory: {0}")]
    Directory(#[from] std::io::Error),
    #[error(transparent)]
    Appender(#[from] InitError),
}

/// Routes panics into the log instead of the (possibly closed) stderr.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = Backtrace::force_capture();
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        let location = info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();

        tracing::error!(
            panic = %message,
            location = %location,
            backtrace = %backtrace,
            "Died with panic"
        );
    }));
}

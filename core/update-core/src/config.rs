//! Helper configuration.
//!
//! Defaults match the platform's own service names. An optional TOML file can
//! override any of them, which is how the helper is pointed at test buses.

use crate::error::{HelperError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "SOFTWARE_UPDATES_HELPER_CONFIG";
const APP_DIR: &str = "ubuntu-system-settings";
const CONFIG_FILE: &str = "software-updates-helper.toml";

pub const DEFAULT_APP_ID: &str = "_ubuntu-system-settings";
pub const DEFAULT_ICON: &str =
    "/usr/share/ubuntu/settings/system/icons/settings-system-update.svg";
pub const DEFAULT_UPDATER_ACTION: &str = "settings:///system/system-update";
pub const DEFAULT_LOG_RETENTION: usize = 10;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HelperConfig {
    /// Application identity used for every notification-service call.
    pub app_id: String,
    pub icon: String,
    pub updater_action: String,
    /// Overrides the per-application cache directory for logs.
    pub log_dir: Option<PathBuf>,
    /// Number of rotated daily log files kept.
    pub log_retention: usize,
    pub system_image: BusEndpoint,
    pub postal: BusEndpoint,
}

/// Well-known name, object path and interface of a bus service.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BusEndpoint {
    pub bus_name: String,
    pub object_path: String,
    pub interface: String,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            icon: DEFAULT_ICON.to_string(),
            updater_action: DEFAULT_UPDATER_ACTION.to_string(),
            log_dir: None,
            log_retention: DEFAULT_LOG_RETENTION,
            system_image: BusEndpoint::system_image(),
            postal: BusEndpoint::postal(),
        }
    }
}

impl BusEndpoint {
    pub fn system_image() -> Self {
        Self {
            bus_name: "com.canonical.SystemImage".to_string(),
            object_path: "/Service".to_string(),
            interface: "com.canonical.SystemImage".to_string(),
        }
    }

    pub fn postal() -> Self {
        Self {
            bus_name: "com.ubuntu.Postal".to_string(),
            object_path: "/com/ubuntu/Postal/_".to_string(),
            interface: "com.ubuntu.Postal".to_string(),
        }
    }
}

impl HelperConfig {
    /// Directory the rotating log lives in.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(APP_DIR)))
    }
}

/// Returns the path of the config file, honouring the environment override.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Loads the helper config, returning defaults if the file doesn't exist.
pub fn load_config(path: Option<&Path>) -> Result<HelperConfig> {
    let config_path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => path,
        None => return Ok(HelperConfig::default()),
    };

    if !config_path.exists() {
        return Ok(HelperConfig::default());
    }

    let content = fs_err::read_to_string(&config_path)
        .map_err(|err| HelperError::io("Failed to read helper config", err))?;
    toml::from_str::<HelperConfig>(&content).map_err(|err| HelperError::Config {
        path: config_path,
        details: err.to_string(),
    })
}

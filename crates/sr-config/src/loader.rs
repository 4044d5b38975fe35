//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "registry.toml",
    "./config/config.toml",
    "./config/registry.toml",
    "/etc/subscription-registry/config.toml",
];

pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Defaults, then the first config file found, then `SUBREG_*` overrides.
    /// The result is validated.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_env_overrides(&mut config, |key| env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured file not found, searching defaults");
        }

        if let Ok(path) = env::var("SUBREG_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// `lookup` stands in for the process environment so tests stay hermetic.
fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("SUBREG_NOTIFICATION_CAPACITY") {
        match val.parse() {
            Ok(capacity) => config.registry.notification_capacity = capacity,
            Err(_) => warn!(value = %val, "Ignoring invalid SUBREG_NOTIFICATION_CAPACITY"),
        }
    }
    if let Some(val) = lookup("SUBREG_HANDLE_PREFIX") {
        config.factory.handle_prefix = val;
    }
    if let Some(val) = lookup("SUBREG_LOG_FORMAT") {
        config.logging.format = val;
    }
    if let Some(val) = lookup("SUBREG_LOG_LEVEL") {
        config.logging.level = val;
    }
}

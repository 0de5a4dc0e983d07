//! JSON configuration file adapter.
//!
//! Implements [`ConfigPort`] by reading `config.json` from the root of the
//! asset volume.  Every field is optional; missing fields keep their
//! defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::VehicleConfig;

pub const CONFIG_FILE_NAME: &str = "config.json";

pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Store reading `config.json` inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load, falling back to defaults on any error.  The error is logged.
    pub fn load_or_default(&self) -> VehicleConfig {
        self.load().unwrap_or_else(|e| {
            log::warn!("config: {} ({}), using defaults", e, self.path.display());
            VehicleConfig::default()
        })
    }
}

impl ConfigPort for FileConfigStore {
    fn load(&self) -> Result<VehicleConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("config: no {}, using defaults", self.path.display());
                return Ok(VehicleConfig::default());
            }
            Err(_) => return Err(ConfigError::IoError),
        };
        let cfg: VehicleConfig =
            serde_json::from_str(&text).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("config: loaded {}", self.path.display());
        Ok(cfg)
    }
}

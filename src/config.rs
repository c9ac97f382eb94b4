// SPDX-License-Identifier: GPL-3.0-only

//! Runtime configuration for Vulkan hardware decode

use crate::constants::logging;
use crate::errors::{HwdecError, HwdecResult};
use crate::hwdec::queue_families::{LegacyQueueFamilies, MultiQueueFamilies, QueueFamilyStrategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Which decoder queue family API to populate
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum QueueFamilyApi {
    /// One entry per queue family, every decode-capable family listed
    #[default]
    MultiQueue,
    /// Fixed graphics/transfer/compute/decode index fields
    Legacy,
}

impl QueueFamilyApi {
    /// Get display name for the API variant
    pub fn display_name(&self) -> &'static str {
        match self {
            QueueFamilyApi::MultiQueue => "multi-queue",
            QueueFamilyApi::Legacy => "legacy",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Queue family assignment variant handed to the decoder
    pub queue_family_api: QueueFamilyApi,
    /// Probe mode: failures are expected and logged quietly
    pub probing: bool,
    /// Default tracing filter when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_family_api: QueueFamilyApi::default(),
            probing: false,
            log_filter: logging::DEFAULT_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Default config file location (`$XDG_CONFIG_HOME/vulkan-hwdec/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vulkan-hwdec").join("config.json"))
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> HwdecResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| HwdecError::Config(format!("{}: {}", path.display(), e)))?;
        let config = serde_json::from_str(&contents)
            .map_err(|e| HwdecError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: &Path) -> HwdecResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load from `path` (or the default location), falling back to defaults
    ///
    /// A missing file is normal. A malformed one is reported and ignored.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Self::default(),
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Ignoring invalid configuration file");
                Self::default()
            }
        }
    }

    /// The queue family assignment strategy selected by this configuration
    pub fn queue_strategy(&self) -> &'static dyn QueueFamilyStrategy {
        match self.queue_family_api {
            QueueFamilyApi::MultiQueue => &MultiQueueFamilies,
            QueueFamilyApi::Legacy => &LegacyQueueFamilies,
        }
    }
}

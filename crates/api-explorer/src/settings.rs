//! Explorer settings
//!
//! Read from a plain JSON file once at startup and never written back.
//! Command-line flags and environment variables override file values.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Log filter used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Build the log filter from `RUST_LOG`-style directives. Directives that
/// are given replace the default entirely.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Explorer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplorerSettings {
    /// URL of the live OpenAPI document; the built-in catalog is used when unset
    pub docs_url: Option<String>,
    /// Target server for test requests; falls back to the document's first server
    pub base_url: Option<String>,
    /// Test request timeout in seconds
    pub timeout_secs: u64,
    /// Token sent as `Authorization: Bearer <token>`
    pub bearer_token: Option<String>,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            docs_url: None,
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            bearer_token: None,
        }
    }
}

/// Values given on the command line, applied over the file
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub docs_url: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub bearer_token: Option<String>,
}

impl ExplorerSettings {
    /// `settings.json` in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("br", "comlink", "api-explorer")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from a file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Load from `path`, or from the default location when `None`
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Apply command-line values on top of the loaded ones
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Self {
        if overrides.docs_url.is_some() {
            self.docs_url = overrides.docs_url;
        }
        if overrides.base_url.is_some() {
            self.base_url = overrides.base_url;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs = secs;
        }
        if overrides.bearer_token.is_some() {
            self.bearer_token = overrides.bearer_token;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

//! Runtime configuration for the scope tooling.
//!
//! Layered file → environment: values come from `factory-scope.toml`
//! (an explicit `--config` path, or the platform config dir), then any
//! `FACTORY_SCOPE_*` environment variables override them.
//!
//! # Configuration File Format
//!
//! ```toml
//! backend_url = "https://db.example.com"
//! api_key = "service-role-key"
//! state_dir = "/var/lib/factory-scope"   # optional
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const ENV_BACKEND_URL: &str = "FACTORY_SCOPE_BACKEND_URL";
pub const ENV_API_KEY: &str = "FACTORY_SCOPE_API_KEY";
pub const ENV_STATE_DIR: &str = "FACTORY_SCOPE_STATE_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Base URL of the managed backend serving the factory table.
    #[serde(default)]
    pub backend_url: String,
    /// API key sent with factory-list requests.
    #[serde(default)]
    pub api_key: String,
    /// Where the persisted selection lives. Defaults to the platform
    /// data directory.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

impl ScopeConfig {
    /// Load configuration, layering environment overrides on top of the
    /// file (explicit path, or the default location if it exists).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(_) | None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Overlay environment variables. Injected as a lookup so tests can
    /// drive it without mutating the process environment.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(url) = get(ENV_BACKEND_URL) {
            self.backend_url = url;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(dir) = get(ENV_STATE_DIR) {
            self.state_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("factory-scope").join("factory-scope.toml"))
    }

    /// Resolved state directory, falling back to the platform data dir.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("factory-scope")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn selection_path(&self) -> PathBuf {
        self.state_dir().join("selection.json")
    }

    pub fn session_path(&self) -> PathBuf {
        self.state_dir().join("session.json")
    }
}

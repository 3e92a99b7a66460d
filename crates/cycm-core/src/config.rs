use crate::error::Result;
use crate::line::SplitAt;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum number of conversation entries kept for the next request.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_history_limit() -> usize {
    40
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            history_limit: default_history_limit(),
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Where queue records split into actor and payload.
    #[serde(default)]
    pub record_split: SplitAt,
    #[serde(default)]
    pub ai: AiConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            poll_interval_ms: default_poll_interval_ms(),
            record_split: SplitAt::default(),
            ai: AiConfig::default(),
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Load `config.yaml` under `root`.
    ///
    /// A missing or empty file is replaced by the defaults. A file that fails
    /// to parse is left untouched and the defaults are used for this run.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            let cfg = Config::default();
            cfg.save(root)?;
            tracing::info!(path = %path.display(), "config file created");
            return Ok(cfg);
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            let cfg = Config::default();
            cfg.save(root)?;
            return Ok(cfg);
        }
        match serde_yaml::from_str::<Config>(&data) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), enabled = cfg.enabled, "config loaded");
                Ok(cfg)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "invalid config, using defaults");
                Ok(Config::default())
            }
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

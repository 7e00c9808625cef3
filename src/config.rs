use crate::error::{MonitorError, Result};
use crate::types::Source;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Default aggregator endpoint serving all three prediction feeds.
pub const DEFAULT_BASE_URL: &str = "https://allaboutfantasy.cn/api/getpricepredict";

const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub filter: FilterConfig,
    pub merge: MergeConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Base URL of the prediction aggregator; the source id is appended as a query parameter.
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// A LIVEFPL row is kept only when |progress tonight| exceeds this value.
    pub tonight_progress_threshold: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            tonight_progress_threshold: 100.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Field-selection precedence. Sources missing from the list are appended
    /// in default order, so a partial list still covers every source.
    pub precedence: Vec<Source>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            precedence: Source::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Feishu webhook URL; the FEISHU_WEBHOOK environment variable takes effect
    /// when this is unset.
    pub webhook_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_seconds: 10,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    fn load_from(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            MonitorError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Loads config.toml when present, otherwise falls back to defaults.
    /// A file that exists but cannot be read or parsed is ignored with a
    /// warning, never silently.
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(Path::new(CONFIG_PATH))
    }

    fn load_or_default_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Resolved webhook URL: the config value wins, then FEISHU_WEBHOOK from
    /// the environment. Empty strings count as unset.
    pub fn webhook_url(&self) -> Option<String> {
        self.notify
            .webhook_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| {
                std::env::var("FEISHU_WEBHOOK")
                    .ok()
                    .filter(|url| !url.trim().is_empty())
            })
    }
}

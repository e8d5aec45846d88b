//! Configuration Management
//!
//! Settings come from a YAML file (`~/.syncli.yaml` unless `--config` is given),
//! then `SYNCLI_*` environment variables, then command-line flags.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_PREFIX: &str = "SYNCLI";

/// Contents of the YAML config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl FileConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to unit, not a map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }
}

/// Validated settings needed to talk to a homeserver
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub access_token: String,
    pub timeout: Duration,
}

// Keep the token out of debug logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".syncli.yaml"))
    }

    /// Load configuration from file and process environment.
    ///
    /// A missing default file only logs a warning; an explicit `path` must be readable.
    pub fn load(path: Option<&Path>, timeout_override: Option<u64>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                let file = FileConfig::read(path)?;
                tracing::info!(event = "config_loaded", file = %path.display(), "Configuration file loaded successfully");
                file
            }
            None => Self::load_default_file(),
        };

        Self::resolve(file, |key| std::env::var(key).ok(), timeout_override)
    }

    fn load_default_file() -> FileConfig {
        let Some(path) = Self::default_path() else {
            return FileConfig::default();
        };

        match FileConfig::read(&path) {
            Ok(file) => {
                tracing::info!(event = "config_loaded", file = %path.display(), "Configuration file loaded successfully");
                file
            }
            Err(e) => {
                tracing::warn!(
                    event = "config_load_failed",
                    file = %path.display(),
                    error = %e,
                    "Error loading config file, using environment variables"
                );
                FileConfig::default()
            }
        }
    }

    /// Merge file values with environment lookups (env wins) and the CLI timeout (wins over both)
    pub fn resolve<F>(file: FileConfig, env: F, timeout_override: Option<u64>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(&format!("{}_{}", ENV_PREFIX, key.to_uppercase()));

        let base_url = lookup("base_url").or(file.base_url).unwrap_or_default();
        let access_token = lookup("access_token").or(file.access_token).unwrap_or_default();

        let env_timeout = match lookup("timeout") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("Invalid {}_TIMEOUT: {}", ENV_PREFIX, raw))?,
            ),
            None => None,
        };
        let timeout = timeout_override
            .or(env_timeout)
            .or(file.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let config = Self {
            base_url: base_url.trim().to_string(),
            access_token: access_token.trim().to_string(),
            timeout: Duration::from_secs(timeout),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() || self.access_token.is_empty() {
            bail!("Base URL and Access Token must be provided in the config file or as environment variables");
        }

        let url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base URL: {}", self.base_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            bail!("Base URL must use http or https: {}", self.base_url);
        }

        if self.timeout.is_zero() {
            bail!("Timeout must be greater than zero");
        }

        Ok(())
    }
}

use std::{path::Path, time::Duration};

use anyhow::{Context as _, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::consts::{
    DEFAULT_CONTEXT_LINES, DEFAULT_MAX_CONTEXT_LINES, DEFAULT_RELOAD_DELAY_MS,
    DEFAULT_RETRY_DELAY_MS, DEFAULT_USE_DIFF_PATCH,
};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SaveConfig {
    /// Unchanged lines around each change in an uploaded patch.
    #[serde(default = "default_context_lines")]
    pub default_context_lines: usize,

    /// Upper bound of the context when it is widened after a failed upload.
    #[serde(default = "default_max_context_lines")]
    pub max_context_lines: usize,

    /// Wait before re-fetching the book after a failed upload.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Wait before asking the host to reload the saved resource.
    #[serde(default = "default_reload_delay_ms")]
    pub reload_delay_ms: u64,

    /// Upload patches instead of whole books whenever possible.
    #[serde(default = "default_use_diff_patch")]
    pub use_diff_patch: bool,
}

fn default_context_lines() -> usize {
    debug!("Using default patch context lines: {DEFAULT_CONTEXT_LINES}");
    DEFAULT_CONTEXT_LINES
}

fn default_max_context_lines() -> usize {
    debug!("Using default max patch context lines: {DEFAULT_MAX_CONTEXT_LINES}");
    DEFAULT_MAX_CONTEXT_LINES
}

fn default_retry_delay_ms() -> u64 {
    debug!("Using default retry delay (ms): {DEFAULT_RETRY_DELAY_MS}");
    DEFAULT_RETRY_DELAY_MS
}

fn default_reload_delay_ms() -> u64 {
    debug!("Using default reload delay (ms): {DEFAULT_RELOAD_DELAY_MS}");
    DEFAULT_RELOAD_DELAY_MS
}

fn default_use_diff_patch() -> bool {
    debug!("Using default patch uploads: {DEFAULT_USE_DIFF_PATCH}");
    DEFAULT_USE_DIFF_PATCH
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            default_context_lines: default_context_lines(),
            max_context_lines: default_max_context_lines(),
            retry_delay_ms: default_retry_delay_ms(),
            reload_delay_ms: default_reload_delay_ms(),
            use_diff_patch: default_use_diff_patch(),
        }
    }
}

impl SaveConfig {
    pub fn retry_delay(&self) -> Duration { Duration::from_millis(self.retry_delay_ms) }

    pub fn reload_delay(&self) -> Duration { Duration::from_millis(self.reload_delay_ms) }

    pub async fn read_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading save configuration from '{}'", path.display());
            Self::load_from_file(path).await
        } else {
            info!("No save configuration at '{}', using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub async fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).await.with_context(|| {
            format!(
                "Cannot load save configuration from disk from {}",
                path.display()
            )
        })?;

        let config =
            serde_yaml::from_str(&contents).context("Failed to parse save configuration")?;

        Ok(config)
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        let contents =
            serde_yaml::to_string(&self).context("Failed to serialize save configuration")?;

        fs::write(path, contents)
            .await
            .context("Failed to write save configuration to disk")
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("usfm-save-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: SaveConfig = serde_yaml::from_str("retry_delay_ms: 50\n").unwrap();

        assert_eq!(config, SaveConfig {
            retry_delay_ms: 50,
            ..SaveConfig::default()
        });
        assert_eq!(config.retry_delay(), Duration::from_millis(50));
        assert_eq!(config.reload_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_defaults() {
        let config = SaveConfig::default();

        assert_eq!(config.default_context_lines, 4);
        assert_eq!(config.max_context_lines, 10);
        assert!(config.use_diff_patch);
    }

    #[tokio::test]
    async fn test_write_and_load() {
        let path = temp_path("write-and-load.yml");
        let config = SaveConfig {
            use_diff_patch: false,
            ..SaveConfig::default()
        };

        config.write(&path).await.unwrap();
        let loaded = SaveConfig::read_or_default(&path).await.unwrap();
        fs::remove_file(&path).await.unwrap();

        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let path = temp_path("missing.yml");

        assert_eq!(
            SaveConfig::read_or_default(&path).await.unwrap(),
            SaveConfig::default()
        );
        assert!(SaveConfig::load_from_file(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_file() {
        let path = temp_path("invalid.yml");
        fs::write(&path, "max_context_lines: many\n").await.unwrap();

        let error = SaveConfig::load_from_file(&path).await.unwrap_err();
        fs::remove_file(&path).await.unwrap();

        assert_eq!(error.to_string(), "Failed to parse save configuration");
    }
}

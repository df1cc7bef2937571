//! Configuration types.

use crate::format::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory name used under the platform data dir and as the local fallback.
pub const APP_DIR_NAME: &str = "task-quest";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Where snapshots are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// One JSON file per snapshot under `data_dir` (default).
    #[default]
    File,
    /// Nothing is written; state lasts for one process.
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Snapshot directory. Defaults to the platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Effective snapshot directory.
    ///
    /// Falls back to `<platform data dir>/task-quest`, then `./.task-quest`.
    pub fn resolved_data_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR_NAME)))
    }
}

/// Output configuration for the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Draw a progress bar in `stats`.
    #[serde(default = "default_show_progress_bar")]
    pub show_progress_bar: bool,

    /// Progress bar width in characters.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            show_progress_bar: default_show_progress_bar(),
            bar_width: default_bar_width(),
        }
    }
}

fn default_show_progress_bar() -> bool {
    true
}

fn default_bar_width() -> usize {
    20
}

impl Config {
    /// Reject values the rest of the program cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.display.bar_width == 0 || self.display.bar_width > 200 {
            anyhow::bail!(
                "display.bar_width must be between 1 and 200, got {}",
                self.display.bar_width
            );
        }
        if let Some(ref dir) = self.storage.data_dir
            && dir.as_os_str().is_empty()
        {
            anyhow::bail!("storage.data_dir must not be empty");
        }
        Ok(())
    }
}

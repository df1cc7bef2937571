//! Configuration loader with tier-based merging.

use super::merge::merge_tiers;
use super::types::{APP_DIR_NAME, Config, StorageBackend};
use crate::format::OutputFormat;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the config file inside each tier directory.
pub const CONFIG_FILE: &str = "config.yaml";

const ENV_DATA_DIR: &str = "TASK_QUEST_DATA_DIR";
const ENV_BACKEND: &str = "TASK_QUEST_BACKEND";
const ENV_FORMAT: &str = "TASK_QUEST_FORMAT";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Built-in defaults
    Defaults = 0,
    /// Project-level config (`./task-quest/`)
    Project = 1,
    /// User-level config (`~/.task-quest/`)
    User = 2,
    /// Explicit `--config` file
    Explicit = 3,
    /// Environment variables
    Environment = 4,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Explicit => write!(f, "explicit"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration directories from the environment and defaults.
    pub fn discover() -> Self {
        // User dir: TASK_QUEST_USER_DIR or ~/.task-quest
        let user_dir = std::env::var("TASK_QUEST_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(format!(".{}", APP_DIR_NAME))));

        // Project dir: TASK_QUEST_PROJECT_DIR or $CWD/task-quest
        let project_dir = std::env::var("TASK_QUEST_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from(APP_DIR_NAME)));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Loads and merges configuration tiers.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Config files and variables that contributed, lowest tier first.
    sources: Vec<(ConfigTier, String)>,
}

impl ConfigLoader {
    /// Load from discovered paths, the optional explicit file, and the environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("TASK_QUEST_CONFIG_PATH").ok().map(PathBuf::from));
        let mut loader = Self::load_with_paths(ConfigPaths::discover(), explicit.as_deref())?;
        loader.apply_env_overrides(|key| std::env::var(key).ok());
        loader.config.validate()?;
        Ok(loader)
    }

    /// Load from explicit paths, without environment overrides.
    ///
    /// Unreadable or malformed tier files are skipped with a warning; an
    /// explicit file that cannot be read or parsed is an error.
    pub fn load_with_paths(paths: ConfigPaths, explicit: Option<&Path>) -> Result<Self> {
        let mut tiers: Vec<Value> = Vec::new();
        let mut sources = Vec::new();

        tiers.push(serde_json::to_value(Config::default())?);

        for (tier, dir) in [
            (ConfigTier::Project, paths.project_dir.as_deref()),
            (ConfigTier::User, paths.user_dir.as_deref()),
        ] {
            let Some(dir) = dir else { continue };
            let file = dir.join(CONFIG_FILE);
            if !file.exists() {
                continue;
            }
            match read_yaml(&file) {
                Ok(value) => {
                    debug!(tier = %tier, path = %file.display(), "Loaded config tier");
                    tiers.push(value);
                    sources.push((tier, file.display().to_string()));
                }
                Err(e) => {
                    warn!(tier = %tier, path = %file.display(), error = %format!("{:#}", e), "Skipping unreadable config");
                }
            }
        }

        if let Some(file) = explicit {
            tiers.push(read_yaml(file)?);
            sources.push((ConfigTier::Explicit, file.display().to_string()));
        }

        let merged = merge_tiers(tiers);
        let config: Config =
            serde_json::from_value(merged).context("invalid configuration values")?;

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Apply `TASK_QUEST_*` overrides using `lookup` to read variables.
    ///
    /// Each variable that changes the config is recorded as an
    /// `Environment` source; unrecognized values are ignored with a warning.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.config.storage.data_dir = Some(PathBuf::from(dir));
            self.record_env(ENV_DATA_DIR);
        }

        if let Some(backend) = lookup(ENV_BACKEND) {
            let parsed = match backend.to_lowercase().as_str() {
                "file" => Some(StorageBackend::File),
                "memory" => Some(StorageBackend::Memory),
                _ => None,
            };
            match parsed {
                Some(parsed) => {
                    self.config.storage.backend = parsed;
                    self.record_env(ENV_BACKEND);
                }
                None => warn!(value = %backend, "Ignoring unknown {}", ENV_BACKEND),
            }
        }

        if let Some(format) = lookup(ENV_FORMAT) {
            match OutputFormat::from_str(&format) {
                Some(parsed) => {
                    self.config.display.format = parsed;
                    self.record_env(ENV_FORMAT);
                }
                None => warn!(value = %format, "Ignoring unknown {}", ENV_FORMAT),
            }
        }
    }

    fn record_env(&mut self, var: &str) {
        self.sources
            .push((ConfigTier::Environment, var.to_string()));
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Where the result came from, lowest tier first: a file path for file
    /// tiers, a variable name for the environment tier.
    pub fn sources(&self) -> &[(ConfigTier, String)] {
        &self.sources
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with_paths(paths, None).unwrap();
        assert_eq!(loader.config(), &Config::default());
        assert!(loader.sources().is_empty());
    }

    #[test]
    fn test_user_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        let user = temp.path().join("user");
        write_config(&project, "display:\n  bar_width: 30\n  format: json\n");
        write_config(&user, "display:\n  bar_width: 40\n");

        let loader =
            ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project), Some(user)), None)
                .unwrap();
        let config = loader.config();

        assert_eq!(config.display.bar_width, 40);
        assert_eq!(config.display.format, OutputFormat::Json);
        let tiers: Vec<_> = loader.sources().iter().map(|(t, _)| *t).collect();
        assert_eq!(tiers, vec![ConfigTier::Project, ConfigTier::User]);
    }

    #[test]
    fn test_explicit_file_wins() {
        let temp = TempDir::new().unwrap();
        let user = temp.path().join("user");
        write_config(&user, "storage:\n  backend: file\n");
        let explicit = temp.path().join("custom.yaml");
        std::fs::write(&explicit, "storage:\n  backend: memory\n").unwrap();

        let loader = ConfigLoader::load_with_paths(
            ConfigPaths::with_dirs(None, Some(user)),
            Some(&explicit),
        )
        .unwrap();
        assert_eq!(loader.config().storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_broken_tier_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        write_config(&project, "display: [unclosed\n");

        let loader =
            ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project), None), None)
                .unwrap();
        assert_eq!(loader.config(), &Config::default());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        let result = ConfigLoader::load_with_paths(ConfigPaths::default(), Some(&missing));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let temp = TempDir::new().unwrap();
        let mut loader =
            ConfigLoader::load_with_paths(ConfigPaths::with_dirs(None, None), None).unwrap();
        let env: HashMap<&str, String> = [
            ("TASK_QUEST_DATA_DIR", temp.path().display().to_string()),
            ("TASK_QUEST_BACKEND", "MEMORY".to_string()),
            ("TASK_QUEST_FORMAT", "bogus".to_string()),
        ]
        .into_iter()
        .collect();

        loader.apply_env_overrides(|k| env.get(k).cloned());
        let config = loader.config();
        assert_eq!(config.storage.data_dir.as_deref(), Some(temp.path()));
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.display.format, OutputFormat::Text);

        // The rejected format value is not reported as a source.
        let vars: Vec<_> = loader
            .sources()
            .iter()
            .filter(|(tier, _)| *tier == ConfigTier::Environment)
            .map(|(_, var)| var.as_str())
            .collect();
        assert_eq!(vars, vec!["TASK_QUEST_DATA_DIR", "TASK_QUEST_BACKEND"]);
    }

    #[test]
    fn test_explicit_source_is_recorded() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("custom.yaml");
        std::fs::write(&explicit, "display:\n  bar_width: 12\n").unwrap();

        let loader =
            ConfigLoader::load_with_paths(ConfigPaths::default(), Some(&explicit)).unwrap();
        assert_eq!(
            loader.sources(),
            &[(ConfigTier::Explicit, explicit.display().to_string())]
        );
        assert_eq!(loader.config().display.bar_width, 12);
    }
}

//! TOML-based application configuration.
//!
//! Stored at `~/.config/study-scheduler/config.toml`. Set
//! `STUDY_SCHEDULER_ENV=dev` to use `~/.config/study-scheduler-dev/` instead.

use crate::error::{Result, StudyError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DATABASE_FILE: &str = "db.sqlite3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Relative paths are resolved against the config directory.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Maximum number of due items pulled into one session. None means all of them.
    #[serde(default)]
    pub session_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub study: StudyConfig,
}

fn default_database_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_FILE)
}
fn default_user_id() -> String {
    "local".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            session_limit: None,
        }
    }
}

/// Returns `~/.config/study-scheduler[-dev]/`, creating it if needed.
pub fn config_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDY_SCHEDULER_ENV").unwrap_or_default();
    let dir = if env == "dev" {
        base_dir.join("study-scheduler-dev")
    } else {
        base_dir.join("study-scheduler")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

impl Config {
    /// Loads the config from the default location, falling back to defaults when missing.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir()?.join(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_dir()?.join(CONFIG_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Sets one value by its dotted key. An empty or `none` session limit clears it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || StudyError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "study.user_id" => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                self.study.user_id = value.trim().to_string();
            }
            "study.session_limit" => {
                self.study.session_limit = match value.trim() {
                    "" | "none" => None,
                    limit => Some(limit.parse().map_err(|_| invalid())?),
                };
            }
            "database.path" => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                self.database.path = PathBuf::from(value.trim());
            }
            _ => return Err(StudyError::UnknownConfigKey(key.to_string())),
        }
        Ok(())
    }

    /// Database path with relative paths anchored at `base`.
    pub fn database_path(&self, base: &Path) -> PathBuf {
        if self.database.path.is_absolute() {
            self.database.path.clone()
        } else {
            base.join(&self.database.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.study.user_id, "local");
        assert_eq!(config.study.session_limit, None);
        assert_eq!(config.database.path, PathBuf::from("db.sqlite3"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[study]\nsession_limit = 20\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.study.session_limit, Some(20));
        assert_eq!(config.study.user_id, "local");
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.study.user_id = "ana".into();
        config.database.path = PathBuf::from("/var/lib/study/ana.sqlite3");

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[study\nuser_id = ").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(StudyError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_set_values_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();

        config.set("study.user_id", "ana").unwrap();
        config.set("study.session_limit", "15").unwrap();
        config.set("database.path", "ana.sqlite3").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.study.user_id, "ana");
        assert_eq!(loaded.study.session_limit, Some(15));
        assert_eq!(loaded.database.path, PathBuf::from("ana.sqlite3"));

        config.set("study.session_limit", "none").unwrap();
        assert_eq!(config.study.session_limit, None);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut config = Config::default();

        assert!(matches!(
            config.set("study.theme", "dark"),
            Err(StudyError::UnknownConfigKey(_))
        ));
        assert!(matches!(
            config.set("study.session_limit", "lots"),
            Err(StudyError::InvalidConfigValue { .. })
        ));
        assert!(matches!(
            config.set("study.user_id", "  "),
            Err(StudyError::InvalidConfigValue { .. })
        ));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_database_path_resolution() {
        let mut config = Config::default();
        let base = Path::new("/home/ana/.config/study-scheduler");
        assert_eq!(config.database_path(base), base.join("db.sqlite3"));

        config.database.path = PathBuf::from("/tmp/other.sqlite3");
        assert_eq!(
            config.database_path(base),
            PathBuf::from("/tmp/other.sqlite3")
        );
    }
}

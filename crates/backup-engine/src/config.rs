use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backup size limits in megabytes, a limit of zero or less disables the quota.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QuotaPolicy {
    /// The quota for saves without an override.
    pub default_mb: i64,

    /// Per save overrides, keyed by save name.
    pub per_save_mb: HashMap<String, i64>,
}

impl QuotaPolicy {
    /// The quota for a save in megabytes.
    pub fn resolve(&self, save_name: &str) -> i64 {
        self.per_save_mb
            .get(save_name)
            .copied()
            .unwrap_or(self.default_mb)
    }

    /// The quota for a save in bytes, `None` when the quota is disabled.
    pub fn resolve_bytes(&self, save_name: &str) -> Option<u64> {
        let megabytes = u64::try_from(self.resolve(save_name)).ok()?;
        if megabytes == 0 {
            return None;
        }

        Some(megabytes.saturating_mul(1024 * 1024))
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            default_mb: 2048,
            per_save_mb: HashMap::new(),
        }
    }
}

/// The engine's config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// The directory containing one directory per game mode, each containing saves.
    pub save_root: PathBuf,

    /// The directory backups are written to, mirroring the game mode directories.
    pub backup_root: PathBuf,

    /// The game mode to operate on.
    pub game_mode: String,

    /// Write backups as zip archives instead of directory copies.
    pub compress: bool,

    /// The number of backups to keep per save, zero or less keeps every backup.
    pub keep_last: i64,

    /// The backup size limits.
    pub quota: QuotaPolicy,
}

impl Config {
    /// Tries to load a config from a toml file.
    pub fn load_toml(file_path: &Path) -> Result<Self, LoadConfigError> {
        if !file_path.exists() {
            return Err(LoadConfigError::NoFile);
        }

        let contents = fs::read_to_string(file_path).map_err(LoadConfigError::Read)?;
        let config = toml::from_str(&contents)?;

        Ok(config)
    }

    /// The save directory for the current game mode.
    pub fn game_mode_saves(&self) -> PathBuf {
        self.save_root.join(&self.game_mode)
    }

    /// The backup directory for the current game mode.
    pub fn game_mode_backups(&self) -> PathBuf {
        self.backup_root.join(&self.game_mode)
    }
}

impl Default for Config {
    fn default() -> Self {
        let zomboid = home_directory().join("Zomboid");

        Self {
            save_root: zomboid.join("Saves"),
            backup_root: zomboid.join("zas_backup_saves"),
            game_mode: "Sandbox".to_string(),
            compress: true,
            keep_last: 10,
            quota: QuotaPolicy::default(),
        }
    }
}

fn home_directory() -> PathBuf {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("The file does not exist.")]
    NoFile,

    #[error("Failed to read the file:\n{0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to deserialize the file:\n{0}")]
    Deserialize(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_override_wins() {
        let mut quota = QuotaPolicy::default();
        quota.per_save_mb.insert("Alpha".to_string(), 1);

        assert_eq!(quota.resolve("Alpha"), 1);
        assert_eq!(quota.resolve("Beta"), 2048);
        assert_eq!(quota.resolve_bytes("Alpha"), Some(1_048_576));
    }

    #[test]
    fn non_positive_quota_is_disabled() {
        let mut quota = QuotaPolicy {
            default_mb: 0,
            per_save_mb: HashMap::new(),
        };
        quota.per_save_mb.insert("Negative".to_string(), -5);

        assert_eq!(quota.resolve_bytes("Anything"), None);
        assert_eq!(quota.resolve_bytes("Negative"), None);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            game_mode = "Survivor"
            keep_last = 3

            [quota.per_save_mb]
            Alpha = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.game_mode, "Survivor");
        assert_eq!(config.keep_last, 3);
        assert!(config.compress);
        assert_eq!(config.quota.default_mb, 2048);
        assert_eq!(config.quota.resolve("Alpha"), 5);
    }
}

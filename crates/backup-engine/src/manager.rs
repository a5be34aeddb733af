use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    Config, Context,
    archive::{ArchiveError, create_artifact, restore_artifact},
    catalog::{BackupEntry, CatalogError, list_backups},
    metadata::{PlayerMetadata, resolve_metadata, thumbnail_path},
    retention::{enforce_keep_last, enforce_quota, merge_victims},
    size::tree_size,
};

/// Backs up, lists, prunes and restores the saves of one game mode.
#[derive(Debug, Clone)]
pub struct SaveManager {
    /// The config every operation reads from.
    pub config: Config,
}

impl SaveManager {
    /// Create a manager for a config.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Create the backup root and one backup directory per game mode found in the save root.
    pub fn prepare_directories(&self) -> Result<(), ManagerError> {
        fs::create_dir_all(&self.config.backup_root)
            .map_err(|e| ManagerError::Io(e, "create backup root"))?;

        let game_modes = match fs::read_dir(&self.config.save_root) {
            Ok(game_modes) => game_modes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                warn!("Save root not found: {:?}", self.config.save_root);
                return Ok(());
            }
            Err(error) => return Err(ManagerError::Io(error, "read save root")),
        };

        for entry in game_modes {
            let entry = entry.map_err(|e| ManagerError::Io(e, "read save root entry"))?;
            if !entry.path().is_dir() {
                continue;
            }

            let backup_directory = self.config.backup_root.join(entry.file_name());
            fs::create_dir_all(&backup_directory)
                .map_err(|e| ManagerError::Io(e, "create game mode backup directory"))?;
        }

        Ok(())
    }

    /// The saves of the current game mode, most recently modified first.
    pub fn available_saves(&self) -> Vec<String> {
        let save_directory = self.config.game_mode_saves();
        let directory = match fs::read_dir(&save_directory) {
            Ok(directory) => directory,
            Err(error) => {
                if error.kind() != io::ErrorKind::NotFound {
                    warn!("Could not read save directory {save_directory:?}: {error}");
                }
                return Vec::new();
            }
        };

        let mut saves: Vec<(SystemTime, String)> = directory
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
                let name = entry.file_name().into_string().ok()?;
                Some((modified, name))
            })
            .collect();

        saves.sort_by(|a, b| b.cmp(a));
        saves.into_iter().map(|(_, name)| name).collect()
    }

    /// The directory of a save in the current game mode.
    pub fn save_path(&self, save_name: &str) -> PathBuf {
        self.config.game_mode_saves().join(save_name)
    }

    /// Back up a save, returning the new artifact.
    pub fn backup_save(&self, save_name: &str) -> Result<PathBuf, ManagerError> {
        let mut context = self.context(save_name);
        context.current_context = "Backup";

        let source = self.save_path(save_name);
        if !source.exists() {
            return Err(ManagerError::SaveNotFound(save_name.to_string()));
        }

        let backup_directory = self.config.game_mode_backups();
        fs::create_dir_all(&backup_directory)
            .map_err(|e| ManagerError::Io(e, "create backup directory"))?;

        let base_name = format!("{}_{save_name}", Utc::now().timestamp());
        let artifact = create_artifact(
            &source,
            &backup_directory.join(base_name),
            self.config.compress,
        )?;

        info!("{context}Created {artifact:?}");
        Ok(artifact)
    }

    /// The backups in the current game mode, optionally only those of one save, newest first.
    pub fn list_backups(&self, save_name: Option<&str>) -> Result<Vec<BackupEntry>, ManagerError> {
        Ok(list_backups(&self.config.game_mode_backups(), save_name)?)
    }

    /// Restore an artifact over a save in the current game mode, returning the save directory.
    ///
    /// Any existing save with the target name is deleted first.
    pub fn restore_backup(
        &self,
        artifact: &Path,
        target_save_name: &str,
    ) -> Result<PathBuf, ManagerError> {
        let target = self.save_path(target_save_name);
        Ok(restore_artifact(artifact, &target)?)
    }

    /// Delete the oldest backups of a save until they fit inside its quota.
    pub fn enforce_quota(&self, save_name: &str) -> Vec<PathBuf> {
        let mut context = self.context(save_name);
        enforce_quota(
            &mut context,
            &self.config.game_mode_backups(),
            save_name,
            &self.config.quota,
        )
    }

    /// Delete all but the newest `keep_last` backups of a save.
    pub fn enforce_keep_last(&self, save_name: &str) -> Vec<PathBuf> {
        let mut context = self.context(save_name);
        enforce_keep_last(
            &mut context,
            &self.config.game_mode_backups(),
            save_name,
            self.config.keep_last,
        )
    }

    /// Apply both retention policies to a save, returning every deleted artifact once.
    pub fn prune(&self, save_name: &str) -> Vec<PathBuf> {
        merge_victims([
            self.enforce_quota(save_name),
            self.enforce_keep_last(save_name),
        ])
    }

    /// The bytes used by a save and by all of its backups.
    pub fn disk_usage(&self, save_name: &str) -> (u64, u64) {
        let save_bytes = tree_size(&self.save_path(save_name));

        let backup_bytes: u64 = match self.list_backups(Some(save_name)) {
            Ok(backups) => backups.iter().map(BackupEntry::size_bytes).sum(),
            Err(error) => {
                warn!("{}Could not list backups: {error}", self.context(save_name));
                0
            }
        };

        (save_bytes, backup_bytes)
    }

    /// The player metadata of a save, or unknown values when none can be read.
    pub fn save_stats(&self, save_name: &str) -> PlayerMetadata {
        resolve_metadata(&self.save_path(save_name)).unwrap_or_else(PlayerMetadata::unknown)
    }

    /// The save's thumbnail, if it has one.
    pub fn thumbnail_path(&self, save_name: &str) -> Option<PathBuf> {
        thumbnail_path(&self.save_path(save_name))
    }

    fn context(&self, save_name: &str) -> Context {
        Context::for_save(&self.config.game_mode, save_name)
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Save '{0}' not found")]
    SaveNotFound(String),

    #[error("Failed to {1}: {0}")]
    Io(#[source] io::Error, &'static str),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

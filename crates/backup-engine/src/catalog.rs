use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    time::SystemTime,
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    archive::{ARCHIVE_EXTENSION, is_archive},
    size::artifact_size,
};

/// A backup artifact found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    /// The artifact's location.
    pub path: PathBuf,

    /// The save this artifact is a backup of, `None` when the name has no timestamp prefix.
    pub save_name: Option<String>,

    /// If the artifact is a compressed archive rather than a directory.
    pub is_archive: bool,

    /// The artifact's modification time, used for all ordering.
    pub modified: SystemTime,
}

impl BackupEntry {
    /// The artifact's current size in bytes. Directories are summed recursively.
    pub fn size_bytes(&self) -> u64 {
        artifact_size(&self.path)
    }

    /// Ordering used for eviction, oldest first with the path breaking ties.
    pub(crate) fn age_order(&self, other: &Self) -> core::cmp::Ordering {
        self.modified
            .cmp(&other.modified)
            .then_with(|| self.path.cmp(&other.path))
    }
}

/// Recover the save name from an artifact's file name, `{timestamp}_{save name}[.zip]`.
pub fn save_name_of(file_name: &str) -> Option<&str> {
    let base = file_name
        .strip_suffix(ARCHIVE_EXTENSION)
        .and_then(|stem| stem.strip_suffix('.'))
        .unwrap_or(file_name);

    let (timestamp, save_name) = base.split_once('_')?;
    if timestamp.is_empty() || !timestamp.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    Some(save_name)
}

/// List the backups in `backup_directory`, newest first.
///
/// Only directories and archives are backups, any other file is ignored. When `save_name` is set
/// only backups of that save are returned. A missing directory has no backups.
pub fn list_backups(
    backup_directory: &Path,
    save_name: Option<&str>,
) -> Result<Vec<BackupEntry>, CatalogError> {
    let directory = match fs::read_dir(backup_directory) {
        Ok(directory) => directory,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            debug!("Backup directory not found: {backup_directory:?}");
            return Ok(Vec::new());
        }
        Err(error) => return Err(CatalogError::ReadDirectory(error, backup_directory.into())),
    };

    let mut backups: Vec<BackupEntry> = directory
        .filter_map(|entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!("Could not read entry: {error}");
                    return None;
                }
            };
            let path = entry.path();

            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(error) => {
                    warn!("Could not get entry '{path:?}' metadata: {error}");
                    return None;
                }
            };

            let archive = metadata.is_file() && is_archive(&path);
            if !metadata.is_dir() && !archive {
                return None;
            }

            let file_name = entry.file_name();
            let entry_save_name = file_name.to_str().and_then(save_name_of);
            if let Some(filter) = save_name {
                if entry_save_name != Some(filter) {
                    return None;
                }
            }

            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(error) => {
                    warn!("Could not get entry '{path:?}' modified time: {error}");
                    return None;
                }
            };

            Some(BackupEntry {
                save_name: entry_save_name.map(str::to_string),
                path,
                is_archive: archive,
                modified,
            })
        })
        .collect();

    // Newest first.
    backups.sort_by(|a, b| b.age_order(a));

    Ok(backups)
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read backup directory {1:?}: {0}")]
    ReadDirectory(#[source] io::Error, PathBuf),
}

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{error, info, warn};

use crate::{
    Context, QuotaPolicy,
    catalog::{BackupEntry, list_backups},
};

/// Delete the oldest backups of a save until its backups fit inside the save's quota.
///
/// Returns the deleted artifacts, oldest first. Does nothing if the quota is disabled or already
/// met. A backup that cannot be deleted is logged and the eviction continues.
pub fn enforce_quota(
    context: &mut Context,
    backup_directory: &Path,
    save_name: &str,
    quota: &QuotaPolicy,
) -> Vec<PathBuf> {
    context.current_context = "Enforce Quota";

    let Some(quota_bytes) = quota.resolve_bytes(save_name) else {
        return Vec::new();
    };

    let mut backups = match list_backups(backup_directory, Some(save_name)) {
        Ok(backups) => backups,
        Err(error) => {
            error!("{context}Could not list backups: {error}");
            return Vec::new();
        }
    };

    let mut sized: Vec<(BackupEntry, u64)> = backups
        .drain(..)
        .map(|backup| {
            let size = backup.size_bytes();
            (backup, size)
        })
        .collect();

    let mut total_bytes: u64 = sized.iter().map(|(_, size)| size).sum();
    if total_bytes <= quota_bytes {
        return Vec::new();
    }

    info!("{context}Backups use {total_bytes} bytes, over the quota of {quota_bytes} bytes");

    // Oldest first.
    sized.sort_by(|a, b| a.0.age_order(&b.0));

    let mut removed = Vec::new();
    for (backup, size) in sized {
        if total_bytes <= quota_bytes {
            break;
        }

        remove_backup(context, &backup);
        total_bytes = total_bytes.saturating_sub(size);
        removed.push(backup.path);
    }

    removed
}

/// Delete all but the `keep_last` newest backups of a save.
///
/// Returns the deleted artifacts, oldest first. Does nothing if `keep_last` is zero or less.
pub fn enforce_keep_last(
    context: &mut Context,
    backup_directory: &Path,
    save_name: &str,
    keep_last: i64,
) -> Vec<PathBuf> {
    context.current_context = "Keep Last";

    let keep_last = match usize::try_from(keep_last) {
        Ok(0) | Err(_) => return Vec::new(),
        Ok(keep_last) => keep_last,
    };

    let mut backups = match list_backups(backup_directory, Some(save_name)) {
        Ok(backups) => backups,
        Err(error) => {
            error!("{context}Could not list backups: {error}");
            return Vec::new();
        }
    };

    // If there is less than the limit, there is nothing to remove.
    if backups.len() <= keep_last {
        return Vec::new();
    }

    // Oldest first.
    backups.sort_by(|a, b| a.age_order(b));

    let excess = backups.len() - keep_last;
    backups
        .into_iter()
        .take(excess)
        .map(|backup| {
            remove_backup(context, &backup);
            backup.path
        })
        .collect()
}

/// Combine victim lists, dropping repeated paths and keeping the order they were first seen in.
pub fn merge_victims<I>(lists: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = Vec<PathBuf>>,
{
    let mut merged: Vec<PathBuf> = Vec::new();
    for path in lists.into_iter().flatten() {
        if !merged.contains(&path) {
            merged.push(path);
        }
    }

    merged
}

fn remove_backup(context: &Context, backup: &BackupEntry) {
    let path = &backup.path;
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => info!("{context}Removed {path:?}"),
        Err(error) => warn!("{context}Could not remove {path:?}: {error}"),
    }
}

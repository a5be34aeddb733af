use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

/// The size of a single file in bytes.
pub fn file_size(path: &Path) -> Result<u64, SizeError> {
    let metadata = fs::metadata(path).map_err(|error| {
        if error.kind() == ErrorKind::NotFound {
            SizeError::NotFound(path.to_path_buf())
        } else {
            SizeError::Metadata(error, path.to_path_buf())
        }
    })?;

    Ok(metadata.len())
}

/// The sum of the sizes of every regular file under `path`.
///
/// A path that does not exist has a size of zero. Symbolic links are not followed, so targets
/// outside of the tree are never counted. Entries that cannot be read are skipped.
pub fn tree_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                // The root not existing is the expected "no save yet" case.
                if error.depth() > 0 {
                    warn!("Could not read entry under {path:?}: {error}");
                }
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| match entry.metadata() {
            Ok(metadata) => Some(metadata.len()),
            Err(error) => {
                warn!("Could not get entry '{:?}' metadata: {error}", entry.path());
                None
            }
        })
        .sum()
}

/// The size of a backup artifact, a file's own size or the recursive size of a directory.
pub fn artifact_size(path: &Path) -> u64 {
    if path.is_dir() {
        return tree_size(path);
    }

    match file_size(path) {
        Ok(size) => size,
        Err(error) => {
            warn!("Could not size artifact: {error}");
            0
        }
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SizeError {
    #[error("The path {0:?} does not exist")]
    NotFound(PathBuf),

    #[error("Failed to get metadata for {1:?}: {0}")]
    Metadata(#[source] io::Error, PathBuf),
}

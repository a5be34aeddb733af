use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::{CompressionMethod, ZipArchive, ZipWriter, result::ZipError, write::SimpleFileOptions};

/// The file extension of compressed backups, without the leading dot.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// If a path names a compressed backup.
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension == ARCHIVE_EXTENSION)
}

/// `destination_base` with the archive extension appended, keeping any dots already in the name.
pub fn archive_path(destination_base: &Path) -> PathBuf {
    let mut path = OsString::from(destination_base.as_os_str());
    path.push(".");
    path.push(ARCHIVE_EXTENSION);
    PathBuf::from(path)
}

/// Back up the contents of `source` to a new artifact.
///
/// When `compress` is set the artifact is `destination_base` plus the archive extension, with the
/// archive root holding the contents of `source`. Otherwise `source` is copied to
/// `destination_base` as a new directory tree. An existing destination is never overwritten.
pub fn create_artifact(
    source: &Path,
    destination_base: &Path,
    compress: bool,
) -> Result<PathBuf, ArchiveError> {
    match fs::metadata(source) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => return Err(ArchiveError::UnsupportedFormat(source.to_path_buf())),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return Err(ArchiveError::NotFound(source.to_path_buf()));
        }
        Err(error) => return Err(ArchiveError::Io(error, "get source metadata")),
    }

    if !compress {
        copy_tree(source, destination_base)?;
        info!("Copied {source:?} to {destination_base:?}");
        return Ok(destination_base.to_path_buf());
    }

    let destination = archive_path(destination_base);
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&destination)
        .map_err(|error| {
            if error.kind() == ErrorKind::AlreadyExists {
                ArchiveError::AlreadyExists(destination.clone())
            } else {
                ArchiveError::Io(error, "create archive")
            }
        })?;

    // Leave no partial archive behind for the catalog to pick up.
    if let Err(error) = write_archive(source, file) {
        if let Err(remove_error) = fs::remove_file(&destination) {
            warn!("Could not remove partial archive {destination:?}: {remove_error}");
        }
        return Err(error);
    }

    info!("Archived {source:?} to {destination:?}");
    Ok(destination)
}

/// Restore an artifact to `target`, returning `target`.
///
/// This is a destructive overwrite: anything already at `target` is deleted before the artifact
/// is extracted or copied into its place.
pub fn restore_artifact(artifact: &Path, target: &Path) -> Result<PathBuf, ArchiveError> {
    let metadata = fs::metadata(artifact).map_err(|error| {
        if error.kind() == ErrorKind::NotFound {
            ArchiveError::NotFound(artifact.to_path_buf())
        } else {
            ArchiveError::Io(error, "get artifact metadata")
        }
    })?;

    // Open the archive before touching the target, so a corrupt artifact keeps the save intact.
    let archive = if metadata.is_dir() {
        None
    } else if metadata.is_file() && is_archive(artifact) {
        let file = File::open(artifact).map_err(|e| ArchiveError::Io(e, "open archive"))?;
        Some(ZipArchive::new(file)?)
    } else {
        return Err(ArchiveError::UnsupportedFormat(artifact.to_path_buf()));
    };

    // Replace the target
    if let Ok(existing) = fs::symlink_metadata(target) {
        if existing.is_dir() {
            fs::remove_dir_all(target).map_err(|e| ArchiveError::Io(e, "remove restore target"))?;
        } else {
            fs::remove_file(target).map_err(|e| ArchiveError::Io(e, "remove restore target"))?;
        }
        debug!("Removed existing {target:?}");
    }

    match archive {
        Some(mut archive) => {
            fs::create_dir_all(target)
                .map_err(|e| ArchiveError::Io(e, "create restore target"))?;
            archive.extract(target)?;
        }
        None => copy_tree(artifact, target)?,
    }

    info!("Restored {artifact:?} to {target:?}");
    Ok(target.to_path_buf())
}

fn write_archive(source: &Path, file: File) -> Result<(), ArchiveError> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let name = entry_name(source, entry.path())?;

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let mut input =
                File::open(entry.path()).map_err(|e| ArchiveError::Io(e, "open source file"))?;
            io::copy(&mut input, &mut zip).map_err(|e| ArchiveError::Io(e, "write archive"))?;
        } else {
            debug!("Skipping non regular file {:?}", entry.path());
        }
    }

    zip.finish()?;
    Ok(())
}

/// The archive entry name for `path`, relative to `root` with `/` separators.
fn entry_name(root: &Path, path: &Path) -> Result<String, ArchiveError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ArchiveError::OutsideSource(path.to_path_buf()))?;

    let segments: Vec<_> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect();

    Ok(segments.join("/"))
}

/// Recursively copy `source` to `destination`, which must not exist yet.
fn copy_tree(source: &Path, destination: &Path) -> Result<(), ArchiveError> {
    if fs::symlink_metadata(destination).is_ok() {
        return Err(ArchiveError::AlreadyExists(destination.to_path_buf()));
    }

    fs::create_dir_all(destination).map_err(|e| ArchiveError::Io(e, "create destination"))?;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| ArchiveError::OutsideSource(entry.path().to_path_buf()))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| ArchiveError::Io(e, "create directory"))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(|e| ArchiveError::Io(e, "copy file"))?;
        } else {
            debug!("Skipping non regular file {:?}", entry.path());
        }
    }

    Ok(())
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("The path {0:?} does not exist")]
    NotFound(PathBuf),

    #[error("The destination {0:?} already exists")]
    AlreadyExists(PathBuf),

    #[error("{0:?} is neither a backup archive nor a directory")]
    UnsupportedFormat(PathBuf),

    #[error("Entry {0:?} is outside of the source directory")]
    OutsideSource(PathBuf),

    #[error("Failed to {1}: {0}")]
    Io(#[source] io::Error, &'static str),

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read or write archive: {0}")]
    Zip(#[from] ZipError),
}

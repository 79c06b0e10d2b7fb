//! Local filesystem source implementation
//!
//! Opens Avro files from the local filesystem for buffered sequential reads.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

use tracing::debug;

use crate::error::SourceError;

/// Open a local file for buffered reading.
///
/// # Errors
/// Returns `SourceError::NotFound` if the file doesn't exist.
/// Returns `SourceError::PermissionDenied` if access is denied.
/// Returns `SourceError::FileSystemError` for other I/O errors, including
/// paths that point at a directory.
pub fn open_local<P: AsRef<Path>>(path: P) -> Result<BufReader<File>, SourceError> {
    let path = path.as_ref();

    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SourceError::NotFound(path.display().to_string()),
        ErrorKind::PermissionDenied => SourceError::PermissionDenied(path.display().to_string()),
        _ => SourceError::FileSystemError(format!("{}: {}", path.display(), e)),
    })?;

    let metadata = file.metadata().map_err(|e| {
        SourceError::FileSystemError(format!(
            "Failed to get metadata for {}: {}",
            path.display(),
            e
        ))
    })?;

    if metadata.is_dir() {
        return Err(SourceError::FileSystemError(format!(
            "{} is a directory",
            path.display()
        )));
    }

    debug!(path = %path.display(), size = metadata.len(), "opened local avro source");

    Ok(BufReader::new(file))
}

//! Glob pattern and home directory handling for file paths.
//!
//! Path sources are expanded before they are opened: a leading `~` is
//! replaced with the home directory, then glob patterns are expanded to the
//! files they match in lexicographic order. Buffers pass through untouched.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::SourceError;
use crate::source::{ScanSource, ScanSources};

/// Characters that indicate a glob pattern.
const GLOB_CHARS: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Check if a path contains glob pattern characters.
///
/// Returns `true` if the path contains any of: `*`, `?`, `[`, `]`, `{`, `}`
///
/// # Example
/// ```
/// use polars_avro_io::api::is_glob_pattern;
///
/// assert!(is_glob_pattern("data/*.avro"));
/// assert!(is_glob_pattern("data/file?.avro"));
/// assert!(is_glob_pattern("data/[0-9].avro"));
/// assert!(!is_glob_pattern("data/file.avro"));
/// ```
pub fn is_glob_pattern(path: &str) -> bool {
    path.chars().any(|c| GLOB_CHARS.contains(&c))
}

/// Replace a leading `~` with the value of `$HOME`.
///
/// Only `~` on its own or followed by a separator is expanded; `~user` forms
/// and paths without a home directory set are returned unchanged.
pub fn expand_user(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) if rest.as_os_str().is_empty() => PathBuf::from(home),
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Expand a local filesystem glob pattern to matching files.
///
/// Returns the matches sorted for deterministic ordering. A pattern without
/// matches yields an empty list. Entries that can't be read while walking
/// the pattern are skipped with a warning.
///
/// # Errors
/// Returns `SourceError::InvalidGlob` if the pattern is invalid.
pub fn expand_local_glob(pattern: &str) -> Result<Vec<PathBuf>, SourceError> {
    let entries = glob::glob(pattern).map_err(|e| SourceError::InvalidGlob {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => warn!(error = %e, "skipping unreadable glob match"),
        }
    }

    paths.sort();
    debug!(pattern, matches = paths.len(), "expanded glob pattern");

    Ok(paths)
}

/// Expand a path that may or may not be a glob pattern.
///
/// After `~` expansion, if `glob_enabled` is true and the path contains glob
/// characters, the pattern is expanded. Otherwise the path is returned as-is.
///
/// # Errors
/// Returns `SourceError::InvalidGlob` if glob expansion fails.
pub fn expand_path(path: &Path, glob_enabled: bool) -> Result<Vec<PathBuf>, SourceError> {
    let expanded = expand_user(path);

    match expanded.to_str() {
        Some(pattern) if glob_enabled && is_glob_pattern(pattern) => expand_local_glob(pattern),
        _ => Ok(vec![expanded]),
    }
}

/// Expand every path source in order, passing buffers through.
///
/// Unlike a plain list of paths, the result is neither sorted nor
/// deduplicated: the order of sources is the order of rows.
pub fn expand_sources(sources: &ScanSources, glob_enabled: bool) -> Result<ScanSources, SourceError> {
    let mut expanded = Vec::with_capacity(sources.len());

    for (origin, source) in sources.iter().enumerate() {
        match source {
            ScanSource::Path(path) => {
                expanded.extend(
                    expand_path(path, glob_enabled)?
                        .into_iter()
                        .map(|path| (origin, ScanSource::Path(path))),
                );
            }
            ScanSource::Buffer(_) => expanded.push((origin, source.clone())),
        }
    }

    Ok(ScanSources::with_origins(expanded))
}

//! Input sources for Avro data
//!
//! A source is either a path on the local filesystem (which may still contain
//! glob patterns or a leading `~`) or an in-memory buffer. Sources are cheap to
//! clone so a scan can be re-opened every time its `LazyFrame` is collected.

mod local;

use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::SourceError;

pub use local::open_local;

/// Boxed byte reader handed to the Avro codec.
pub type BoxedReader = Box<dyn Read + Send>;

/// A single input source.
#[derive(Clone, PartialEq, Eq)]
pub enum ScanSource {
    /// A local file path or glob pattern.
    Path(PathBuf),
    /// Avro object container file bytes held in memory.
    Buffer(Bytes),
}

impl ScanSource {
    /// Open the source for sequential reading.
    pub fn open(&self) -> Result<BoxedReader, SourceError> {
        match self {
            ScanSource::Path(path) => Ok(Box::new(open_local(path)?)),
            ScanSource::Buffer(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
        }
    }

    /// The path of this source, if it is one.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ScanSource::Path(path) => Some(path),
            ScanSource::Buffer(_) => None,
        }
    }
}

impl fmt::Debug for ScanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ScanSource::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
        }
    }
}

impl From<&str> for ScanSource {
    fn from(path: &str) -> Self {
        ScanSource::Path(PathBuf::from(path))
    }
}

impl From<String> for ScanSource {
    fn from(path: String) -> Self {
        ScanSource::Path(PathBuf::from(path))
    }
}

impl From<&Path> for ScanSource {
    fn from(path: &Path) -> Self {
        ScanSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ScanSource {
    fn from(path: PathBuf) -> Self {
        ScanSource::Path(path)
    }
}

impl From<Bytes> for ScanSource {
    fn from(bytes: Bytes) -> Self {
        ScanSource::Buffer(bytes)
    }
}

impl From<Vec<u8>> for ScanSource {
    fn from(bytes: Vec<u8>) -> Self {
        ScanSource::Buffer(Bytes::from(bytes))
    }
}

/// An ordered list of sources.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanSources {
    sources: Vec<ScanSource>,
    /// Position of each source in the list it was expanded from.
    origins: Vec<usize>,
}

impl ScanSources {
    /// Create a list from any iterable of source-like values.
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ScanSource>,
    {
        Self::from_vec(sources.into_iter().map(Into::into).collect())
    }

    fn from_vec(sources: Vec<ScanSource>) -> Self {
        let origins = (0..sources.len()).collect();
        Self { sources, origins }
    }

    /// Create a list from sources paired with their position in the input
    /// list, as produced by glob expansion.
    pub(crate) fn with_origins(sources: Vec<(usize, ScanSource)>) -> Self {
        let (origins, sources) = sources.into_iter().unzip();
        Self { sources, origins }
    }

    /// Iterate over the sources in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScanSource> {
        self.sources.iter()
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether there are no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Get the source at `index`.
    pub fn get(&self, index: usize) -> Option<&ScanSource> {
        self.sources.get(index)
    }

    /// Human readable name of the source at `index`, used in error messages.
    ///
    /// Buffers are numbered by their position in the caller's input.
    pub fn display_name(&self, index: usize) -> String {
        match self.sources.get(index) {
            Some(ScanSource::Path(path)) => path.display().to_string(),
            _ => {
                let origin = self.origins.get(index).copied().unwrap_or(index);
                format!("buffer[{origin}]")
            }
        }
    }
}

impl<'a> IntoIterator for &'a ScanSources {
    type Item = &'a ScanSource;
    type IntoIter = std::slice::Iter<'a, ScanSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}

impl FromIterator<ScanSource> for ScanSources {
    fn from_iter<T: IntoIterator<Item = ScanSource>>(iter: T) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<S: Into<ScanSource>> From<Vec<S>> for ScanSources {
    fn from(sources: Vec<S>) -> Self {
        Self::new(sources)
    }
}

impl<S: Into<ScanSource> + Clone> From<&[S]> for ScanSources {
    fn from(sources: &[S]) -> Self {
        Self::new(sources.iter().cloned())
    }
}

impl From<ScanSource> for ScanSources {
    fn from(source: ScanSource) -> Self {
        Self::from_vec(vec![source])
    }
}

impl From<&str> for ScanSources {
    fn from(path: &str) -> Self {
        Self::from_vec(vec![path.into()])
    }
}

impl From<String> for ScanSources {
    fn from(path: String) -> Self {
        Self::from_vec(vec![path.into()])
    }
}

impl From<&Path> for ScanSources {
    fn from(path: &Path) -> Self {
        Self::from_vec(vec![path.into()])
    }
}

impl From<PathBuf> for ScanSources {
    fn from(path: PathBuf) -> Self {
        Self::from_vec(vec![path.into()])
    }
}

impl From<Bytes> for ScanSources {
    fn from(bytes: Bytes) -> Self {
        Self::from_vec(vec![bytes.into()])
    }
}

//! Scan arguments for Avro files.
//!
//! This module defines `ScanArgsAvro`, which contains configuration for scanning
//! Avro files. It mirrors Polars' `ScanArgsParquet` for API consistency.

use std::sync::Arc;

/// Type alias for row index size, matching Polars' `IdxSize` (u32).
pub type IdxSize = u32;

/// Row index configuration.
///
/// This struct mirrors Polars' `RowIndex` type. It specifies the name and
/// starting offset for a synthetic row index column.
///
/// # Example
/// ```
/// use polars_avro_io::api::RowIndex;
///
/// let row_index = RowIndex {
///     name: "idx".into(),
///     offset: 0,
/// };
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RowIndex {
    /// Name of the row index column.
    pub name: Arc<str>,
    /// Starting offset for the row index (default: 0).
    pub offset: IdxSize,
}

impl RowIndex {
    /// Create a new `RowIndex` with the given name and offset 0.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            offset: 0,
        }
    }

    /// Create a new `RowIndex` with the given name and offset.
    pub fn with_offset(name: impl Into<Arc<str>>, offset: IdxSize) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }
}

/// Configuration for scanning Avro files.
///
/// Format-specific settings live in [`AvroOptions`](super::AvroOptions),
/// which is passed separately, following Polars' split of
/// `ScanArgsParquet` and `ParquetOptions`.
///
/// # Example
/// ```
/// use polars_avro_io::api::{ScanArgsAvro, RowIndex};
///
/// let args = ScanArgsAvro {
///     n_rows: Some(1000),
///     row_index: Some(RowIndex::new("idx")),
///     glob: true,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanArgsAvro {
    /// Maximum number of rows to read.
    ///
    /// When reading multiple files, the limit applies to the total across all files.
    pub n_rows: Option<usize>,

    /// Row index configuration.
    ///
    /// When set, a synthetic row index column is added as the first column.
    /// The index is continuous across files when reading multiple files.
    pub row_index: Option<RowIndex>,

    /// Whether to expand glob patterns (default: true).
    ///
    /// When true, patterns like `"data/*.avro"` are expanded to matching files.
    /// When false, the path is treated literally.
    pub glob: bool,

    /// Rechunk the result of `read_avro` into contiguous memory (default: false).
    pub rechunk: bool,

    /// Column name used when the Avro schema is not a record.
    ///
    /// Without it, reading a non-record schema is an error.
    pub single_col_name: Option<Arc<str>>,
}

impl Default for ScanArgsAvro {
    fn default() -> Self {
        Self {
            n_rows: None,
            row_index: None,
            glob: true,
            rechunk: false,
            single_col_name: None,
        }
    }
}

impl ScanArgsAvro {
    /// Create a new `ScanArgsAvro` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of rows to read.
    pub fn with_n_rows(mut self, n_rows: usize) -> Self {
        self.n_rows = Some(n_rows);
        self
    }

    /// Set the row index configuration.
    pub fn with_row_index(mut self, row_index: RowIndex) -> Self {
        self.row_index = Some(row_index);
        self
    }

    /// Set the row index by name with offset 0.
    pub fn with_row_index_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.row_index = Some(RowIndex::new(name));
        self
    }

    /// Set whether to expand glob patterns.
    pub fn with_glob(mut self, glob: bool) -> Self {
        self.glob = glob;
        self
    }

    /// Set whether to rechunk the result.
    pub fn with_rechunk(mut self, rechunk: bool) -> Self {
        self.rechunk = rechunk;
        self
    }

    /// Set the column name for non-record schemas.
    pub fn with_single_col_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.single_col_name = Some(name.into());
        self
    }
}

//! Avro-specific reader options.
//!
//! `AvroOptions` controls how Avro data is decoded into batches. It is
//! analogous to Polars' `ParquetOptions`: format-specific settings kept
//! separate from scan configuration (`ScanArgsAvro`).

/// Default number of rows per batch.
pub const DEFAULT_BATCH_SIZE: usize = 32_768;

/// Avro-specific reader options.
///
/// # Example
/// ```
/// use polars_avro_io::api::AvroOptions;
///
/// let opts = AvroOptions {
///     batch_size: 1024,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvroOptions {
    /// Maximum number of rows per DataFrame batch (default: 32768).
    ///
    /// Must be greater than zero.
    pub batch_size: usize,

    /// Read logical types without a native Polars type as their backing
    /// physical type (default: false).
    ///
    /// When false, such columns are a schema error.
    pub convert_logical_types: bool,
}

impl Default for AvroOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            convert_logical_types: false,
        }
    }
}

impl AvroOptions {
    /// Create a new `AvroOptions` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set whether to convert logical types to their physical type.
    pub fn with_convert_logical_types(mut self, convert: bool) -> Self {
        self.convert_logical_types = convert;
        self
    }
}

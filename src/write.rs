//! Writing DataFrames as Avro object container files.
//!
//! The Avro schema is derived from the frame schema (see
//! [`polars_to_avro_schema`]) and records are appended in slices of
//! [`WRITE_CHUNK_ROWS`] rows, so only one slice is held as Avro values at a
//! time.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use apache_avro::{Codec, Schema as AvroSchema, Writer};
use polars::prelude::DataFrame;
use tracing::{debug, info};

use crate::convert::{frame_to_values, polars_to_avro_schema};
use crate::error::WriterError;

/// Number of rows converted to Avro values at once.
pub const WRITE_CHUNK_ROWS: usize = 32_768;

/// Compression codec for Avro data blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AvroCompression {
    /// No compression.
    #[default]
    Uncompressed,
    /// Deflate (zlib without header).
    Deflate,
    /// Snappy with a CRC32 checksum per block.
    Snappy,
    /// Zstandard.
    Zstandard,
    /// Bzip2.
    Bzip2,
    /// Xz.
    Xz,
}

impl AvroCompression {
    /// The codec name stored in the file header.
    pub fn as_str(&self) -> &'static str {
        match self {
            AvroCompression::Uncompressed => "null",
            AvroCompression::Deflate => "deflate",
            AvroCompression::Snappy => "snappy",
            AvroCompression::Zstandard => "zstandard",
            AvroCompression::Bzip2 => "bzip2",
            AvroCompression::Xz => "xz",
        }
    }

    fn codec(&self) -> Result<Codec, WriterError> {
        self.as_str()
            .parse::<Codec>()
            .map_err(|_| WriterError::UnsupportedCodec(self.as_str().to_string()))
    }
}

/// Options for writing Avro files.
///
/// # Example
/// ```
/// use polars_avro_io::{AvroCompression, WriteOptions};
///
/// let opts = WriteOptions::default()
///     .with_record_name("Event")
///     .with_compression(AvroCompression::Snappy);
/// assert!(opts.promote_ints);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Name of the top-level Avro record (default: `"Root"`).
    pub record_name: String,
    /// Block compression (default: uncompressed).
    pub compression: AvroCompression,
    /// Write small and unsigned integers as the next Avro integer type that
    /// holds them (default: true).
    pub promote_ints: bool,
    /// Write fixed-size arrays as Avro arrays (default: true).
    pub promote_array: bool,
    /// Write `Time` as `time-micros`, dropping sub-microsecond precision
    /// (default: false).
    pub truncate_time: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            record_name: "Root".to_string(),
            compression: AvroCompression::Uncompressed,
            promote_ints: true,
            promote_array: true,
            truncate_time: false,
        }
    }
}

impl WriteOptions {
    /// Set the top-level record name.
    pub fn with_record_name(mut self, name: impl Into<String>) -> Self {
        self.record_name = name.into();
        self
    }

    /// Set the compression codec.
    pub fn with_compression(mut self, compression: AvroCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Set whether to promote small and unsigned integers.
    pub fn with_promote_ints(mut self, promote: bool) -> Self {
        self.promote_ints = promote;
        self
    }

    /// Set whether to write fixed-size arrays as lists.
    pub fn with_promote_array(mut self, promote: bool) -> Self {
        self.promote_array = promote;
        self
    }

    /// Set whether to write `Time` as `time-micros`.
    pub fn with_truncate_time(mut self, truncate: bool) -> Self {
        self.truncate_time = truncate;
        self
    }
}

/// Write `df` as an Avro object container file to `dest`.
///
/// The schema is checked before anything is written, so an unsupported
/// column type leaves `dest` untouched.
///
/// # Errors
/// - `WriterError::Schema` if a column type can't be written
/// - `WriterError::Polars` if a value can't be converted, e.g. an
///   out-of-range unsigned integer
/// - `WriterError::Avro` for encoding and IO failures
pub fn write_avro<W: Write>(df: &DataFrame, dest: W, opts: &WriteOptions) -> Result<(), WriterError> {
    let (schema, codec) = prepare(df, opts)?;
    write_records(df, &schema, codec, dest, opts)
}

/// Write `df` to a new Avro file at `path`, replacing any existing file.
///
/// The schema and codec are checked before `path` is opened, so a frame that
/// cannot be written leaves an existing file untouched.
pub fn write_avro_file<P: AsRef<Path>>(
    df: &DataFrame,
    path: P,
    opts: &WriteOptions,
) -> Result<(), WriterError> {
    let path = path.as_ref();
    let (schema, codec) = prepare(df, opts)?;
    let mut file = BufWriter::new(File::create(path)?);
    write_records(df, &schema, codec, &mut file, opts)?;
    file.flush()?;
    debug!(path = %path.display(), "flushed avro file");
    Ok(())
}

fn prepare(df: &DataFrame, opts: &WriteOptions) -> Result<(AvroSchema, Codec), WriterError> {
    let schema = polars_to_avro_schema(&df.schema(), opts)?;
    let codec = opts.compression.codec()?;
    Ok((schema, codec))
}

fn write_records<W: Write>(
    df: &DataFrame,
    schema: &AvroSchema,
    codec: Codec,
    dest: W,
    opts: &WriteOptions,
) -> Result<(), WriterError> {
    let mut writer = Writer::with_codec(schema, dest, codec);

    let mut offset = 0;
    while offset < df.height() {
        let chunk = df.slice(offset as i64, WRITE_CHUNK_ROWS);
        for record in frame_to_values(&chunk, schema)? {
            writer.append(record)?;
        }
        offset += chunk.height();
        debug!(rows = offset, "appended avro records");
    }

    writer.flush()?;
    writer.into_inner()?;

    info!(
        rows = df.height(),
        columns = df.width(),
        codec = opts.compression.as_str(),
        "wrote avro"
    );
    Ok(())
}

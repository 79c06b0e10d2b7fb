//! Error types for reading and writing Avro files

use std::io;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors that can occur while mapping between Avro and Polars schemas
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Avro or Polars type with no counterpart on the other side
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
    /// Logical type that can only be read as its physical type
    #[error("Tried to parse logical type {0} without logical-type conversion")]
    LogicalTypeNotEnabled(String),
    /// Top-level schema is not a record and no single column name was given
    #[error("Top-level schema must be a record schema: {0}")]
    NotARecord(String),
    /// Named type that references itself
    #[error("Recursive type is not supported: {0}")]
    RecursiveType(String),
    /// Sources whose schemas differ
    #[error("Incompatible schemas: {0}")]
    IncompatibleSchemas(String),
    /// Selected column name not in the schema
    #[error("Column '{name}' not found in schema. Available columns: [{available}]")]
    ColumnNotFound {
        /// The requested name
        name: String,
        /// Comma separated list of columns in the schema
        available: String,
    },
    /// Selected column index not in the schema
    #[error("Column index {index} is out of range for a schema with {width} columns")]
    ColumnIndexOutOfRange {
        /// The requested index
        index: usize,
        /// Number of columns in the schema
        width: usize,
    },
    /// Schema rejected by the Avro library
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

/// Errors that can occur with data sources
#[derive(Debug, Error)]
pub enum SourceError {
    /// Path not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// File system error
    #[error("File system error: {0}")]
    FileSystemError(String),
    /// Glob pattern could not be compiled
    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidGlob {
        /// The offending pattern
        pattern: String,
        /// Why it was rejected
        message: String,
    },
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Top-level reader error type
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Source error
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Schema error
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Error raised by the Avro codec
    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    /// Error raised while building or transforming a DataFrame
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Value that does not fit the column type
    #[error("Decode error in column '{column}': {message}")]
    Decode {
        /// Column being decoded, empty for whole-record errors
        column: String,
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No sources left after glob expansion
    #[error("sources were empty")]
    EmptySources,

    /// Error tied to a specific source
    #[error("{source_name}: {error}")]
    InSource {
        /// Path of the source, or `buffer[i]` for in-memory sources
        source_name: String,
        /// The underlying error
        error: Box<ReaderError>,
    },
}

impl ReaderError {
    /// Attach the name of the source that caused this error.
    ///
    /// Errors that already carry a source name are returned unchanged.
    pub fn in_source(self, source_name: impl Into<String>) -> Self {
        match self {
            ReaderError::InSource { .. } => self,
            other => ReaderError::InSource {
                source_name: source_name.into(),
                error: Box::new(other),
            },
        }
    }

    /// The error without any source wrapping.
    pub fn root(&self) -> &ReaderError {
        match self {
            ReaderError::InSource { error, .. } => error.root(),
            other => other,
        }
    }
}

/// Errors that can occur while writing Avro files
#[derive(Debug, Error)]
pub enum WriterError {
    /// Schema error
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    /// Error raised by the Avro codec
    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),
    /// Error raised while reading the DataFrame
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Compression codec not available in the Avro library
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),
}

impl From<ReaderError> for PolarsError {
    fn from(err: ReaderError) -> Self {
        // Unwrapped polars errors keep their kind
        let err = match err {
            ReaderError::Polars(e) => return e,
            other => other,
        };
        let message = err.to_string();
        match err.root() {
            ReaderError::Polars(_) => PolarsError::ComputeError(message.into()),
            ReaderError::Schema(SchemaError::ColumnNotFound { .. }) => {
                PolarsError::ColumnNotFound(message.into())
            }
            ReaderError::Schema(SchemaError::ColumnIndexOutOfRange { .. }) => {
                PolarsError::OutOfBounds(message.into())
            }
            ReaderError::Schema(_) => PolarsError::SchemaMismatch(message.into()),
            ReaderError::Source(_) => PolarsError::IO {
                error: std::sync::Arc::new(io::Error::other(message)),
                msg: None,
            },
            _ => PolarsError::ComputeError(message.into()),
        }
    }
}

impl From<WriterError> for PolarsError {
    fn from(err: WriterError) -> Self {
        match err {
            WriterError::Polars(e) => e,
            WriterError::Schema(e) => PolarsError::SchemaMismatch(e.to_string().into()),
            other => PolarsError::ComputeError(other.to_string().into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polars_error_keeps_kind() {
        let err = ReaderError::Polars(PolarsError::Duplicate("a".into()));
        assert!(matches!(PolarsError::from(err), PolarsError::Duplicate(_)));

        let err = ReaderError::Polars(PolarsError::Duplicate("a".into())).in_source("x.avro");
        match PolarsError::from(err) {
            PolarsError::ComputeError(msg) => assert!(msg.to_string().contains("x.avro")),
            other => panic!("expected a compute error, got {other:?}"),
        }
    }

    #[test]
    fn test_in_source_wraps_once() {
        let err = ReaderError::EmptySources
            .in_source("a.avro")
            .in_source("b.avro");
        assert_eq!(err.to_string(), "a.avro: sources were empty");
        assert!(matches!(err.root(), ReaderError::EmptySources));
    }

    #[test]
    fn test_column_not_found_maps_to_polars_column_not_found() {
        let err = ReaderError::Schema(SchemaError::ColumnNotFound {
            name: "x".into(),
            available: "a, b".into(),
        })
        .in_source("data.avro");
        let polars_err = PolarsError::from(err);
        assert!(matches!(polars_err, PolarsError::ColumnNotFound(_)));
        assert!(polars_err.to_string().contains("data.avro"));
    }

    #[test]
    fn test_schema_error_maps_to_schema_mismatch() {
        let err = ReaderError::Schema(SchemaError::NotARecord("\"int\"".into()));
        assert!(matches!(
            PolarsError::from(err),
            PolarsError::SchemaMismatch(_)
        ));
    }

    #[test]
    fn test_source_error_maps_to_io() {
        let err = ReaderError::Source(SourceError::NotFound("missing.avro".into()));
        assert!(matches!(PolarsError::from(err), PolarsError::IO { .. }));
    }

    #[test]
    fn test_writer_polars_error_passes_through() {
        let err = WriterError::Polars(PolarsError::ComputeError("boom".into()));
        assert!(matches!(PolarsError::from(err), PolarsError::ComputeError(_)));
    }
}

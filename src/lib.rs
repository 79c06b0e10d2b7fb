//! Avro IO for Polars
//!
//! This library reads Avro object container files into Polars DataFrames,
//! either eagerly or as a lazy scan with projection, predicate and row limit
//! pushdown, and writes DataFrames back out as Avro.
//!
//! # Reading
//! ```no_run
//! use polars::prelude::*;
//! use polars_avro_io::{scan_avro, AvroOptions, ScanArgsAvro};
//!
//! # fn main() -> PolarsResult<()> {
//! let df = scan_avro("~/data/*.avro", ScanArgsAvro::default(), AvroOptions::default())?
//!     .select([col("id")])
//!     .collect()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Writing
//! ```no_run
//! use polars::prelude::*;
//! use polars_avro_io::{write_avro_file, AvroCompression, WriteOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let df = df! { "id" => [1i64, 2, 3] }?;
//! let opts = WriteOptions::default().with_compression(AvroCompression::Zstandard);
//! write_avro_file(&df, "out.avro", &opts)?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod convert;
pub mod error;
pub mod source;
pub mod write;

pub use api::{
    read_avro, read_avro_schema, scan_avro, AvroOptions, AvroScan, ColumnSelection, RowIndex,
    ScanArgsAvro,
};
pub use error::{ReaderError, SchemaError, SourceError, WriterError};
pub use source::{ScanSource, ScanSources};
pub use write::{write_avro, write_avro_file, AvroCompression, WriteOptions};

//! Public API for scanning and reading Avro files.
//!
//! The API follows Polars conventions: scan configuration lives in
//! `ScanArgsAvro`, format-specific settings in `AvroOptions`, and the entry
//! points return `LazyFrame`, `DataFrame` and `Schema` values.
//!
//! # Module Structure
//! - `args`: Scan arguments (`ScanArgsAvro`, `RowIndex`)
//! - `options`: Avro-specific reader options (`AvroOptions`)
//! - `columns`: Column selection and resolution
//! - `glob`: Glob pattern and `~` expansion
//! - `sources`: Source resolution and schema checks
//! - `batches`: Multi-source batch reader
//! - `row_index`: Row index tracking across batches
//! - `scan`: `AvroScan` IO plugin and `scan_avro`
//! - `read`: Eager `read_avro`
//! - `schema`: `read_avro_schema`

pub mod args;
pub mod batches;
pub mod columns;
pub mod glob;
pub mod options;
pub mod read;
pub mod row_index;
pub mod scan;
pub mod schema;
pub mod sources;

pub use args::{IdxSize, RowIndex, ScanArgsAvro};
pub use batches::AvroBatchReader;
pub use columns::{resolve_columns, ColumnSelection};
pub use glob::{expand_path, expand_sources, expand_user, is_glob_pattern};
pub use options::{AvroOptions, DEFAULT_BATCH_SIZE};
pub use read::read_avro;
pub use row_index::RowIndexTracker;
pub use scan::{scan_avro, AvroScan, BatchOptions};
pub use schema::read_avro_schema;
pub use sources::{open_reader, AvroReader, ResolvedSources};

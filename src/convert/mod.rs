//! Conversion between Avro and Polars
//!
//! - `dtype`: Avro schemas to Polars types
//! - `dataframe`: decoded Avro values to `DataFrame` batches
//! - `avro`: Polars schemas and frames to Avro schemas and values

mod avro;
mod dataframe;
mod dtype;

pub use avro::{frame_to_values, polars_to_avro_schema, series_to_values};
pub use dataframe::DataFrameBuilder;
pub use dtype::{physical_dtype, unwrap_nullable, DataTypeParser, ParsedSchema};

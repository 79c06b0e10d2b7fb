//! Eager reading of Avro files.
//!
//! `read_avro` is equivalent to `scan_avro` followed by a column selection,
//! a row index, a row limit and `collect`, but runs the batch loop directly so
//! that errors keep their `ReaderError` type and source names.

use std::sync::Arc;

use polars::prelude::*;
use tracing::info;

use crate::error::ReaderError;
use crate::source::ScanSources;

use super::args::ScanArgsAvro;
use super::columns::{resolve_columns, ColumnSelection};
use super::options::AvroOptions;
use super::scan::{AvroScan, BatchOptions};

/// Read Avro sources into a DataFrame.
///
/// # Arguments
/// * `sources` - Paths (may contain `~` and glob patterns) or in-memory buffers
/// * `columns` - Optional column selection (by name or index)
/// * `args` - Scan arguments (n_rows, row_index, glob, rechunk, single_col_name)
/// * `opts` - Avro-specific options (batch_size, convert_logical_types)
///
/// # Errors
/// This function returns `ReaderError` (not `PolarsError`) to preserve error
/// context such as the name of the failing source. Callers can convert to
/// `PolarsError` using `.into()` if needed.
///
/// # Example
/// ```no_run
/// use polars_avro_io::api::{read_avro, AvroOptions, ColumnSelection, ScanArgsAvro};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Read all columns
/// let df = read_avro("data.avro", None, ScanArgsAvro::default(), AvroOptions::default())?;
///
/// // Read specific columns by name
/// let columns = ColumnSelection::from_names(["id", "name"]);
/// let df = read_avro("data.avro", Some(columns), ScanArgsAvro::default(), AvroOptions::default())?;
/// # Ok(())
/// # }
/// ```
pub fn read_avro(
    sources: impl Into<ScanSources>,
    columns: Option<ColumnSelection>,
    args: ScanArgsAvro,
    opts: AvroOptions,
) -> Result<DataFrame, ReaderError> {
    let scan = AvroScan::new(&sources.into(), &args, &opts)?;

    let with_columns = columns
        .map(|selection| resolve_columns(&selection, scan.schema()))
        .transpose()?
        .map(|names| names.iter().map(|n| PlSmallStr::from(n.as_ref())).collect::<Arc<[_]>>());

    let batch_opts = BatchOptions {
        predicate: None,
        with_columns,
        n_rows: args.n_rows,
        row_index: args.row_index.clone(),
    };
    let mut df = scan.read(&batch_opts)?;

    if args.rechunk {
        let columns = df
            .get_columns()
            .iter()
            .map(|column| column.as_materialized_series().rechunk().into_column())
            .collect();
        df = DataFrame::new(columns)?;
    }

    info!(
        sources = scan.sources().len(),
        rows = df.height(),
        columns = df.width(),
        "read avro"
    );

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RowIndex;
    use crate::error::SchemaError;
    use apache_avro::types::Value;
    use apache_avro::{Schema as AvroSchema, Writer};
    use bytes::Bytes;

    const SCHEMA: &str = r#"{
        "type": "record",
        "name": "R",
        "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "string"},
            {"name": "c", "type": "double"}
        ]
    }"#;

    fn source(rows: i32) -> Bytes {
        let schema = AvroSchema::parse_str(SCHEMA).unwrap();
        let mut writer = Writer::new(&schema, Vec::new());
        for i in 0..rows {
            writer
                .append(Value::Record(vec![
                    ("a".to_string(), Value::Int(i)),
                    ("b".to_string(), Value::String(i.to_string())),
                    ("c".to_string(), Value::Double(f64::from(i) / 2.0)),
                ]))
                .unwrap();
        }
        Bytes::from(writer.into_inner().unwrap())
    }

    #[test]
    fn test_select_by_name_and_index() {
        let by_name = read_avro(
            source(3),
            Some(ColumnSelection::from_names(["c", "a"])),
            ScanArgsAvro::default(),
            AvroOptions::default(),
        )
        .unwrap();
        assert_eq!(by_name.get_column_names(), vec!["c", "a"]);

        let by_index = read_avro(
            source(3),
            Some(ColumnSelection::from_indices([1])),
            ScanArgsAvro::default(),
            AvroOptions::default(),
        )
        .unwrap();
        assert_eq!(by_index.get_column_names(), vec!["b"]);
    }

    #[test]
    fn test_invalid_selection() {
        let err = read_avro(
            source(1),
            Some(ColumnSelection::from_names(["missing"])),
            ScanArgsAvro::default(),
            AvroOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReaderError::Schema(SchemaError::ColumnNotFound { .. })
        ));

        let err = read_avro(
            source(1),
            Some(ColumnSelection::from_indices([3])),
            ScanArgsAvro::default(),
            AvroOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReaderError::Schema(SchemaError::ColumnIndexOutOfRange { index: 3, width: 3 })
        ));
    }

    #[test]
    fn test_row_index_then_limit() {
        let args = ScanArgsAvro::default()
            .with_row_index(RowIndex::with_offset("idx", 7))
            .with_n_rows(2)
            .with_rechunk(true);
        let df = read_avro(
            source(5),
            Some(ColumnSelection::from_names(["a"])),
            args,
            AvroOptions::default().with_batch_size(1),
        )
        .unwrap();

        assert_eq!(df.get_column_names(), vec!["idx", "a"]);
        let idx: Vec<u32> = df
            .column("idx")
            .unwrap()
            .u32()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(idx, vec![7, 8]);
        let a = df.column("a").unwrap().as_materialized_series();
        assert_eq!(a.n_chunks(), 1);
    }
}

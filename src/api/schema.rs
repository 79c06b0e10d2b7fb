//! Schema reading for Avro files.
//!
//! `read_avro_schema` returns the Polars schema of a set of sources by
//! reading only the header of the first one.

use polars::prelude::*;

use crate::source::ScanSources;

use super::args::ScanArgsAvro;
use super::options::AvroOptions;
use super::sources::ResolvedSources;

/// Read the Polars schema of Avro sources without reading any records.
///
/// Only `glob` and `single_col_name` from `args`, and
/// `convert_logical_types` from `opts`, affect the result.
///
/// # Example
/// ```no_run
/// use polars_avro_io::api::{read_avro_schema, AvroOptions, ScanArgsAvro};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let schema = read_avro_schema("data.avro", &ScanArgsAvro::default(), &AvroOptions::default())?;
/// println!("Columns: {:?}", schema.iter_names().collect::<Vec<_>>());
/// # Ok(())
/// # }
/// ```
pub fn read_avro_schema(
    sources: impl Into<ScanSources>,
    args: &ScanArgsAvro,
    opts: &AvroOptions,
) -> PolarsResult<Schema> {
    let resolved = ResolvedSources::resolve(&sources.into(), args, opts)?;
    Ok(resolved.schema.schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro::{Schema as AvroSchema, Writer};
    use bytes::Bytes;

    fn empty_file(schema: &str) -> Bytes {
        let schema = AvroSchema::parse_str(schema).unwrap();
        let writer = Writer::new(&schema, Vec::new());
        Bytes::from(writer.into_inner().unwrap())
    }

    #[test]
    fn test_schema_of_record() {
        let source = empty_file(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "ts", "type": {"type": "long", "logicalType": "timestamp-micros"}},
                {"name": "tags", "type": {"type": "array", "items": "string"}}
            ]}"#,
        );
        let schema =
            read_avro_schema(source, &ScanArgsAvro::default(), &AvroOptions::default()).unwrap();
        assert_eq!(
            schema.get("ts"),
            Some(&DataType::Datetime(TimeUnit::Microseconds, Some(TimeZone::UTC)))
        );
        assert_eq!(
            schema.get("tags"),
            Some(&DataType::List(Box::new(DataType::String)))
        );
    }

    #[test]
    fn test_schema_of_non_record() {
        let args = ScanArgsAvro::default();
        let result = read_avro_schema(empty_file(r#""string""#), &args, &AvroOptions::default());
        assert!(matches!(result, Err(PolarsError::SchemaMismatch(_))));

        let args = args.with_single_col_name("value");
        let schema =
            read_avro_schema(empty_file(r#""string""#), &args, &AvroOptions::default()).unwrap();
        assert_eq!(schema.get("value"), Some(&DataType::String));
    }

    #[test]
    fn test_logical_type_conversion() {
        let source = empty_file(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "id", "type": {"type": "string", "logicalType": "uuid"}}
            ]}"#,
        );
        let opts = AvroOptions::default();
        assert!(read_avro_schema(source.clone(), &ScanArgsAvro::default(), &opts).is_err());

        let opts = opts.with_convert_logical_types(true);
        let schema = read_avro_schema(source, &ScanArgsAvro::default(), &opts).unwrap();
        assert_eq!(schema.get("id"), Some(&DataType::String));
    }
}

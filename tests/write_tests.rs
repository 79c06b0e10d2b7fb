//! Integration tests for writing Avro files.
//!
//! Frames are written with `write_avro()` / `write_avro_file()` and read back
//! with `read_avro()` or inspected with the Avro library directly.

use apache_avro::{Reader, Schema as AvroSchema};
use bytes::Bytes;
use polars::prelude::*;

use polars_avro_io::{
    read_avro, write_avro, write_avro_file, AvroCompression, AvroOptions, ScanArgsAvro,
    WriteOptions, WriterError,
};

fn write(df: &DataFrame, opts: &WriteOptions) -> Vec<u8> {
    let mut buf = Vec::new();
    write_avro(df, &mut buf, opts).expect("write should succeed");
    buf
}

fn read_back(buf: Vec<u8>, opts: AvroOptions) -> DataFrame {
    read_avro(Bytes::from(buf), None, ScanArgsAvro::default(), opts).expect("read should succeed")
}

fn round_trip(df: &DataFrame) -> DataFrame {
    read_back(write(df, &WriteOptions::default()), AvroOptions::default())
}

fn writer_schema(buf: &[u8]) -> AvroSchema {
    Reader::new(buf).unwrap().writer_schema().clone()
}

// =============================================================================
// Round trips
// =============================================================================

#[test]
fn test_round_trip_primitives() {
    let df = df! {
        "b" => [Some(true), None, Some(false)],
        "i" => [Some(1i32), Some(-2), None],
        "l" => [None, Some(i64::MAX), Some(i64::MIN)],
        "f" => [Some(1.5f32), None, Some(-0.25)],
        "d" => [Some(2.5f64), Some(f64::MAX), None],
        "s" => [Some("x"), None, Some("")],
    }
    .unwrap();

    let read = round_trip(&df);
    assert!(read.equals_missing(&df), "{read}");
}

#[test]
fn test_round_trip_binary() {
    let bytes = Series::new(
        "raw".into(),
        [Some(&b"ab"[..]), None, Some(&b""[..])],
    );
    let df = DataFrame::new(vec![bytes.into_column()]).unwrap();
    let read = round_trip(&df);
    assert!(read.equals_missing(&df));
}

#[test]
fn test_round_trip_temporal() {
    let date = Series::new("date".into(), [Some(0i32), Some(19_000), None])
        .cast(&DataType::Date)
        .unwrap();
    let utc = Series::new("utc".into(), [Some(1_000i64), None, Some(-5)])
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, Some(TimeZone::UTC)))
        .unwrap();
    let local = Series::new("local".into(), [Some(7i64), Some(8), Some(9)])
        .cast(&DataType::Datetime(TimeUnit::Nanoseconds, None))
        .unwrap();
    let df = DataFrame::new(vec![date.into(), utc.into(), local.into()]).unwrap();

    let read = round_trip(&df);
    assert_eq!(read.schema(), df.schema());
    assert!(read.equals_missing(&df));
}

#[test]
fn test_time_zone_reads_back_as_utc() {
    let ts = Series::new("ts".into(), [1i64, 2])
        .cast(&DataType::Datetime(
            TimeUnit::Microseconds,
            TimeZone::opt_try_new(Some("Europe/Amsterdam")).unwrap(),
        ))
        .unwrap();
    let df = DataFrame::new(vec![ts.into()]).unwrap();

    let read = round_trip(&df);
    let column = read.column("ts").unwrap();
    assert_eq!(
        column.dtype(),
        &DataType::Datetime(TimeUnit::Microseconds, Some(TimeZone::UTC))
    );
    let ticks: Vec<i64> = column
        .as_materialized_series()
        .to_physical_repr()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(ticks, vec![1, 2]);
}

#[test]
fn test_round_trip_enum() {
    let categories = FrozenCategories::new(["low", "mid", "high"]).unwrap();
    let level = Series::new("level".into(), [Some("high"), None, Some("low")])
        .cast(&DataType::from_frozen_categories(categories))
        .unwrap();
    let df = DataFrame::new(vec![level.into()]).unwrap();

    let buf = write(&df, &WriteOptions::default());
    let read = read_back(buf, AvroOptions::default());
    let column = read.column("level").unwrap();
    assert!(matches!(column.dtype(), DataType::Enum(_, _)));
    let values: Vec<Option<String>> = column
        .cast(&DataType::String)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    assert_eq!(
        values,
        vec![Some("high".to_string()), None, Some("low".to_string())]
    );
}

#[test]
fn test_round_trip_nested() {
    let tags = Series::new(
        "tags".into(),
        [
            Series::new("".into(), [Some("a"), None]),
            Series::new("".into(), Vec::<Option<&str>>::new()),
            Series::new("".into(), [Some("b")]),
        ],
    );
    let x = Series::new("x".into(), [Some(1i64), None, Some(3)]);
    let y = Series::new("y".into(), [Some("p"), Some("q"), None]);
    let point = StructChunked::from_series("point".into(), 3, [x, y].iter())
        .unwrap()
        .into_series();
    let df = DataFrame::new(vec![tags.into(), point.into()]).unwrap();

    let read = round_trip(&df);
    assert_eq!(read.schema(), df.schema());
    assert!(read.equals_missing(&df), "{read}");
}

#[test]
fn test_round_trip_across_write_chunks() {
    let n = polars_avro_io::write::WRITE_CHUNK_ROWS as i64 + 10;
    let df = df! { "n" => (0..n).collect::<Vec<_>>() }.unwrap();
    let read = round_trip(&df);
    assert_eq!(read.height(), df.height());
    assert!(read.equals(&df));
}

#[test]
fn test_every_codec_round_trips() {
    let df = df! {
        "id" => (0..500i64).collect::<Vec<_>>(),
        "text" => (0..500).map(|i| format!("row {i}")).collect::<Vec<_>>(),
    }
    .unwrap();

    for compression in [
        AvroCompression::Uncompressed,
        AvroCompression::Deflate,
        AvroCompression::Snappy,
        AvroCompression::Zstandard,
        AvroCompression::Bzip2,
        AvroCompression::Xz,
    ] {
        let opts = WriteOptions::default().with_compression(compression);
        let read = read_back(write(&df, &opts), AvroOptions::default().with_batch_size(128));
        assert!(read.equals(&df), "{compression:?}");
    }
}

// =============================================================================
// Write options
// =============================================================================

#[test]
fn test_record_name() {
    let df = df! { "a" => [1i32] }.unwrap();
    let buf = write(&df, &WriteOptions::default().with_record_name("Event"));
    let AvroSchema::Record(record) = writer_schema(&buf) else {
        panic!("expected a record schema");
    };
    assert_eq!(record.name.name, "Event");
}

#[test]
fn test_promote_ints() {
    let df = df! {
        "i8" => [-1i8, 2],
        "u16" => [0u16, 65_535],
        "u32" => [0u32, u32::MAX],
    }
    .unwrap();

    let read = round_trip(&df);
    assert_eq!(read.column("i8").unwrap().dtype(), &DataType::Int32);
    assert_eq!(read.column("u16").unwrap().dtype(), &DataType::Int32);
    assert_eq!(read.column("u32").unwrap().dtype(), &DataType::Int64);
    let big: Vec<i64> = read
        .column("u32")
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(big, vec![0, i64::from(u32::MAX)]);

    let mut buf = Vec::new();
    let result = write_avro(&df, &mut buf, &WriteOptions::default().with_promote_ints(false));
    assert!(matches!(result, Err(WriterError::Schema(_))));
}

#[test]
fn test_promote_array() {
    let list = Series::new(
        "xy".into(),
        [
            Series::new("".into(), [1i32, 2]),
            Series::new("".into(), [3i32, 4]),
        ],
    );
    let array = list
        .cast(&DataType::Array(Box::new(DataType::Int32), 2))
        .unwrap();
    let df = DataFrame::new(vec![array.into()]).unwrap();

    let read = round_trip(&df);
    assert_eq!(
        read.column("xy").unwrap().dtype(),
        &DataType::List(Box::new(DataType::Int32))
    );
    assert_eq!(read.height(), 2);

    let mut buf = Vec::new();
    let result = write_avro(&df, &mut buf, &WriteOptions::default().with_promote_array(false));
    assert!(matches!(result, Err(WriterError::Schema(_))));
}

#[test]
fn test_truncate_time() {
    // 01:00:00.000001500
    let time = Series::new("t".into(), [3_600_000_001_500i64])
        .cast(&DataType::Time)
        .unwrap();
    let df = DataFrame::new(vec![time.into()]).unwrap();

    let mut buf = Vec::new();
    let result = write_avro(&df, &mut buf, &WriteOptions::default());
    assert!(matches!(result, Err(WriterError::Schema(_))));

    let buf = write(&df, &WriteOptions::default().with_truncate_time(true));
    let read = read_back(buf, AvroOptions::default().with_convert_logical_types(true));
    let micros: Vec<i64> = read
        .column("t")
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(micros, vec![3_600_000_001]);
}

#[test]
fn test_invalid_column_name_is_rejected() {
    let df = df! { "not valid" => [1i64] }.unwrap();
    let mut buf = Vec::new();
    let result = write_avro(&df, &mut buf, &WriteOptions::default());
    assert!(matches!(result, Err(WriterError::Schema(_))));
    assert!(buf.is_empty());
}

#[test]
fn test_write_avro_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.avro");
    let df = df! { "a" => [Some("x"), None] }.unwrap();

    write_avro_file(&df, &path, &WriteOptions::default()).unwrap();
    // Overwrites an existing file.
    write_avro_file(&df, &path, &WriteOptions::default()).unwrap();

    let read = read_avro(&*path, None, ScanArgsAvro::default(), AvroOptions::default()).unwrap();
    assert!(read.equals_missing(&df));
}

#[test]
fn test_write_avro_file_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.avro");
    let df = df! { "a" => [1i64] }.unwrap();
    let result = write_avro_file(&df, &path, &WriteOptions::default());
    assert!(matches!(result, Err(WriterError::Io(_))));
}

#[test]
fn test_write_avro_file_keeps_existing_file_on_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.avro");
    let good = df! { "a" => [1i64, 2, 3] }.unwrap();
    write_avro_file(&good, &path, &WriteOptions::default()).unwrap();

    let unwritable = df! { "x" => [1u64] }.unwrap();
    let result = write_avro_file(&unwritable, &path, &WriteOptions::default());
    assert!(matches!(result, Err(WriterError::Schema(_))));

    let read = read_avro(&*path, None, ScanArgsAvro::default(), AvroOptions::default()).unwrap();
    assert_eq!(read.height(), 3);
    assert!(read.equals(&good));
}

//! Property-based tests for reading and writing.
//!
//! These tests use proptest to check properties that must hold for any
//! frame: written data reads back unchanged, and neither the batch size nor
//! the way rows are split across sources changes the result.

use bytes::Bytes;
use polars::prelude::*;
use proptest::prelude::*;

use polars_avro_io::{
    read_avro, write_avro, AvroCompression, AvroOptions, ScanArgsAvro, ScanSources, WriteOptions,
};

// ============================================================================
// Generators
// ============================================================================

/// Rows of an `(id, name, score)` frame, with nulls in the last two columns.
fn arb_rows() -> impl Strategy<Value = Vec<(i64, Option<String>, Option<f64>)>> {
    prop::collection::vec(
        (
            any::<i64>(),
            prop::option::of("[a-z]{0,8}"),
            prop::option::of(-1e6f64..1e6),
        ),
        0..200,
    )
}

fn arb_compression() -> impl Strategy<Value = AvroCompression> {
    prop_oneof![
        Just(AvroCompression::Uncompressed),
        Just(AvroCompression::Deflate),
        Just(AvroCompression::Snappy),
        Just(AvroCompression::Zstandard),
    ]
}

fn frame(rows: &[(i64, Option<String>, Option<f64>)]) -> DataFrame {
    let ids: Vec<i64> = rows.iter().map(|r| r.0).collect();
    let names: Vec<Option<&str>> = rows.iter().map(|r| r.1.as_deref()).collect();
    let scores: Vec<Option<f64>> = rows.iter().map(|r| r.2).collect();
    df! {
        "id" => ids,
        "name" => names,
        "score" => scores,
    }
    .unwrap()
}

fn encode(df: &DataFrame, compression: AvroCompression) -> Bytes {
    let mut buf = Vec::new();
    write_avro(
        df,
        &mut buf,
        &WriteOptions::default().with_compression(compression),
    )
    .unwrap();
    Bytes::from(buf)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Writing a frame and reading it back yields the same frame.
    #[test]
    fn prop_write_then_read_is_identity(
        rows in arb_rows(),
        compression in arb_compression(),
    ) {
        let df = frame(&rows);
        let read = read_avro(
            encode(&df, compression),
            None,
            ScanArgsAvro::default(),
            AvroOptions::default(),
        )
        .unwrap();
        prop_assert!(read.equals_missing(&df));
    }

    /// The batch size only changes how rows are chunked, never which rows
    /// are read.
    #[test]
    fn prop_batch_size_does_not_change_result(
        rows in arb_rows(),
        batch_size in 1usize..64,
    ) {
        let df = frame(&rows);
        let source = encode(&df, AvroCompression::Uncompressed);
        let read = read_avro(
            source,
            None,
            ScanArgsAvro::default().with_rechunk(true),
            AvroOptions::default().with_batch_size(batch_size),
        )
        .unwrap();
        prop_assert!(read.equals_missing(&df));
    }

    /// Splitting rows across sources gives the same frame as one source, and
    /// `n_rows` takes a prefix of it.
    #[test]
    fn prop_sources_concatenate_in_order(
        rows in arb_rows(),
        splits in prop::collection::vec(0usize..200, 0..4),
        batch_size in 1usize..32,
        n_rows in 0usize..250,
    ) {
        let df = frame(&rows);
        let mut cuts: Vec<usize> = splits.into_iter().map(|s| s.min(rows.len())).collect();
        cuts.push(0);
        cuts.push(rows.len());
        cuts.sort_unstable();

        let parts: Vec<Bytes> = cuts
            .windows(2)
            .map(|w| encode(&df.slice(w[0] as i64, w[1] - w[0]), AvroCompression::Snappy))
            .collect();

        let read = read_avro(
            ScanSources::new(parts.clone()),
            None,
            ScanArgsAvro::default(),
            AvroOptions::default().with_batch_size(batch_size),
        )
        .unwrap();
        prop_assert!(read.equals_missing(&df));

        let head = read_avro(
            ScanSources::new(parts),
            None,
            ScanArgsAvro::default().with_n_rows(n_rows),
            AvroOptions::default().with_batch_size(batch_size),
        )
        .unwrap();
        prop_assert!(head.equals_missing(&df.head(Some(n_rows))));
    }
}

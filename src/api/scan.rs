//! Lazy scanning of Avro files.
//!
//! `AvroScan` implements Polars' `AnonymousScan`, the Rust side of the IO
//! plugin interface. `scan_avro` resolves the sources and schema up front and
//! registers the scan with `LazyFrame::anonymous_scan`. Polars then pushes
//! projections, predicates and row limits down into
//! [`AnonymousScan::scan`], which reads batches and applies them to each one.

use std::any::Any;
use std::sync::Arc;

use polars::prelude::*;
use tracing::debug;

use crate::error::ReaderError;
use crate::source::ScanSources;

use super::args::{RowIndex, ScanArgsAvro};
use super::batches::AvroBatchReader;
use super::options::AvroOptions;
use super::row_index::RowIndexTracker;
use super::sources::ResolvedSources;

/// What to apply to every batch of a read.
#[derive(Clone, Debug, Default)]
pub struct BatchOptions {
    /// Rows not matching the predicate are dropped.
    pub predicate: Option<Expr>,
    /// Columns to keep, in output order.
    pub with_columns: Option<Arc<[PlSmallStr]>>,
    /// Maximum number of rows across all batches.
    pub n_rows: Option<usize>,
    /// Row index to prepend, counted after filtering.
    pub row_index: Option<RowIndex>,
}

/// An Avro scan over a fixed set of resolved sources.
///
/// The scan can be executed any number of times; each execution re-opens
/// the sources.
#[derive(Debug, Clone)]
pub struct AvroScan {
    /// Resolved sources and schema.
    sources: Arc<ResolvedSources>,
    /// Output schema of a full read.
    schema: SchemaRef,
    /// Rows per batch.
    batch_size: usize,
}

impl AvroScan {
    /// Resolve `sources` and read the schema of the first one.
    pub fn new(
        sources: &ScanSources,
        args: &ScanArgsAvro,
        opts: &AvroOptions,
    ) -> Result<Self, ReaderError> {
        let resolved = ResolvedSources::resolve(sources, args, opts)?;
        Ok(Self::from_resolved(resolved, opts))
    }

    /// Create a scan from already resolved sources.
    pub fn from_resolved(resolved: ResolvedSources, opts: &AvroOptions) -> Self {
        let schema = Arc::new(resolved.schema.schema.clone());
        Self {
            sources: Arc::new(resolved),
            schema,
            batch_size: opts.batch_size,
        }
    }

    /// The Polars schema of the sources.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The resolved sources.
    pub fn sources(&self) -> &ResolvedSources {
        &self.sources
    }

    /// A fresh reader over all batches.
    pub fn batches(&self) -> Result<AvroBatchReader, ReaderError> {
        AvroBatchReader::new(self.sources.clone(), self.batch_size)
    }

    /// Read every source into one DataFrame, applying `opts` to each batch.
    ///
    /// Reading stops as soon as `opts.n_rows` rows have been produced.
    pub fn read(&self, opts: &BatchOptions) -> Result<DataFrame, ReaderError> {
        let mut remaining = opts.n_rows;
        let mut row_index = opts.row_index.as_ref().map(RowIndexTracker::from);
        let mut frames = Vec::new();

        if remaining != Some(0) {
            for batch in self.batches()? {
                let df = apply_batch_options(batch?, opts, &mut remaining, row_index.as_mut())?;
                frames.push(df);
                if remaining == Some(0) {
                    break;
                }
            }
        }

        if frames.is_empty() {
            let empty = DataFrame::empty_with_schema(&self.schema);
            return apply_batch_options(empty, opts, &mut remaining, row_index.as_mut());
        }

        debug!(batches = frames.len(), "collected avro scan");

        let mut result = frames.remove(0);
        for df in frames {
            result.vstack_mut(&df)?;
        }
        Ok(result)
    }
}

fn apply_batch_options(
    mut df: DataFrame,
    opts: &BatchOptions,
    remaining: &mut Option<usize>,
    row_index: Option<&mut RowIndexTracker>,
) -> Result<DataFrame, ReaderError> {
    if let Some(predicate) = &opts.predicate {
        df = df.lazy().filter(predicate.clone()).collect()?;
    }
    if let Some(columns) = &opts.with_columns {
        df = df.select(columns.iter().cloned())?;
    }
    if let Some(n) = remaining.as_mut() {
        if df.height() > *n {
            df = df.head(Some(*n));
        }
        *n -= df.height();
    }
    if let Some(tracker) = row_index {
        df = tracker.add_to_dataframe(df)?;
    }
    Ok(df)
}

impl AnonymousScan for AvroScan {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn scan(&self, scan_opts: AnonymousScanArgs) -> PolarsResult<DataFrame> {
        let opts = BatchOptions {
            predicate: scan_opts.predicate,
            with_columns: scan_opts.with_columns,
            n_rows: scan_opts.n_rows,
            row_index: None,
        };
        Ok(self.read(&opts)?)
    }

    fn schema(&self, _infer_schema_length: Option<usize>) -> PolarsResult<SchemaRef> {
        Ok(self.schema.clone())
    }

    fn allows_predicate_pushdown(&self) -> bool {
        true
    }

    fn allows_projection_pushdown(&self) -> bool {
        true
    }

    fn allows_slice_pushdown(&self) -> bool {
        true
    }
}

/// Scan Avro sources into a `LazyFrame`.
///
/// Sources are expanded and the schema of the first one is read
/// immediately, so missing files and unsupported schemas fail here rather
/// than at collect time. Records are only read when the frame is collected.
///
/// `args.row_index` and `args.n_rows` are applied to the returned frame, the
/// row index first.
///
/// # Example
/// ```no_run
/// use polars::prelude::*;
/// use polars_avro_io::api::{scan_avro, AvroOptions, ScanArgsAvro};
///
/// # fn main() -> PolarsResult<()> {
/// let df = scan_avro("data/*.avro", ScanArgsAvro::default(), AvroOptions::default())?
///     .filter(col("id").gt(lit(10)))
///     .select([col("id"), col("name")])
///     .collect()?;
/// # Ok(())
/// # }
/// ```
pub fn scan_avro(
    sources: impl Into<ScanSources>,
    args: ScanArgsAvro,
    opts: AvroOptions,
) -> PolarsResult<LazyFrame> {
    let scan = AvroScan::new(&sources.into(), &args, &opts)?;
    let schema = scan.schema().clone();

    let scan_args = ScanArgsAnonymous {
        schema: Some(schema),
        name: "avro",
        ..Default::default()
    };
    let mut lf = LazyFrame::anonymous_scan(Arc::new(scan), scan_args)?;

    if let Some(row_index) = &args.row_index {
        lf = lf.with_row_index(row_index.name.as_ref(), Some(row_index.offset));
    }
    if let Some(n_rows) = args.n_rows {
        lf = lf.limit(IdxSize::try_from(n_rows).unwrap_or(IdxSize::MAX));
    }

    Ok(lf)
}

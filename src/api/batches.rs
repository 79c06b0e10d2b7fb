//! Multi-source batch reader.
//!
//! `AvroBatchReader` reads records from all resolved sources in order as
//! one continuous stream and cuts it into DataFrames of at most
//! `batch_size` rows. A batch can contain rows from several sources.

use std::sync::Arc;

use polars::prelude::DataFrame;
use tracing::debug;

use crate::convert::DataFrameBuilder;
use crate::error::ReaderError;

use super::sources::{AvroReader, ResolvedSources};

/// Reads batches of records from a list of sources.
///
/// # Example
/// ```ignore
/// let reader = AvroBatchReader::new(resolved, 1024)?;
/// for batch in reader {
///     let df = batch?;
///     println!("{} rows", df.height());
/// }
/// ```
pub struct AvroBatchReader {
    /// Resolved sources and the canonical schema.
    sources: Arc<ResolvedSources>,
    /// Maximum rows per batch.
    batch_size: usize,
    /// Index of the next source to open.
    next_source: usize,
    /// Reader for the source currently being read, with its index.
    current: Option<(usize, AvroReader)>,
    /// Pending rows.
    builder: DataFrameBuilder,
    /// Total rows emitted so far.
    rows_read: usize,
    /// Set after the last batch or the first error.
    finished: bool,
}

impl AvroBatchReader {
    /// Create a reader over `sources`.
    ///
    /// No source is opened until the first batch is requested.
    ///
    /// # Errors
    /// `ReaderError::Configuration` if `batch_size` is zero.
    pub fn new(sources: Arc<ResolvedSources>, batch_size: usize) -> Result<Self, ReaderError> {
        if batch_size == 0 {
            return Err(ReaderError::Configuration(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        let builder = DataFrameBuilder::new(&sources.schema);
        Ok(Self {
            sources,
            batch_size,
            next_source: 0,
            current: None,
            builder,
            rows_read: 0,
            finished: false,
        })
    }

    /// Total rows emitted so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Read the next batch, or `None` once every source is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<DataFrame>, ReaderError> {
        if self.finished {
            return Ok(None);
        }

        self.builder.reserve(self.batch_size);
        while self.builder.len() < self.batch_size {
            let Some((index, value)) = self.next_record()? else {
                break;
            };
            self.builder
                .push(value)
                .map_err(|e| e.in_source(self.sources.sources.display_name(index)))?;
        }

        if self.builder.is_empty() {
            self.finished = true;
            return Ok(None);
        }

        let df = self.builder.finish()?;
        self.rows_read += df.height();
        debug!(
            rows = df.height(),
            total = self.rows_read,
            "emitted avro batch"
        );
        Ok(Some(df))
    }

    /// The next record and the index of the source it came from.
    fn next_record(&mut self) -> Result<Option<(usize, apache_avro::types::Value)>, ReaderError> {
        loop {
            if let Some((index, reader)) = self.current.as_mut() {
                let index = *index;
                match reader.next() {
                    Some(Ok(value)) => return Ok(Some((index, value))),
                    Some(Err(e)) => {
                        return Err(ReaderError::from(e)
                            .in_source(self.sources.sources.display_name(index)))
                    }
                    None => {
                        debug!(source = %self.sources.sources.display_name(index), "finished avro source");
                        self.current = None;
                    }
                }
            }

            if self.next_source >= self.sources.len() {
                return Ok(None);
            }
            let index = self.next_source;
            self.next_source += 1;
            self.current = Some((index, self.sources.open(index)?));
        }
    }
}

impl Iterator for AvroBatchReader {
    type Item = Result<DataFrame, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_batch() {
            Ok(Some(df)) => Some(Ok(df)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

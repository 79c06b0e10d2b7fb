//! Row index tracking across batches.
//!
//! `RowIndexTracker` numbers rows continuously over every batch of a read,
//! and therefore across source boundaries.

use std::sync::Arc;

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, PlSmallStr, Series};

use crate::error::ReaderError;

use super::args::{IdxSize, RowIndex};

/// Adds a `UInt32` row index as the first column of each batch.
#[derive(Debug, Clone)]
pub struct RowIndexTracker {
    /// Name of the row index column.
    name: Arc<str>,
    /// Index of the next row.
    next: IdxSize,
}

impl RowIndexTracker {
    /// Create a tracker whose first row gets index `offset`.
    pub fn new(name: impl Into<Arc<str>>, offset: IdxSize) -> Self {
        Self {
            name: name.into(),
            next: offset,
        }
    }

    /// Index the next row will get.
    pub fn next_index(&self) -> IdxSize {
        self.next
    }

    /// Prepend the row index column to `df`.
    ///
    /// # Errors
    /// `ReaderError::Configuration` if the index would overflow `IdxSize`;
    /// Polars errors if `df` already has a column with the same name.
    pub fn add_to_dataframe(&mut self, df: DataFrame) -> Result<DataFrame, ReaderError> {
        let height = IdxSize::try_from(df.height()).ok();
        let end = height.and_then(|h| self.next.checked_add(h)).ok_or_else(|| {
            ReaderError::Configuration(format!(
                "row index '{}' overflows at offset {}",
                self.name, self.next
            ))
        })?;

        let indices: Vec<IdxSize> = (self.next..end).collect();
        self.next = end;

        let index = Series::new(PlSmallStr::from(self.name.as_ref()), indices);
        let mut columns: Vec<Column> = Vec::with_capacity(df.width() + 1);
        columns.push(index.into_column());
        columns.extend(df.get_columns().iter().cloned());

        Ok(DataFrame::new(columns)?)
    }
}

impl From<&RowIndex> for RowIndexTracker {
    fn from(row_index: &RowIndex) -> Self {
        Self::new(row_index.name.clone(), row_index.offset)
    }
}

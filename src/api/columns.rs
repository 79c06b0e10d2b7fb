//! Column selection and resolution.
//!
//! Columns can be selected by name or by 0-based index. Both are resolved
//! against the Polars schema of the sources before any data is read, so an
//! invalid selection fails without touching the records.

use std::collections::HashMap;
use std::sync::Arc;

use polars::prelude::Schema;

use crate::error::SchemaError;

/// Column selection by name or index.
///
/// # Example
/// ```
/// use polars_avro_io::api::ColumnSelection;
///
/// let by_name = ColumnSelection::Names(vec!["id".into(), "name".into()]);
/// let by_index = ColumnSelection::Indices(vec![0, 2, 5]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnSelection {
    /// Select columns by name.
    Names(Vec<Arc<str>>),
    /// Select columns by 0-based index.
    Indices(Vec<usize>),
}

impl ColumnSelection {
    /// Create a column selection from names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    /// Create a column selection from indices.
    pub fn from_indices<I>(indices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        Self::Indices(indices.into_iter().collect())
    }

    /// Check if the selection is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Names(names) => names.is_empty(),
            Self::Indices(indices) => indices.is_empty(),
        }
    }

    /// Get the number of columns selected.
    pub fn len(&self) -> usize {
        match self {
            Self::Names(names) => names.len(),
            Self::Indices(indices) => indices.len(),
        }
    }
}

impl From<Vec<&str>> for ColumnSelection {
    fn from(names: Vec<&str>) -> Self {
        Self::from_names(names)
    }
}

impl From<Vec<String>> for ColumnSelection {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<Vec<usize>> for ColumnSelection {
    fn from(indices: Vec<usize>) -> Self {
        Self::Indices(indices)
    }
}

/// Resolve a column selection to column names, in selection order.
///
/// # Errors
/// - `SchemaError::ColumnNotFound` if a name isn't in the schema
/// - `SchemaError::ColumnIndexOutOfRange` if an index is past the last column
pub fn resolve_columns(
    selection: &ColumnSelection,
    schema: &Schema,
) -> Result<Vec<Arc<str>>, SchemaError> {
    match selection {
        ColumnSelection::Names(names) => resolve_by_names(names, schema),
        ColumnSelection::Indices(indices) => resolve_by_indices(indices, schema),
    }
}

fn resolve_by_names(names: &[Arc<str>], schema: &Schema) -> Result<Vec<Arc<str>>, SchemaError> {
    let known: HashMap<&str, usize> = schema
        .iter_names()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    names
        .iter()
        .map(|name| {
            if known.contains_key(name.as_ref()) {
                Ok(name.clone())
            } else {
                let available: Vec<&str> = schema.iter_names().map(|n| n.as_str()).collect();
                Err(SchemaError::ColumnNotFound {
                    name: name.to_string(),
                    available: available.join(", "),
                })
            }
        })
        .collect()
}

fn resolve_by_indices(indices: &[usize], schema: &Schema) -> Result<Vec<Arc<str>>, SchemaError> {
    indices
        .iter()
        .map(|&index| {
            schema
                .get_at_index(index)
                .map(|(name, _)| Arc::from(name.as_str()))
                .ok_or(SchemaError::ColumnIndexOutOfRange {
                    index,
                    width: schema.len(),
                })
        })
        .collect()
}

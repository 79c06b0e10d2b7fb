//! DataFrameBuilder for converting decoded Avro records to Polars DataFrames.
//!
//! Records decoded by the Avro library are split into one buffer per column.
//! Columns of a primitive physical type (see [`physical_dtype`]) collect
//! typed values directly; lists, structs and null columns collect
//! `AnyValue`s. Each column is cast to its logical type when the batch is
//! finished.

use std::mem;

use apache_avro::types::Value;
use polars::prelude::*;

use crate::error::ReaderError;

use super::dtype::{physical_dtype, ParsedSchema};

/// Builds Polars DataFrames from decoded Avro records.
///
/// # Example
/// ```ignore
/// let mut builder = DataFrameBuilder::new(&parsed);
/// for value in reader {
///     builder.push(value?)?;
/// }
/// let df = builder.finish()?;
/// ```
pub struct DataFrameBuilder {
    /// Output schema with logical types.
    schema: Schema,
    /// Column names and the types values are collected as.
    physical: Vec<(PlSmallStr, DataType)>,
    /// Wrap each value into the single column instead of reading a record.
    singleton: bool,
    /// Pending values per column.
    columns: Vec<ColumnBuilder>,
    /// Number of pending rows.
    rows: usize,
}

impl DataFrameBuilder {
    /// Create a builder for the given parsed schema.
    pub fn new(parsed: &ParsedSchema) -> Self {
        let physical: Vec<(PlSmallStr, DataType)> = parsed
            .schema
            .iter()
            .map(|(name, dtype)| (name.clone(), physical_dtype(dtype)))
            .collect();
        let columns = physical
            .iter()
            .map(|(_, dtype)| ColumnBuilder::new(dtype))
            .collect();
        Self {
            schema: parsed.schema.clone(),
            physical,
            singleton: parsed.singleton,
            columns,
            rows: 0,
        }
    }

    /// Reserve space for `additional` more rows.
    pub fn reserve(&mut self, additional: usize) {
        for column in &mut self.columns {
            column.reserve(additional);
        }
    }

    /// Add one decoded value.
    ///
    /// # Errors
    /// `ReaderError::Decode` if the value doesn't match the schema.
    pub fn push(&mut self, value: Value) -> Result<(), ReaderError> {
        if self.singleton {
            let (name, dtype) = &self.physical[0];
            let cell = to_cell(value, dtype, name)?;
            self.columns[0].push(cell);
            self.rows += 1;
            return Ok(());
        }

        let fields = match unwrap_union(value) {
            Value::Record(fields) => fields,
            other => {
                return Err(ReaderError::Decode {
                    column: String::new(),
                    message: format!("expected a record, found {:?}", other),
                })
            }
        };

        if fields.len() != self.physical.len() {
            return Err(ReaderError::Decode {
                column: String::new(),
                message: format!(
                    "record has {} fields but the schema has {} columns",
                    fields.len(),
                    self.physical.len()
                ),
            });
        }

        // Convert the whole row first so a bad value leaves no partial row behind
        let row = fields
            .into_iter()
            .zip(&self.physical)
            .map(|((_, value), (name, dtype))| to_cell(value, dtype, name))
            .collect::<Result<Vec<_>, _>>()?;

        for (column, cell) in self.columns.iter_mut().zip(row) {
            column.push(cell);
        }
        self.rows += 1;

        Ok(())
    }

    /// Number of rows added since the last [`finish`](Self::finish).
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether no rows are pending.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Build a DataFrame from the pending rows and reset the builder.
    pub fn finish(&mut self) -> Result<DataFrame, ReaderError> {
        let mut columns = Vec::with_capacity(self.physical.len());

        for ((name, physical), builder) in self.physical.iter().zip(self.columns.iter_mut()) {
            let logical = self.schema.get(name).unwrap_or(physical);
            let series = builder.finish(name.clone(), physical)?;
            let series = if logical == physical {
                series
            } else {
                series.cast(logical)?
            };
            columns.push(series.into_column());
        }

        self.rows = 0;

        if columns.is_empty() {
            return Ok(DataFrame::empty_with_schema(&self.schema));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// The output schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// One converted value, typed by the physical dtype of its column.
enum Cell {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Binary(Vec<u8>),
    /// List and struct values.
    Nested(AnyValue<'static>),
}

impl Cell {
    fn into_any_value(self) -> AnyValue<'static> {
        match self {
            Cell::Null => AnyValue::Null,
            Cell::Boolean(v) => AnyValue::Boolean(v),
            Cell::Int32(v) => AnyValue::Int32(v),
            Cell::Int64(v) => AnyValue::Int64(v),
            Cell::Float32(v) => AnyValue::Float32(v),
            Cell::Float64(v) => AnyValue::Float64(v),
            Cell::String(v) => AnyValue::StringOwned(v.into()),
            Cell::Binary(v) => AnyValue::BinaryOwned(v),
            Cell::Nested(v) => v,
        }
    }
}

/// Pending values of one column.
enum ColumnBuilder {
    Boolean(Vec<Option<bool>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Binary(Vec<Option<Vec<u8>>>),
    /// Lists, structs and null columns.
    Values(Vec<AnyValue<'static>>),
}

impl ColumnBuilder {
    fn new(physical: &DataType) -> Self {
        match physical {
            DataType::Boolean => ColumnBuilder::Boolean(Vec::new()),
            DataType::Int32 => ColumnBuilder::Int32(Vec::new()),
            DataType::Int64 => ColumnBuilder::Int64(Vec::new()),
            DataType::Float32 => ColumnBuilder::Float32(Vec::new()),
            DataType::Float64 => ColumnBuilder::Float64(Vec::new()),
            DataType::String => ColumnBuilder::String(Vec::new()),
            DataType::Binary => ColumnBuilder::Binary(Vec::new()),
            _ => ColumnBuilder::Values(Vec::new()),
        }
    }

    fn reserve(&mut self, additional: usize) {
        match self {
            ColumnBuilder::Boolean(v) => v.reserve(additional),
            ColumnBuilder::Int32(v) => v.reserve(additional),
            ColumnBuilder::Int64(v) => v.reserve(additional),
            ColumnBuilder::Float32(v) => v.reserve(additional),
            ColumnBuilder::Float64(v) => v.reserve(additional),
            ColumnBuilder::String(v) => v.reserve(additional),
            ColumnBuilder::Binary(v) => v.reserve(additional),
            ColumnBuilder::Values(v) => v.reserve(additional),
        }
    }

    /// Append a cell produced by [`to_cell`] for this column's dtype.
    fn push(&mut self, cell: Cell) {
        match (self, cell) {
            (ColumnBuilder::Values(v), cell) => v.push(cell.into_any_value()),
            (ColumnBuilder::Boolean(v), Cell::Boolean(x)) => v.push(Some(x)),
            (ColumnBuilder::Int32(v), Cell::Int32(x)) => v.push(Some(x)),
            (ColumnBuilder::Int64(v), Cell::Int64(x)) => v.push(Some(x)),
            (ColumnBuilder::Float32(v), Cell::Float32(x)) => v.push(Some(x)),
            (ColumnBuilder::Float64(v), Cell::Float64(x)) => v.push(Some(x)),
            (ColumnBuilder::String(v), Cell::String(x)) => v.push(Some(x)),
            (ColumnBuilder::Binary(v), Cell::Binary(x)) => v.push(Some(x)),
            // to_cell only yields cells of the column's dtype, or Null
            (builder, _) => builder.push_null(),
        }
    }

    fn push_null(&mut self) {
        match self {
            ColumnBuilder::Boolean(v) => v.push(None),
            ColumnBuilder::Int32(v) => v.push(None),
            ColumnBuilder::Int64(v) => v.push(None),
            ColumnBuilder::Float32(v) => v.push(None),
            ColumnBuilder::Float64(v) => v.push(None),
            ColumnBuilder::String(v) => v.push(None),
            ColumnBuilder::Binary(v) => v.push(None),
            ColumnBuilder::Values(v) => v.push(AnyValue::Null),
        }
    }

    /// Take the pending values as a series of the physical dtype.
    fn finish(&mut self, name: PlSmallStr, physical: &DataType) -> PolarsResult<Series> {
        let series = match self {
            ColumnBuilder::Boolean(v) => Series::new(name, mem::take(v)),
            ColumnBuilder::Int32(v) => Series::new(name, mem::take(v)),
            ColumnBuilder::Int64(v) => Series::new(name, mem::take(v)),
            ColumnBuilder::Float32(v) => Series::new(name, mem::take(v)),
            ColumnBuilder::Float64(v) => Series::new(name, mem::take(v)),
            ColumnBuilder::String(v) => Series::new(name, mem::take(v)),
            ColumnBuilder::Binary(v) => {
                let values = mem::take(v);
                let slices: Vec<Option<&[u8]>> = values.iter().map(|b| b.as_deref()).collect();
                Series::new(name, slices)
            }
            ColumnBuilder::Values(v) => {
                Series::from_any_values_and_dtype(name, &mem::take(v), physical, true)?
            }
        };
        Ok(series)
    }
}

fn unwrap_union(value: Value) -> Value {
    match value {
        Value::Union(_, inner) => unwrap_union(*inner),
        other => other,
    }
}

fn decode_error(column: &str, dtype: &DataType, value: &Value) -> ReaderError {
    ReaderError::Decode {
        column: column.to_string(),
        message: format!("cannot read {:?} as {}", value, dtype),
    }
}

/// Convert one Avro value to a cell of the physical type `dtype`.
fn to_cell(value: Value, dtype: &DataType, column: &str) -> Result<Cell, ReaderError> {
    let cell = match (unwrap_union(value), dtype) {
        (Value::Null, _) => Cell::Null,
        (Value::Boolean(v), DataType::Boolean) => Cell::Boolean(v),
        (Value::Int(v) | Value::Date(v) | Value::TimeMillis(v), DataType::Int32) => Cell::Int32(v),
        (
            Value::Long(v)
            | Value::TimeMicros(v)
            | Value::TimestampMillis(v)
            | Value::TimestampMicros(v)
            | Value::TimestampNanos(v)
            | Value::LocalTimestampMillis(v)
            | Value::LocalTimestampMicros(v)
            | Value::LocalTimestampNanos(v),
            DataType::Int64,
        ) => Cell::Int64(v),
        (Value::Float(v), DataType::Float32) => Cell::Float32(v),
        (Value::Double(v), DataType::Float64) => Cell::Float64(v),
        (Value::Bytes(v), DataType::Binary) => Cell::Binary(v),
        (Value::Decimal(decimal), DataType::Binary) => Cell::Binary(Vec::<u8>::try_from(&decimal)?),
        (Value::String(v), DataType::String) => Cell::String(v),
        (Value::Enum(_, symbol), DataType::String) => Cell::String(symbol),
        (Value::Uuid(uuid), DataType::String) => Cell::String(uuid.to_string()),
        (value @ (Value::Array(_) | Value::Record(_)), DataType::List(_) | DataType::Struct(_)) => {
            Cell::Nested(nested_value(value, dtype, column)?)
        }
        (other, dtype) => return Err(decode_error(column, dtype, &other)),
    };
    Ok(cell)
}

/// Convert an array or record value to a list or struct `AnyValue`.
fn nested_value(
    value: Value,
    dtype: &DataType,
    column: &str,
) -> Result<AnyValue<'static>, ReaderError> {
    let any = match (value, dtype) {
        (Value::Array(items), DataType::List(inner)) => {
            let values = items
                .into_iter()
                .map(|item| Ok(to_cell(item, inner, column)?.into_any_value()))
                .collect::<Result<Vec<_>, ReaderError>>()?;
            let series =
                Series::from_any_values_and_dtype(PlSmallStr::EMPTY, &values, inner, true)?;
            AnyValue::List(series)
        }
        (Value::Record(fields), DataType::Struct(struct_fields)) => {
            if fields.len() != struct_fields.len() {
                return Err(ReaderError::Decode {
                    column: column.to_string(),
                    message: format!(
                        "record has {} fields but the struct has {}",
                        fields.len(),
                        struct_fields.len()
                    ),
                });
            }
            let values = fields
                .into_iter()
                .zip(struct_fields)
                .map(|((_, value), field)| {
                    Ok(to_cell(value, field.dtype(), column)?.into_any_value())
                })
                .collect::<Result<Vec<_>, ReaderError>>()?;
            AnyValue::StructOwned(Box::new((values, struct_fields.clone())))
        }
        (other, dtype) => return Err(decode_error(column, dtype, &other)),
    };
    Ok(any)
}

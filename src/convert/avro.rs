//! Polars to Avro conversion for writing
//!
//! [`polars_to_avro_schema`] derives an Avro record schema from a Polars
//! schema and [`frame_to_values`] turns a DataFrame into Avro record values
//! following that schema. Columns are converted one at a time and the
//! resulting values are zipped into records.
//!
//! Every field except `Null` is written as the nullable union
//! `["null", T]`, including list items and struct fields.

use std::collections::{HashMap, HashSet};

use apache_avro::schema::UnionSchema;
use apache_avro::types::Value;
use apache_avro::Schema as AvroSchema;
use polars::prelude::*;
use serde_json::{json, Value as JsonValue};

use crate::error::{SchemaError, WriterError};
use crate::write::WriteOptions;

/// Derive the Avro schema written for a frame with schema `schema`.
///
/// # Errors
/// - `SchemaError::UnsupportedType` for dtypes with no Avro counterpart, or
///   whose promotion is disabled in `opts`
/// - `SchemaError::InvalidSchema` if the Avro library rejects the result,
///   e.g. for column names that are not valid Avro names
pub fn polars_to_avro_schema(
    schema: &Schema,
    opts: &WriteOptions,
) -> Result<AvroSchema, SchemaError> {
    let mut builder = SchemaBuilder {
        opts,
        names: HashSet::new(),
    };
    let json = builder.record(&opts.record_name, schema.iter_fields())?;
    AvroSchema::parse(&json).map_err(|e| SchemaError::InvalidSchema(e.to_string()))
}

struct SchemaBuilder<'a> {
    opts: &'a WriteOptions,
    /// Names already given to generated records and enums.
    names: HashSet<String>,
}

impl SchemaBuilder<'_> {
    fn record(
        &mut self,
        path: &str,
        fields: impl IntoIterator<Item = Field>,
    ) -> Result<JsonValue, SchemaError> {
        let name = self.unique_name(path);
        let fields = fields
            .into_iter()
            .map(|field| {
                let child = format!("{}_{}", name, field.name());
                Ok(json!({
                    "name": field.name().as_str(),
                    "type": self.field_type(field.dtype(), &child)?,
                }))
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;
        Ok(json!({"type": "record", "name": name, "fields": fields}))
    }

    fn field_type(&mut self, dtype: &DataType, path: &str) -> Result<JsonValue, SchemaError> {
        match dtype {
            DataType::Null => Ok(json!("null")),
            other => Ok(json!(["null", self.value_type(other, path)?])),
        }
    }

    fn value_type(&mut self, dtype: &DataType, path: &str) -> Result<JsonValue, SchemaError> {
        let promote_ints = self.opts.promote_ints;
        let json = match dtype {
            DataType::Boolean => json!("boolean"),
            DataType::Int32 => json!("int"),
            DataType::Int8 | DataType::Int16 | DataType::UInt8 | DataType::UInt16
                if promote_ints =>
            {
                json!("int")
            }
            DataType::Int64 => json!("long"),
            DataType::UInt32 if promote_ints => json!("long"),
            DataType::Float32 => json!("float"),
            DataType::Float64 => json!("double"),
            DataType::String | DataType::Categorical(..) => json!("string"),
            DataType::Binary => json!("bytes"),
            DataType::Enum(categories, _) => {
                let symbols: Vec<&str> = categories.categories().values_iter().collect();
                json!({"type": "enum", "name": self.unique_name(path), "symbols": symbols})
            }
            DataType::Date => json!({"type": "int", "logicalType": "date"}),
            DataType::Datetime(unit, tz) => {
                let prefix = if tz.is_some() { "" } else { "local-" };
                let suffix = match unit {
                    TimeUnit::Milliseconds => "millis",
                    TimeUnit::Microseconds => "micros",
                    TimeUnit::Nanoseconds => "nanos",
                };
                json!({"type": "long", "logicalType": format!("{prefix}timestamp-{suffix}")})
            }
            DataType::Time if self.opts.truncate_time => {
                json!({"type": "long", "logicalType": "time-micros"})
            }
            DataType::List(inner) => json!({"type": "array", "items": self.field_type(inner, path)?}),
            DataType::Array(inner, _) if self.opts.promote_array => {
                json!({"type": "array", "items": self.field_type(inner, path)?})
            }
            DataType::Struct(fields) => self.record(path, fields.iter().cloned())?,
            other => return Err(unsupported_dtype(other, self.opts)),
        };
        Ok(json)
    }

    /// A valid Avro name based on `path` that no other generated type uses.
    fn unique_name(&mut self, path: &str) -> String {
        let base = sanitize_name(path);
        let mut name = base.clone();
        let mut suffix = 1;
        while !self.names.insert(name.clone()) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        name
    }
}

fn unsupported_dtype(dtype: &DataType, opts: &WriteOptions) -> SchemaError {
    let hint = match dtype {
        DataType::Int8 | DataType::Int16 | DataType::UInt8 | DataType::UInt16 | DataType::UInt32
            if !opts.promote_ints =>
        {
            " (enable promote_ints to write it as a wider integer)"
        }
        DataType::Array(..) if !opts.promote_array => {
            " (enable promote_array to write it as a list)"
        }
        DataType::Time if !opts.truncate_time => {
            " (enable truncate_time to write it as time-micros)"
        }
        _ => "",
    };
    SchemaError::UnsupportedType(format!("{dtype}{hint}"))
}

/// Replace characters not allowed in Avro names with `_`.
fn sanitize_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    out
}

/// Convert every row of `df` into an Avro record value for `schema`.
///
/// `schema` must be a record with one field per column, in column order,
/// as produced by [`polars_to_avro_schema`].
pub fn frame_to_values(df: &DataFrame, schema: &AvroSchema) -> Result<Vec<Value>, WriterError> {
    let AvroSchema::Record(record) = schema else {
        return Err(SchemaError::NotARecord(schema.canonical_form()).into());
    };
    if record.fields.len() != df.width() {
        return Err(SchemaError::IncompatibleSchemas(format!(
            "frame has {} columns but the Avro record has {} fields",
            df.width(),
            record.fields.len()
        ))
        .into());
    }

    let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
    let columns = df
        .get_columns()
        .iter()
        .zip(&record.fields)
        .map(|(column, field)| {
            let values = series_to_values(column.as_materialized_series(), &field.schema)?;
            Ok(values.into_iter())
        })
        .collect::<Result<Vec<_>, WriterError>>()?;

    Ok(zip_records(&names, columns, df.height()))
}

/// Combine per-column values into `height` records.
fn zip_records(
    names: &[&str],
    mut columns: Vec<std::vec::IntoIter<Value>>,
    height: usize,
) -> Vec<Value> {
    (0..height)
        .map(|_| {
            let fields = names
                .iter()
                .zip(columns.iter_mut())
                .map(|(name, values)| (name.to_string(), values.next().unwrap_or(Value::Null)))
                .collect();
            Value::Record(fields)
        })
        .collect()
}

/// Convert a series to one Avro value per row.
pub fn series_to_values(series: &Series, schema: &AvroSchema) -> Result<Vec<Value>, WriterError> {
    match schema {
        AvroSchema::Null => Ok(vec![Value::Null; series.len()]),
        AvroSchema::Union(union) => union_values(series, union),
        other => optional_values(series, other)?
            .into_iter()
            .map(|value| {
                value.ok_or_else(|| {
                    WriterError::from(mismatch(series, other, "null value for a non-nullable type"))
                })
            })
            .collect(),
    }
}

fn union_values(series: &Series, union: &UnionSchema) -> Result<Vec<Value>, WriterError> {
    let variants = union.variants();
    let null_index = variants
        .iter()
        .position(|variant| matches!(variant, AvroSchema::Null));
    let value_index = variants
        .iter()
        .position(|variant| !matches!(variant, AvroSchema::Null));

    let Some(value_index) = value_index else {
        return Ok(vec![Value::Union(0, Box::new(Value::Null)); series.len()]);
    };
    if variants.len() > 2 || (variants.len() == 2 && null_index.is_none()) {
        return Err(SchemaError::UnsupportedType(format!(
            "union {}",
            AvroSchema::Union(union.clone()).canonical_form()
        ))
        .into());
    }

    optional_values(series, &variants[value_index])?
        .into_iter()
        .map(|value| match (value, null_index) {
            (Some(value), _) => Ok(Value::Union(value_index as u32, Box::new(value))),
            (None, Some(null_index)) => Ok(Value::Union(null_index as u32, Box::new(Value::Null))),
            (None, None) => Err(WriterError::from(mismatch(
                series,
                &variants[value_index],
                "null value for a non-nullable type",
            ))),
        })
        .collect()
}

fn mismatch(series: &Series, schema: &AvroSchema, message: &str) -> SchemaError {
    SchemaError::UnsupportedType(format!(
        "column '{}' of type {} as {}: {}",
        series.name(),
        series.dtype(),
        schema.canonical_form(),
        message
    ))
}

/// Convert a series to one optional value per row, `None` for nulls.
fn optional_values(series: &Series, schema: &AvroSchema) -> Result<Vec<Option<Value>>, WriterError> {
    let values: Vec<Option<Value>> = match schema {
        AvroSchema::Boolean => series
            .bool()?
            .into_iter()
            .map(|v| v.map(Value::Boolean))
            .collect(),
        AvroSchema::Int => {
            let ints = series.strict_cast(&DataType::Int32)?;
            ints.i32()?.into_iter().map(|v| v.map(Value::Int)).collect()
        }
        AvroSchema::Long => {
            let longs = series.strict_cast(&DataType::Int64)?;
            longs.i64()?.into_iter().map(|v| v.map(Value::Long)).collect()
        }
        AvroSchema::Float => {
            let floats = series.strict_cast(&DataType::Float32)?;
            floats.f32()?.into_iter().map(|v| v.map(Value::Float)).collect()
        }
        AvroSchema::Double => {
            let doubles = series.strict_cast(&DataType::Float64)?;
            doubles.f64()?.into_iter().map(|v| v.map(Value::Double)).collect()
        }
        AvroSchema::String => {
            let strings = series.cast(&DataType::String)?;
            strings
                .str()?
                .into_iter()
                .map(|v| v.map(|s| Value::String(s.to_string())))
                .collect()
        }
        AvroSchema::Bytes => series
            .binary()?
            .into_iter()
            .map(|v| v.map(|b| Value::Bytes(b.to_vec())))
            .collect(),
        AvroSchema::Enum(enum_schema) => {
            let positions: HashMap<&str, u32> = enum_schema
                .symbols
                .iter()
                .enumerate()
                .map(|(i, symbol)| (symbol.as_str(), i as u32))
                .collect();
            let strings = series.cast(&DataType::String)?;
            strings
                .str()?
                .into_iter()
                .map(|v| match v {
                    None => Ok(None),
                    Some(symbol) => positions
                        .get(symbol)
                        .map(|&i| Some(Value::Enum(i, symbol.to_string())))
                        .ok_or_else(|| {
                            mismatch(series, schema, &format!("unknown symbol '{symbol}'"))
                        }),
                })
                .collect::<Result<Vec<_>, SchemaError>>()?
        }
        AvroSchema::Date => {
            let days = series.to_physical_repr();
            days.i32()?.into_iter().map(|v| v.map(Value::Date)).collect()
        }
        AvroSchema::TimestampMillis
        | AvroSchema::TimestampMicros
        | AvroSchema::TimestampNanos
        | AvroSchema::LocalTimestampMillis
        | AvroSchema::LocalTimestampMicros
        | AvroSchema::LocalTimestampNanos => {
            let wrap: fn(i64) -> Value = match schema {
                AvroSchema::TimestampMillis => Value::TimestampMillis,
                AvroSchema::TimestampMicros => Value::TimestampMicros,
                AvroSchema::TimestampNanos => Value::TimestampNanos,
                AvroSchema::LocalTimestampMillis => Value::LocalTimestampMillis,
                AvroSchema::LocalTimestampMicros => Value::LocalTimestampMicros,
                _ => Value::LocalTimestampNanos,
            };
            let ticks = series.to_physical_repr();
            ticks.i64()?.into_iter().map(|v| v.map(wrap)).collect()
        }
        AvroSchema::TimeMicros => {
            // Polars stores time of day in nanoseconds
            let nanos = series.to_physical_repr();
            nanos
                .i64()?
                .into_iter()
                .map(|v| v.map(|ns| Value::TimeMicros(ns / 1_000)))
                .collect()
        }
        AvroSchema::Array(array) => {
            let lists = match series.dtype() {
                DataType::Array(inner, _) => series.cast(&DataType::List(inner.clone()))?,
                _ => series.clone(),
            };
            lists
                .list()?
                .into_iter()
                .map(|items| {
                    items
                        .map(|items| series_to_values(&items, &array.items).map(Value::Array))
                        .transpose()
                })
                .collect::<Result<Vec<_>, WriterError>>()?
        }
        AvroSchema::Record(record) => {
            let structs = series.struct_()?;
            let fields = structs.fields_as_series();
            if fields.len() != record.fields.len() {
                return Err(mismatch(series, schema, "field count differs").into());
            }
            let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
            let columns = fields
                .iter()
                .zip(&record.fields)
                .map(|(field, avro_field)| {
                    Ok(series_to_values(field, &avro_field.schema)?.into_iter())
                })
                .collect::<Result<Vec<_>, WriterError>>()?;
            let records = zip_records(&names, columns, series.len());
            let nulls = series.is_null();
            nulls
                .into_iter()
                .zip(records)
                .map(|(is_null, record)| (is_null != Some(true)).then_some(record))
                .collect()
        }
        other => return Err(mismatch(series, other, "unsupported Avro type").into()),
    };
    Ok(values)
}

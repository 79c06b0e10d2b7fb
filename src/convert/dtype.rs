//! Avro schema to Polars type mapping
//!
//! | Avro Type                      | Polars Type            |
//! |--------------------------------|------------------------|
//! | null                           | Null                   |
//! | boolean                        | Boolean                |
//! | int                            | Int32                  |
//! | long                           | Int64                  |
//! | float                          | Float32                |
//! | double                         | Float64                |
//! | bytes                          | Binary                 |
//! | string                         | String                 |
//! | enum                           | Enum                   |
//! | array                          | List                   |
//! | record                         | Struct                 |
//! | ["null", T] / [T, "null"] / [T]| T                      |
//! | date                           | Date                   |
//! | timestamp-*                    | Datetime(unit, UTC)    |
//! | local-timestamp-*              | Datetime(unit, None)   |
//!
//! Every column is nullable, so nullable unions map to their non-null branch.
//! Maps, fixed and unions with more than one non-null branch are rejected.

use std::collections::HashMap;

use apache_avro::Schema as AvroSchema;
use polars::prelude::*;

use crate::api::AvroOptions;
use crate::error::SchemaError;

/// A Polars schema parsed from an Avro writer schema.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedSchema {
    /// Column names and types.
    pub schema: Schema,
    /// True when the Avro schema is not a record and each value is wrapped
    /// into a single column.
    pub singleton: bool,
}

impl ParsedSchema {
    /// The schema with every type replaced by the type values are built as
    /// before being cast.
    pub fn physical(&self) -> Schema {
        self.schema
            .iter()
            .map(|(name, dtype)| Field::new(name.clone(), physical_dtype(dtype)))
            .collect()
    }
}

/// Converts Avro schemas into Polars types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataTypeParser {
    /// Read unsupported logical types as their backing physical type.
    pub convert_logical_types: bool,
    /// Column name used to wrap non-record top-level schemas.
    pub single_col_name: Option<PlSmallStr>,
}

impl DataTypeParser {
    /// Create a parser.
    pub fn new(convert_logical_types: bool, single_col_name: Option<PlSmallStr>) -> Self {
        Self {
            convert_logical_types,
            single_col_name,
        }
    }

    /// Create a parser from reader options and the single column name.
    pub fn from_options(opts: &AvroOptions, single_col_name: Option<&str>) -> Self {
        Self::new(opts.convert_logical_types, single_col_name.map(Into::into))
    }

    /// Parse a top-level writer schema into a Polars schema.
    ///
    /// # Errors
    /// - `SchemaError::NotARecord` if the schema is not a record and no
    ///   single column name is configured
    /// - any error from [`DataTypeParser::parse_dtype`]
    pub fn parse_schema(&self, schema: &AvroSchema) -> Result<ParsedSchema, SchemaError> {
        let names = collect_names(schema);
        let mut ctx = ParseContext {
            names: &names,
            visiting: Vec::new(),
        };

        match schema {
            AvroSchema::Record(record) => {
                ctx.visiting.push(record.name.fullname(None));
                let fields = record
                    .fields
                    .iter()
                    .map(|field| {
                        let dtype = self.parse_with(&field.schema, &mut ctx)?;
                        Ok(Field::new(field.name.as_str().into(), dtype))
                    })
                    .collect::<Result<Vec<_>, SchemaError>>()?;
                Ok(ParsedSchema {
                    schema: Schema::from_iter(fields),
                    singleton: false,
                })
            }
            other => match &self.single_col_name {
                Some(name) => {
                    let dtype = self.parse_with(other, &mut ctx)?;
                    Ok(ParsedSchema {
                        schema: Schema::from_iter([Field::new(name.clone(), dtype)]),
                        singleton: true,
                    })
                }
                None => Err(SchemaError::NotARecord(other.canonical_form())),
            },
        }
    }

    /// Convert a single Avro type to a Polars type.
    ///
    /// Named type references are resolved against the names defined in
    /// `schema` itself.
    pub fn parse_dtype(&self, schema: &AvroSchema) -> Result<DataType, SchemaError> {
        let names = collect_names(schema);
        let mut ctx = ParseContext {
            names: &names,
            visiting: Vec::new(),
        };
        self.parse_with(schema, &mut ctx)
    }

    fn parse_with(
        &self,
        schema: &AvroSchema,
        ctx: &mut ParseContext<'_>,
    ) -> Result<DataType, SchemaError> {
        match unwrap_nullable(schema) {
            // Logical types with a native Polars representation
            AvroSchema::TimestampMillis => {
                Ok(DataType::Datetime(TimeUnit::Milliseconds, Some(TimeZone::UTC)))
            }
            AvroSchema::TimestampMicros => {
                Ok(DataType::Datetime(TimeUnit::Microseconds, Some(TimeZone::UTC)))
            }
            AvroSchema::TimestampNanos => {
                Ok(DataType::Datetime(TimeUnit::Nanoseconds, Some(TimeZone::UTC)))
            }
            AvroSchema::LocalTimestampMillis => {
                Ok(DataType::Datetime(TimeUnit::Milliseconds, None))
            }
            AvroSchema::LocalTimestampMicros => {
                Ok(DataType::Datetime(TimeUnit::Microseconds, None))
            }
            AvroSchema::LocalTimestampNanos => Ok(DataType::Datetime(TimeUnit::Nanoseconds, None)),
            AvroSchema::Date => Ok(DataType::Date),

            // Logical types only readable as their physical type
            logical @ (AvroSchema::Uuid
            | AvroSchema::TimeMillis
            | AvroSchema::TimeMicros
            | AvroSchema::Decimal(_)
            | AvroSchema::BigDecimal
            | AvroSchema::Duration)
                if !self.convert_logical_types =>
            {
                Err(SchemaError::LogicalTypeNotEnabled(logical.canonical_form()))
            }
            AvroSchema::Uuid => Ok(DataType::String),
            AvroSchema::TimeMillis => Ok(DataType::Int32),
            AvroSchema::TimeMicros => Ok(DataType::Int64),
            AvroSchema::Decimal(decimal) => match decimal.inner.as_ref() {
                AvroSchema::Bytes => Ok(DataType::Binary),
                other => Err(SchemaError::UnsupportedType(format!(
                    "decimal backed by {}",
                    other.canonical_form()
                ))),
            },

            // Primitive types
            AvroSchema::Null => Ok(DataType::Null),
            AvroSchema::Boolean => Ok(DataType::Boolean),
            AvroSchema::Int => Ok(DataType::Int32),
            AvroSchema::Long => Ok(DataType::Int64),
            AvroSchema::Float => Ok(DataType::Float32),
            AvroSchema::Double => Ok(DataType::Float64),
            AvroSchema::Bytes => Ok(DataType::Binary),
            AvroSchema::String => Ok(DataType::String),

            // Complex types
            AvroSchema::Enum(enum_schema) => {
                let categories =
                    FrozenCategories::new(enum_schema.symbols.iter().map(|s| s.as_str()))
                        .map_err(|e| {
                            SchemaError::InvalidSchema(format!(
                                "Failed to create enum categories: {}",
                                e
                            ))
                        })?;
                Ok(DataType::from_frozen_categories(categories))
            }
            AvroSchema::Array(array) => {
                let inner = self.parse_with(&array.items, ctx)?;
                Ok(DataType::List(Box::new(inner)))
            }
            AvroSchema::Record(record) => {
                let fullname = record.name.fullname(None);
                if ctx.visiting.contains(&fullname) {
                    return Err(SchemaError::RecursiveType(fullname));
                }
                ctx.visiting.push(fullname);
                let fields = record
                    .fields
                    .iter()
                    .map(|field| {
                        let dtype = self.parse_with(&field.schema, ctx)?;
                        Ok(Field::new(field.name.as_str().into(), dtype))
                    })
                    .collect::<Result<Vec<_>, SchemaError>>();
                ctx.visiting.pop();
                Ok(DataType::Struct(fields?))
            }
            AvroSchema::Ref { name } => {
                let fullname = name.fullname(None);
                if ctx.visiting.contains(&fullname) {
                    return Err(SchemaError::RecursiveType(fullname));
                }
                let resolved = ctx
                    .names
                    .get(&fullname)
                    .copied()
                    .ok_or_else(|| SchemaError::InvalidSchema(format!("unknown type {fullname}")))?;
                self.parse_with(resolved, ctx)
            }

            unwrapped => Err(SchemaError::UnsupportedType(unwrapped.canonical_form())),
        }
    }
}

struct ParseContext<'a> {
    names: &'a HashMap<String, &'a AvroSchema>,
    /// Records currently being parsed, innermost last.
    visiting: Vec<String>,
}

/// Strip a nullable union down to its non-null branch.
///
/// `["null", T]`, `[T, "null"]` and `[T]` become `T`; any other schema is
/// returned unchanged.
pub fn unwrap_nullable(schema: &AvroSchema) -> &AvroSchema {
    match schema {
        AvroSchema::Union(union) => match union.variants() {
            [AvroSchema::Null, other] | [other, AvroSchema::Null] | [other] => other,
            _ => schema,
        },
        _ => schema,
    }
}

/// Index every named type defined in `schema` by its full name.
fn collect_names(schema: &AvroSchema) -> HashMap<String, &AvroSchema> {
    fn walk<'a>(schema: &'a AvroSchema, names: &mut HashMap<String, &'a AvroSchema>) {
        match schema {
            AvroSchema::Record(record) => {
                names.insert(record.name.fullname(None), schema);
                for field in &record.fields {
                    walk(&field.schema, names);
                }
            }
            AvroSchema::Enum(enum_schema) => {
                names.insert(enum_schema.name.fullname(None), schema);
            }
            AvroSchema::Fixed(fixed) => {
                names.insert(fixed.name.fullname(None), schema);
            }
            AvroSchema::Array(array) => walk(&array.items, names),
            AvroSchema::Map(map) => walk(&map.types, names),
            AvroSchema::Union(union) => {
                for variant in union.variants() {
                    walk(variant, names);
                }
            }
            _ => {}
        }
    }

    let mut names = HashMap::new();
    walk(schema, &mut names);
    names
}

/// The type values are materialised as before casting to `dtype`.
///
/// Enums are built from their symbols, datetimes and dates from their
/// integer representation. Lists and structs are mapped recursively.
pub fn physical_dtype(dtype: &DataType) -> DataType {
    match dtype {
        DataType::Enum(_, _) => DataType::String,
        DataType::Datetime(_, _) => DataType::Int64,
        DataType::Date => DataType::Int32,
        DataType::List(inner) => DataType::List(Box::new(physical_dtype(inner))),
        DataType::Struct(fields) => DataType::Struct(
            fields
                .iter()
                .map(|f| Field::new(f.name().clone(), physical_dtype(f.dtype())))
                .collect(),
        ),
        other => other.clone(),
    }
}

//! Source resolution and schema unification.
//!
//! Sources are expanded once, when a scan is created. The schema of the
//! first source becomes the canonical schema; every later source must parse
//! to exactly the same Polars schema, which is checked when it is opened.

use apache_avro::{Reader, Schema as AvroSchema};
use tracing::debug;

use crate::convert::{DataTypeParser, ParsedSchema};
use crate::error::{ReaderError, SchemaError};
use crate::source::{BoxedReader, ScanSource, ScanSources};

use super::args::ScanArgsAvro;
use super::glob::expand_sources;
use super::options::AvroOptions;

/// Avro object container reader over any source.
pub type AvroReader = Reader<'static, BoxedReader>;

/// Resolved sources after glob expansion and schema parsing.
#[derive(Debug, Clone)]
pub struct ResolvedSources {
    /// The expanded list of sources, in read order.
    pub sources: ScanSources,
    /// The schema of the first source.
    pub schema: ParsedSchema,
    /// The parser used for every source.
    pub parser: DataTypeParser,
}

impl ResolvedSources {
    /// Resolve sources from user input.
    ///
    /// This method:
    /// 1. Expands `~` and glob patterns (if `args.glob`)
    /// 2. Reads and parses the writer schema of the first source
    ///
    /// # Errors
    /// - `ReaderError::EmptySources` if nothing is left after expansion
    /// - `SchemaError` if the first schema can't be represented in Polars
    /// - `SourceError` / Avro errors if the first source can't be opened
    pub fn resolve(
        sources: &ScanSources,
        args: &ScanArgsAvro,
        opts: &AvroOptions,
    ) -> Result<Self, ReaderError> {
        let sources = expand_sources(sources, args.glob)?;
        if sources.is_empty() {
            return Err(ReaderError::EmptySources);
        }

        let parser = DataTypeParser::from_options(opts, args.single_col_name.as_deref());
        let schema = read_parsed_schema(&sources, 0, &parser)
            .map_err(|e| e.in_source(sources.display_name(0)))?;

        debug!(
            sources = sources.len(),
            columns = schema.schema.len(),
            singleton = schema.singleton,
            "resolved avro sources"
        );

        Ok(Self {
            sources,
            schema,
            parser,
        })
    }

    /// Get the number of resolved sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if there are no resolved sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Open the source at `index` for reading records.
    ///
    /// Sources after the first are checked against the canonical schema.
    /// Errors carry the name of the source.
    pub fn open(&self, index: usize) -> Result<AvroReader, ReaderError> {
        self.open_checked(index)
            .map_err(|e| e.in_source(self.sources.display_name(index)))
    }

    fn open_checked(&self, index: usize) -> Result<AvroReader, ReaderError> {
        let reader = open_source_at(&self.sources, index)?;
        if index > 0 {
            self.check_schema(index, reader.writer_schema())?;
        }
        debug!(source = %self.sources.display_name(index), "opened avro reader");
        Ok(reader)
    }

    /// Check that the writer schema of source `index` matches source 0.
    ///
    /// # Errors
    /// `SchemaError::IncompatibleSchemas` if the parsed schemas or their
    /// singleton flags differ.
    pub fn check_schema(&self, index: usize, writer_schema: &AvroSchema) -> Result<(), ReaderError> {
        let parsed = self.parser.parse_schema(writer_schema)?;
        if parsed == self.schema {
            return Ok(());
        }
        Err(SchemaError::IncompatibleSchemas(format!(
            "schema of source {index} didn't match schema of source 0\n{} != {:?}",
            writer_schema.canonical_form(),
            self.schema.schema
        ))
        .into())
    }
}

/// Open a single source as an Avro reader.
pub fn open_reader(source: &ScanSource) -> Result<AvroReader, ReaderError> {
    let bytes = source.open()?;
    Ok(Reader::new(bytes)?)
}

fn open_source_at(sources: &ScanSources, index: usize) -> Result<AvroReader, ReaderError> {
    let source = sources.get(index).ok_or_else(|| {
        ReaderError::Configuration(format!(
            "source index {index} out of range for {} sources",
            sources.len()
        ))
    })?;
    open_reader(source)
}

/// Read and parse the writer schema of source `index`.
pub fn read_parsed_schema(
    sources: &ScanSources,
    index: usize,
    parser: &DataTypeParser,
) -> Result<ParsedSchema, ReaderError> {
    let reader = open_source_at(sources, index)?;
    Ok(parser.parse_schema(reader.writer_schema())?)
}

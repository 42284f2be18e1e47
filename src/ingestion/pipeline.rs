//! Validating ingestion pipeline.
//!
//! [`IngestionPipeline`] pulls [`RawRow`]s from a row source, validates each one, keeps valid
//! rows and formats an error message for every invalid field. Once the number of recorded errors
//! exceeds the configured threshold the run stops without reading any further rows.
//!
//! ```rust
//! use tabular_ingest::ingestion::csv::CsvRowSource;
//! use tabular_ingest::ingestion::IngestionPipeline;
//! use tabular_ingest::types::{DataType, Field, Schema};
//! use tabular_ingest::validation::SchemaValidator;
//!
//! # fn main() -> Result<(), tabular_ingest::IngestionError> {
//! let validator = SchemaValidator::new(Schema::new(vec![
//!     Field::new("id", DataType::Int64),
//!     Field::new("seen", DataType::DateTime),
//! ]));
//! let input = "id,seen\n1,2024-02-14\nx,2024-02-15\n2,2024-02-16\n";
//!
//! let result = IngestionPipeline::new(&validator)
//!     .with_max_errors_before_bailing(5)
//!     .run(CsvRowSource::from_reader(input.as_bytes())?)?;
//!
//! assert!(result.is_finished());
//! assert_eq!(result.table().row_count(), 2);
//! assert_eq!(
//!     result.error_messages(),
//!     vec![
//!         "Error at line 2, column 'id', input 'x': \
//!          Input should be a valid integer, unable to parse string as an integer"
//!     ]
//! );
//! # Ok(())
//! # }
//! ```

use std::fmt;

use crate::error::Result;
use crate::types::{DataSet, RawRow, ValidatedRow};
use crate::validation::{FieldError, RowValidator};

/// Errors tolerated before bailing when no threshold is configured: the first error stops the run.
pub const DEFAULT_MAX_ERRORS_BEFORE_BAILING: usize = 0;

/// Lifecycle of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    Running,
    /// The source was exhausted.
    Finished,
    /// The error threshold was exceeded and the run stopped early.
    BailedOut,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Finished | PipelineState::BailedOut)
    }
}

/// A field that failed validation, attributed to its row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub row_number: usize,
    pub source_partition: Option<String>,
    pub column: String,
    pub raw_input: String,
    pub message: String,
}

impl ValidationError {
    fn new(row: &RawRow, err: FieldError) -> Self {
        Self {
            row_number: row.row_number,
            source_partition: row.source_partition.clone(),
            column: err.column,
            raw_input: err.raw_input,
            message: err.message,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error at line {}, column '{}', input '{}': {}",
            self.row_number, self.column, self.raw_input, self.message
        )
    }
}

/// Outcome of one ingestion run. Read-only once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionResult {
    table: DataSet,
    errors: Vec<ValidationError>,
    state: PipelineState,
}

impl IngestionResult {
    /// Valid rows, in source order.
    pub fn table(&self) -> &DataSet {
        &self.table
    }

    /// One entry per invalid field, in the order encountered.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// `true` if the run stopped early because of too many errors.
    pub fn bailed_out(&self) -> bool {
        self.state == PipelineState::BailedOut
    }

    /// `true` only if the whole source was consumed (a bailed-out run is never finished).
    pub fn is_finished(&self) -> bool {
        self.state == PipelineState::Finished
    }

    /// Terminal state of the run that produced this result.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Take ownership of the table and the errors.
    pub fn into_parts(self) -> (DataSet, Vec<ValidationError>) {
        (self.table, self.errors)
    }

    /// Formatted error messages, in order.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Drives a row source through a [`RowValidator`] with an error-count circuit breaker.
///
/// A pipeline is spent by [`Self::run`]; ingest another source with a new pipeline.
pub struct IngestionPipeline<V> {
    validator: V,
    max_errors_before_bailing: usize,
    state: PipelineState,
    rows: Vec<ValidatedRow>,
    errors: Vec<ValidationError>,
}

impl<V: RowValidator> IngestionPipeline<V> {
    /// Create a pipeline using [`DEFAULT_MAX_ERRORS_BEFORE_BAILING`].
    pub fn new(validator: V) -> Self {
        Self {
            validator,
            max_errors_before_bailing: DEFAULT_MAX_ERRORS_BEFORE_BAILING,
            state: PipelineState::NotStarted,
            rows: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tolerate up to `max` field errors; the run bails on the next one.
    pub fn with_max_errors_before_bailing(mut self, max: usize) -> Self {
        self.max_errors_before_bailing = max;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Consume `source` until it is exhausted or the error threshold is exceeded.
    ///
    /// A structural error from the source aborts the run and is returned as-is; rows gathered so
    /// far are discarded.
    pub fn run<I>(mut self, source: I) -> Result<IngestionResult>
    where
        I: IntoIterator<Item = Result<RawRow>>,
    {
        let span = tracing::info_span!(
            "ingest",
            max_errors_before_bailing = self.max_errors_before_bailing
        );
        let _enter = span.enter();

        self.state = PipelineState::Running;
        let mut source = source.into_iter();
        while !self.state.is_terminal() {
            match source.next() {
                Some(row) => self.state = self.ingest_row(row?),
                None => self.state = PipelineState::Finished,
            }
        }
        // Release the source before assembling the table.
        drop(source);

        if self.state == PipelineState::BailedOut {
            tracing::warn!(
                rows = self.rows.len(),
                errors = self.errors.len(),
                "too many validation errors; stopped reading the source"
            );
        } else {
            tracing::info!(
                rows = self.rows.len(),
                errors = self.errors.len(),
                "ingestion finished"
            );
        }

        Ok(IngestionResult {
            table: DataSet::from_validated_rows(&self.rows),
            errors: self.errors,
            state: self.state,
        })
    }

    fn ingest_row(&mut self, row: RawRow) -> PipelineState {
        let field_errors = match self.validator.validate(&row) {
            Ok(valid) => {
                self.rows.push(valid);
                return PipelineState::Running;
            }
            Err(field_errors) => field_errors,
        };

        tracing::debug!(
            row_number = row.row_number,
            partition = row.source_partition.as_deref(),
            fields = field_errors.len(),
            "row rejected"
        );
        for err in field_errors {
            self.errors.push(ValidationError::new(&row, err));
            if self.errors.len() > self.max_errors_before_bailing {
                return PipelineState::BailedOut;
            }
        }
        PipelineState::Running
    }
}

/// Run a fresh pipeline over `source`; shorthand for
/// `IngestionPipeline::new(validator).with_max_errors_before_bailing(max).run(source)`.
pub fn run_ingestion<I, V>(
    source: I,
    validator: V,
    max_errors_before_bailing: usize,
) -> Result<IngestionResult>
where
    I: IntoIterator<Item = Result<RawRow>>,
    V: RowValidator,
{
    IngestionPipeline::new(validator)
        .with_max_errors_before_bailing(max_errors_before_bailing)
        .run(source)
}

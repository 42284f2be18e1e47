//! `tabular-ingest` reads tabular exports (CSV and spreadsheet workbooks) row by row, validates
//! every row against a schema, and returns the valid rows as an in-memory
//! [`types::DataSet`] together with one human-readable message per invalid field.
//!
//! The primary entrypoint is [`ingestion::ingest_from_path`], which picks a row source from the
//! file extension (or from [`ingestion::IngestionOptions`]) and runs an
//! [`ingestion::IngestionPipeline`] over it.
//!
//! ## What you can ingest
//!
//! - **CSV**: `.csv`, header row first
//! - **Excel/workbooks** (Cargo feature `excel`, on by default): `.xlsx`, `.xls`, `.xlsm`,
//!   `.xlsb`, `.ods`. Every sheet starts with a header row, and every row starts with a
//!   row-number cell (the layout of a dataframe exported with its index).
//!
//! Headers are normalized with [`normalize::normalize_column_name`] (`" Order Date "` becomes
//! `order_date`) before rows reach the validator.
//!
//! ## Validation
//!
//! Rows are validated by any [`validation::RowValidator`]. [`validation::SchemaValidator`]
//! validates against a [`types::Schema`] of typed [`types::Field`]s:
//!
//! - [`types::DataType::Int64`]
//! - [`types::DataType::Float64`]
//! - [`types::DataType::Bool`]
//! - [`types::DataType::Utf8`]
//! - [`types::DataType::DateTime`] (flexible parsing via [`interpret::interpret_datetime`])
//!
//! Fields can carry a custom [`interpret::ScalarInterpreter`].
//!
//! ## Errors and the circuit breaker
//!
//! Invalid fields never fail the run. Each one becomes an
//! [`ingestion::ValidationError`] formatted as
//! `Error at line {row}, column '{column}', input '{raw}': {message}`. Once more than
//! `max_errors_before_bailing` errors were recorded (default `0`), the run stops reading and the
//! result reports `bailed_out()`. Only structural problems (unreadable file, missing header,
//! broken row-number cell) are returned as [`IngestionError`].
//!
//! ## Quick example
//!
//! ```rust
//! use tabular_ingest::ingestion::csv::CsvRowSource;
//! use tabular_ingest::ingestion::run_ingestion;
//! use tabular_ingest::types::{DataType, Field, Schema, Value};
//! use tabular_ingest::validation::SchemaValidator;
//!
//! # fn main() -> Result<(), tabular_ingest::IngestionError> {
//! let validator = SchemaValidator::new(Schema::new(vec![
//!     Field::new("Col 1", DataType::Int64),
//!     Field::new("Timestamp", DataType::DateTime),
//! ]));
//! let input = "Col 1,Timestamp\n1,2024-02-14\n2,Novtember the 32nd\n3,2024-02-15\n";
//!
//! let source = CsvRowSource::from_reader(input.as_bytes())?;
//! let result = run_ingestion(source, &validator, 1)?;
//!
//! assert!(result.is_finished());
//! assert_eq!(result.table().row_count(), 2);
//! assert_eq!(result.table().value(1, "col_1"), Some(&Value::Int64(3)));
//! assert_eq!(
//!     result.error_messages(),
//!     vec!["Error at line 2, column 'timestamp', input 'Novtember the 32nd': Could not parse as datetime"]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: row sources, the validating pipeline and the unified entrypoint
//! - [`validation`]: the validator trait and the schema-driven validator
//! - [`interpret`]: custom scalar interpreters
//! - [`normalize`]: column name normalization
//! - [`types`]: schema, raw/typed values and the in-memory dataset
//! - [`error`]: structural error type
//!
//! ## Logging
//!
//! The crate emits `tracing` events (an `ingest` span per run, per-row rejections at `debug`,
//! bail-outs at `warn`) and never installs a subscriber itself.

pub mod error;
pub mod ingestion;
pub mod interpret;
pub mod normalize;
pub mod types;
pub mod validation;

pub use error::{IngestionError, Result};

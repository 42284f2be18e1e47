//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which validates a file row by row with a
//! [`RowValidator`] and returns an [`IngestionResult`].
//!
//! - If [`IngestionOptions::format`] is `None`, the format is inferred from the file extension.
//! - If an [`super::observability::IngestionObserver`] is provided, success/bail-out/failure and
//!   alerts are reported to it.
//! - [`IngestionConfig`] holds the serializable subset of the options and can be loaded from JSON.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{IngestionError, Result};
use crate::validation::RowValidator;

use super::csv::CsvRowSource;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::pipeline::{IngestionPipeline, IngestionResult, DEFAULT_MAX_ERRORS_BEFORE_BAILING};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionFormat {
    /// Comma-separated values.
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Which sheet(s) of a workbook to ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetSelection {
    /// Every sheet, in workbook order (default).
    #[default]
    AllSheets,
    /// A single named sheet.
    Sheet(String),
    /// The listed sheets, in the listed order.
    Sheets(Vec<String>),
}

/// Serializable ingestion settings.
///
/// ```rust
/// use tabular_ingest::ingestion::{IngestionConfig, IngestionFormat, SheetSelection};
///
/// let config = IngestionConfig::from_json_str(
///     r#"{ "format": "excel", "sheets": { "sheet": "Orders" }, "max_errors_before_bailing": 10 }"#,
/// )
/// .unwrap();
/// assert_eq!(config.format, Some(IngestionFormat::Excel));
/// assert_eq!(config.sheets, SheetSelection::Sheet("Orders".to_string()));
/// assert_eq!(config.max_errors_before_bailing, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestionConfig {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Workbook sheet selection.
    pub sheets: SheetSelection,
    /// Field errors tolerated before the run bails out.
    pub max_errors_before_bailing: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            format: None,
            sheets: SheetSelection::default(),
            max_errors_before_bailing: DEFAULT_MAX_ERRORS_BEFORE_BAILING,
        }
    }
}

impl IngestionConfig {
    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Excel-specific options.
    pub sheet_selection: SheetSelection,
    /// Field errors tolerated before the run bails out.
    pub max_errors_before_bailing: usize,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl IngestionOptions {
    /// Options from a loaded [`IngestionConfig`], without an observer.
    pub fn from_config(config: IngestionConfig) -> Self {
        Self {
            format: config.format,
            sheet_selection: config.sheets,
            max_errors_before_bailing: config.max_errors_before_bailing,
            ..Default::default()
        }
    }
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("sheet_selection", &self.sheet_selection)
            .field("max_errors_before_bailing", &self.max_errors_before_bailing)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            sheet_selection: SheetSelection::default(),
            max_errors_before_bailing: DEFAULT_MAX_ERRORS_BEFORE_BAILING,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Unified ingestion entry point for path-based sources.
///
/// Opens the right row source for the file, runs a fresh [`IngestionPipeline`] over it and
/// returns the result. Structural problems (unreadable file, missing header, bad row-number
/// cell) are returned as `Err`; invalid rows never are.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` when the source was fully consumed
/// - `on_bailed_out` (severity `Warning`) when the error threshold was exceeded
/// - `on_failure` on a structural error, with a computed severity
/// - `on_alert` on a structural error whose severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use tabular_ingest::ingestion::{ingest_from_path, IngestionOptions};
/// use tabular_ingest::types::{DataType, Field, Schema};
/// use tabular_ingest::validation::SchemaValidator;
///
/// # fn main() -> Result<(), tabular_ingest::IngestionError> {
/// let validator = SchemaValidator::new(Schema::new(vec![
///     Field::new("id", DataType::Int64),
///     Field::new("timestamp", DataType::DateTime),
/// ]));
/// let opts = IngestionOptions {
///     max_errors_before_bailing: 100,
///     ..Default::default()
/// };
///
/// let result = ingest_from_path("export.xlsx", &validator, &opts)?;
/// for message in result.error_messages() {
///     eprintln!("{message}");
/// }
/// println!("rows={} finished={}", result.table().row_count(), result.is_finished());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path<V>(
    path: impl AsRef<Path>,
    validator: &V,
    options: &IngestionOptions,
) -> Result<IngestionResult>
where
    V: RowValidator + ?Sized,
{
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let ctx = IngestionContext {
        path: path.to_path_buf(),
        format: fmt,
    };

    let pipeline =
        IngestionPipeline::new(validator).with_max_errors_before_bailing(options.max_errors_before_bailing);
    let result = match fmt {
        IngestionFormat::Csv => CsvRowSource::from_path(path).and_then(|source| pipeline.run(source)),
        IngestionFormat::Excel => ingest_excel_dispatch(path, pipeline, &options.sheet_selection),
    };

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(r) if r.bailed_out() => obs.on_bailed_out(&ctx, IngestionSeverity::Warning, IngestionStats::of(r)),
            Ok(r) => obs.on_success(&ctx, IngestionStats::of(r)),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) => IngestionSeverity::Critical,
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        #[cfg(feature = "excel")]
        IngestionError::Excel(calamine::Error::Io(_)) => IngestionSeverity::Critical,
        #[cfg(feature = "excel")]
        IngestionError::Excel(_) => IngestionSeverity::Error,
        IngestionError::Config(_)
        | IngestionError::SchemaMismatch { .. }
        | IngestionError::MissingHeader { .. }
        | IngestionError::InvalidRowNumber { .. } => IngestionSeverity::Error,
    }
}

fn infer_format_from_path(path: &Path) -> Result<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| IngestionError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

fn ingest_excel_dispatch<V: RowValidator>(
    path: &Path,
    pipeline: IngestionPipeline<V>,
    sel: &SheetSelection,
) -> Result<IngestionResult> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, &pipeline, sel);

    #[cfg(feature = "excel")]
    {
        let source = super::excel::ExcelRowSource::from_path(path)?.select_sheets(sel)?;
        pipeline.run(source)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(IngestionError::SchemaMismatch {
            message: "excel ingestion not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

/// Convenience helper for callers that want an owned request object.
///
/// This can be useful if you want to enqueue ingestion work in a job system.
#[derive(Clone)]
pub struct IngestionRequest {
    /// Path to the input file.
    pub path: PathBuf,
    /// Options controlling ingestion.
    pub options: IngestionOptions,
}

impl fmt::Debug for IngestionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionRequest")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish()
    }
}

impl IngestionRequest {
    /// Execute the request by calling [`ingest_from_path`].
    pub fn run<V: RowValidator + ?Sized>(&self, validator: &V) -> Result<IngestionResult> {
        ingest_from_path(&self.path, validator, &self.options)
    }
}

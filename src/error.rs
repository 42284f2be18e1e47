use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type Result<T, E = IngestionError> = std::result::Result<T, E>;

/// Structural error that aborts an ingestion run.
///
/// Per-field validation failures are never reported through this type; they are collected into
/// [`crate::ingestion::IngestionResult::errors`] instead.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook decoding error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// The input cannot be handled with the requested options (unknown format, unknown sheet, ...).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// The source has no header row.
    #[error("missing header row in {source_name}")]
    MissingHeader { source_name: String },

    /// A spreadsheet row's leading row-number cell is not a non-negative integer.
    #[error("invalid row number in sheet '{partition}' (raw='{raw}')")]
    InvalidRowNumber { partition: String, raw: String },
}

//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can override via [`IngestionOptions`])
//! - validates every row and collects an [`IngestionResult`]
//! - optionally reports success/bail-out/failure/alerts to an [`IngestionObserver`]
//!
//! The building blocks are also available directly:
//! - row sources in [`csv`] and `excel` (behind the `excel` feature)
//! - the validating [`pipeline`]

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod observability;
pub mod pipeline;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    TracingObserver,
};
pub use pipeline::{
    run_ingestion, IngestionPipeline, IngestionResult, PipelineState, ValidationError,
    DEFAULT_MAX_ERRORS_BEFORE_BAILING,
};
pub use unified::{
    ingest_from_path, IngestionConfig, IngestionFormat, IngestionOptions, IngestionRequest, SheetSelection,
};

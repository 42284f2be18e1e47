use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tabular_ingest::ingestion::{
    ingest_from_path, FileObserver, IngestionConfig, IngestionContext, IngestionFormat, IngestionObserver,
    IngestionOptions, IngestionRequest, IngestionSeverity, IngestionStats, SheetSelection,
};
use tabular_ingest::types::{DataType, Field, Schema, Value};
use tabular_ingest::validation::SchemaValidator;
use tabular_ingest::IngestionError;

fn tmp_file(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tabular-ingest-unified-{nanos}.{ext}"))
}

fn timestamped_validator() -> SchemaValidator {
    SchemaValidator::new(Schema::new(vec![
        Field::new("col1", DataType::Int64),
        Field::new("col2", DataType::Utf8),
        Field::new("timestamp", DataType::DateTime),
    ]))
}

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<IngestionStats>>,
    bail_outs: Mutex<Vec<(IngestionSeverity, IngestionStats)>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, _ctx: &IngestionContext, stats: IngestionStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_bailed_out(&self, _ctx: &IngestionContext, severity: IngestionSeverity, stats: IngestionStats) {
        self.bail_outs.lock().unwrap().push((severity, stats));
    }

    fn on_failure(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &IngestionError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &IngestionError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

#[test]
fn format_is_inferred_from_extension() {
    let opts = IngestionOptions {
        max_errors_before_bailing: 1,
        ..Default::default()
    };
    let result = ingest_from_path("tests/fixtures/timestamped.csv", &timestamped_validator(), &opts).unwrap();

    assert!(result.is_finished());
    assert_eq!(result.table().row_count(), 3);
    assert_eq!(result.errors().len(), 1);
}

#[test]
fn forced_format_overrides_inference() {
    let validator = SchemaValidator::new(Schema::new(vec![Field::new("a", DataType::Int64)]));
    let opts = IngestionOptions {
        format: Some(IngestionFormat::Csv),
        ..Default::default()
    };
    let result = ingest_from_path("tests/fixtures/no_extension", &validator, &opts).unwrap();
    assert_eq!(result.table().value(0, "a"), Some(&Value::Int64(1)));
}

#[test]
fn unknown_extension_is_rejected() {
    let err = ingest_from_path(
        "tests/fixtures/config.json",
        &timestamped_validator(),
        &IngestionOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("cannot infer format from extension 'json'"));

    let err = ingest_from_path(
        "tests/fixtures/no_extension",
        &timestamped_validator(),
        &IngestionOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("path has no extension"));
}

#[test]
fn extension_matching_is_case_insensitive() {
    assert_eq!(IngestionFormat::from_extension("CSV"), Some(IngestionFormat::Csv));
    assert_eq!(IngestionFormat::from_extension("Xlsx"), Some(IngestionFormat::Excel));
    assert_eq!(IngestionFormat::from_extension("ods"), Some(IngestionFormat::Excel));
    assert_eq!(IngestionFormat::from_extension("parquet"), None);
}

#[test]
fn observer_receives_success_stats() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        max_errors_before_bailing: 5,
        observer: Some(obs.clone()),
        ..Default::default()
    };
    ingest_from_path("tests/fixtures/timestamped.csv", &timestamped_validator(), &opts).unwrap();

    assert_eq!(
        obs.successes.lock().unwrap().clone(),
        vec![IngestionStats {
            rows: 3,
            errors: 1,
            bailed_out: false
        }]
    );
    assert!(obs.bail_outs.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_bail_out_as_warning_without_alert() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Info,
        ..Default::default()
    };
    let result = ingest_from_path("tests/fixtures/timestamped.csv", &timestamped_validator(), &opts).unwrap();

    assert!(result.bailed_out());
    assert!(obs.successes.lock().unwrap().is_empty());
    assert_eq!(
        obs.bail_outs.lock().unwrap().clone(),
        vec![(
            IngestionSeverity::Warning,
            IngestionStats {
                rows: 2,
                errors: 1,
                bailed_out: true
            }
        )]
    );
    assert!(obs.failures.lock().unwrap().is_empty());
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    // Missing file -> Io error -> Critical
    let _ = ingest_from_path("tests/fixtures/does_not_exist.csv", &timestamped_validator(), &opts).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IngestionSeverity::Critical]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![IngestionSeverity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_structural_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    // Missing header -> Error severity (not Critical) -> should not alert
    let err = ingest_from_path("tests/fixtures/empty.csv", &timestamped_validator(), &opts).unwrap_err();

    assert!(matches!(err, IngestionError::MissingHeader { .. }));
    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn file_observer_appends_one_line_per_run() {
    let log = tmp_file("log");
    let opts = IngestionOptions {
        max_errors_before_bailing: 5,
        observer: Some(Arc::new(FileObserver::new(&log))),
        ..Default::default()
    };
    ingest_from_path("tests/fixtures/timestamped.csv", &timestamped_validator(), &opts).unwrap();
    let _ = ingest_from_path("tests/fixtures/empty.csv", &timestamped_validator(), &opts).unwrap_err();

    let text = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(" ok format=Csv"));
    assert!(lines[0].contains("rows=3 errors=1"));
    assert!(lines[1].contains(" fail severity=Error"));

    let _ = std::fs::remove_file(&log);
}

#[test]
fn config_loads_from_json_file_with_defaults() {
    let config = IngestionConfig::from_json_path("tests/fixtures/config.json").unwrap();
    assert_eq!(config.format, Some(IngestionFormat::Csv));
    assert_eq!(config.max_errors_before_bailing, 1);
    assert_eq!(config.sheets, SheetSelection::AllSheets);

    let opts = IngestionOptions::from_config(config);
    let result = ingest_from_path("tests/fixtures/timestamped.csv", &timestamped_validator(), &opts).unwrap();
    assert!(result.is_finished());
}

#[test]
fn config_rejects_unknown_keys_and_formats() {
    let err = IngestionConfig::from_json_str(r#"{ "max_errors": 3 }"#).unwrap_err();
    assert!(matches!(err, IngestionError::Config(_)));

    let err = IngestionConfig::from_json_str(r#"{ "format": "parquet" }"#).unwrap_err();
    assert!(err.to_string().starts_with("config error"));

    let config = IngestionConfig::from_json_str(r#"{ "sheets": { "sheets": ["A", "B"] } }"#).unwrap();
    assert_eq!(
        config.sheets,
        SheetSelection::Sheets(vec!["A".to_string(), "B".to_string()])
    );
    assert_eq!(config, IngestionConfig {
        sheets: config.sheets.clone(),
        ..Default::default()
    });
}

#[test]
fn request_runs_with_its_own_options() {
    let req = IngestionRequest {
        path: PathBuf::from("tests/fixtures/timestamped.csv"),
        options: IngestionOptions {
            max_errors_before_bailing: 3,
            ..Default::default()
        },
    };
    let validator = timestamped_validator();
    assert_eq!(req.run(&validator).unwrap(), req.run(&validator).unwrap());
    assert!(format!("{req:?}").contains("observer_set: false"));
}

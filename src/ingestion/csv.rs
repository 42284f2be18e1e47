//! Delimited-text row source.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{IngestionError, Result};
use crate::normalize::normalize_column_name;
use crate::types::{RawRow, RawValue};

/// Lazily reads a CSV source into [`RawRow`]s.
///
/// Rules:
///
/// - The first record is the header; each header is normalized with
///   [`normalize_column_name`].
/// - Each following record is zipped positionally against the headers. Every present cell is
///   kept verbatim as [`RawValue::Text`], empty ones included. Missing trailing values become
///   [`RawValue::Null`], extra values are ignored.
/// - `row_number` counts data records from 1; `source_partition` is always `None`.
///
/// The underlying reader is dropped as soon as the source is exhausted or yields an error.
pub struct CsvRowSource<R> {
    headers: Vec<String>,
    records: Option<csv::StringRecordsIntoIter<R>>,
    next_row_number: usize,
}

impl CsvRowSource<File> {
    /// Open a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let rdr = reader_builder().from_path(path)?;
        Self::from_csv_reader(rdr)
    }
}

impl<R: Read> CsvRowSource<R> {
    /// Read CSV data from any reader.
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::from_csv_reader(reader_builder().from_reader(reader))
    }

    /// Wrap an existing CSV reader. The reader must be configured with `has_headers(true)`.
    pub fn from_csv_reader(mut rdr: csv::Reader<R>) -> Result<Self> {
        let headers = rdr.headers()?.clone();
        if headers.is_empty() {
            return Err(IngestionError::MissingHeader {
                source_name: "csv input".to_string(),
            });
        }

        Ok(Self {
            headers: headers.iter().map(normalize_column_name).collect(),
            records: Some(rdr.into_records()),
            next_row_number: 1,
        })
    }

    /// Normalized header names, in source order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn build_row(&mut self, record: &csv::StringRecord) -> RawRow {
        let row_number = self.next_row_number;
        self.next_row_number += 1;

        if record.len() > self.headers.len() {
            tracing::warn!(
                row_number,
                fields = record.len(),
                headers = self.headers.len(),
                "csv record has more fields than the header; extra fields ignored"
            );
        }

        let mut row = RawRow::new(row_number, None);
        for (idx, header) in self.headers.iter().enumerate() {
            let value = match record.get(idx) {
                Some(s) => RawValue::Text(s.to_string()),
                None => RawValue::Null,
            };
            row.insert(header.clone(), value);
        }
        row
    }
}

impl<R: Read> Iterator for CsvRowSource<R> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.records.as_mut()?.next();
        match next {
            Some(Ok(record)) => Some(Ok(self.build_row(&record))),
            Some(Err(e)) => {
                self.records = None;
                Some(Err(e.into()))
            }
            None => {
                self.records = None;
                None
            }
        }
    }
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

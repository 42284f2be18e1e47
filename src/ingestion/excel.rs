#![cfg(feature = "excel")]

//! Spreadsheet row source.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, DataType, Range, Reader, Sheets};

use crate::error::{IngestionError, Result};
use crate::normalize::normalize_column_name;
use crate::types::{RawRow, RawValue};

use super::unified::SheetSelection;

/// Lazily reads the sheets of a workbook (`.xlsx`, `.xls`, `.ods`, etc.) into [`RawRow`]s.
///
/// Behavior:
/// - Sheets are read in workbook order (or in the order given by [`Self::select_sheets`]).
///   A sheet is only loaded once the previous one is exhausted.
/// - In each sheet the first row of the used range is the header. Its first cell is reserved for
///   the row-number column and discarded; the remaining headers are normalized.
/// - Every following row must start with an integer row-number cell; the row is reported as
///   `1 + that integer`. The remaining cells are zipped against the headers.
/// - `source_partition` is the sheet name. Native date/time cells come through as
///   [`RawValue::DateTime`].
/// - Sheets without any rows are skipped.
///
/// The workbook is dropped as soon as the last sheet is exhausted or an error is yielded.
pub struct ExcelRowSource<RS: Read + Seek> {
    workbook: Option<Sheets<RS>>,
    pending_sheets: VecDeque<String>,
    current: Option<SheetCursor>,
}

impl ExcelRowSource<BufReader<File>> {
    /// Open a workbook file; the format is detected from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(open_workbook_auto(path)?))
    }
}

impl<RS: Read + Seek + Clone> ExcelRowSource<RS> {
    /// Read a workbook from an in-memory or otherwise seekable source.
    pub fn from_reader(reader: RS) -> Result<Self> {
        Ok(Self::new(open_workbook_auto_from_rs(reader)?))
    }
}

impl<RS: Read + Seek> ExcelRowSource<RS> {
    fn new(workbook: Sheets<RS>) -> Self {
        let pending_sheets = workbook.sheet_names().into_iter().collect();
        Self {
            workbook: Some(workbook),
            pending_sheets,
            current: None,
        }
    }

    /// Restrict (and order) the sheets to read. Unknown sheet names are an error.
    pub fn select_sheets(mut self, selection: &SheetSelection) -> Result<Self> {
        let selected: Vec<String> = match selection {
            SheetSelection::AllSheets => return Ok(self),
            SheetSelection::Sheet(name) => vec![name.clone()],
            SheetSelection::Sheets(names) => names.clone(),
        };
        if let Some(missing) = selected.iter().find(|s| !self.pending_sheets.contains(s)) {
            return Err(IngestionError::SchemaMismatch {
                message: format!(
                    "sheet '{missing}' not found. sheets={:?}",
                    self.pending_sheets
                ),
            });
        }
        self.pending_sheets = selected.into();
        Ok(self)
    }

    /// Names of the sheets still to be read, in order.
    pub fn pending_sheets(&self) -> impl Iterator<Item = &str> {
        self.pending_sheets.iter().map(String::as_str)
    }

    fn finish(&mut self) {
        self.current = None;
        self.pending_sheets.clear();
        self.workbook = None;
    }
}

impl<RS: Read + Seek> Iterator for ExcelRowSource<RS> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cursor) = self.current.as_mut() {
                match cursor.rows.next() {
                    Some(cells) => {
                        let row = cursor.to_raw_row(cells);
                        if row.is_err() {
                            self.finish();
                        }
                        return Some(row);
                    }
                    None => {
                        tracing::debug!(sheet = %cursor.name, "finished sheet");
                        self.current = None;
                    }
                }
            }

            let Some(sheet) = self.pending_sheets.pop_front() else {
                self.finish();
                return None;
            };
            let workbook = self.workbook.as_mut()?;
            match workbook.worksheet_range(&sheet) {
                Ok(range) => {
                    self.current = SheetCursor::new(sheet, &range);
                }
                Err(e) => {
                    self.finish();
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

struct SheetCursor {
    name: String,
    headers: Vec<String>,
    rows: std::vec::IntoIter<Vec<Data>>,
}

impl SheetCursor {
    fn new(name: String, range: &Range<Data>) -> Option<Self> {
        let mut rows = range
            .rows()
            .map(<[Data]>::to_vec)
            .collect::<Vec<_>>()
            .into_iter();

        let Some(header) = rows.next() else {
            tracing::debug!(sheet = %name, "skipping empty sheet");
            return None;
        };
        let headers: Vec<String> = header
            .iter()
            .skip(1)
            .map(|c| normalize_column_name(&cell_to_header_string(c)))
            .collect();

        tracing::debug!(sheet = %name, rows = rows.len(), "reading sheet");
        Some(Self {
            name,
            headers,
            rows,
        })
    }

    fn to_raw_row(&self, cells: Vec<Data>) -> Result<RawRow> {
        let mut cells = cells.into_iter();
        let marker = cells.next().unwrap_or(Data::Empty);
        let row_number = row_number_from_cell(&marker).ok_or_else(|| {
            IngestionError::InvalidRowNumber {
                partition: self.name.clone(),
                raw: marker.to_string(),
            }
        })?;

        let mut row = RawRow::new(row_number, Some(self.name.clone()));
        for header in &self.headers {
            let cell = cells.next().unwrap_or(Data::Empty);
            row.insert(header.clone(), cell_to_raw_value(cell));
        }
        Ok(row)
    }
}

/// `1 + n` for a non-negative integer cell `n`.
fn row_number_from_cell(c: &Data) -> Option<usize> {
    let n = match c {
        Data::Int(i) => *i,
        Data::Float(f) if f.fract() == 0.0 && f.is_finite() => *f as i64,
        Data::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    usize::try_from(n).ok()?.checked_add(1)
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(f) => f.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => "".to_string(),
    }
}

fn cell_to_raw_value(c: Data) -> RawValue {
    match c {
        Data::Empty => RawValue::Null,
        Data::String(s) => RawValue::Text(s),
        Data::Int(i) => RawValue::Int(i),
        Data::Float(f) => RawValue::Float(f),
        Data::Bool(b) => RawValue::Bool(b),
        Data::DateTime(_) | Data::DateTimeIso(_) => match c.as_datetime() {
            Some(dt) => RawValue::DateTime(dt),
            None => RawValue::Text(c.to_string()),
        },
        Data::DurationIso(s) => RawValue::Text(s),
        Data::Error(e) => RawValue::Text(format!("{e:?}")),
    }
}

//! Spreadsheet import: recognized sheets (`CPI`, `Population`, `Agriculture`)
//! are converted row by row and appended to their collections.
//!
//! The whole workbook is parsed before anything is written, so a malformed
//! file or a workbook without a recognized sheet leaves every collection as
//! it was.

use std::io::Cursor;

use calamine::{Data, Range, Reader};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::data::record::{
    AgricultureRecord, CpiRecord, FieldValue, Fields, Kind, PopulationRecord, Record,
};
use crate::data::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to parse workbook: {0}")]
    Malformed(#[source] calamine::Error),
    #[error("Sheet must be named CPI, Population, or Agriculture")]
    NoMatchingSheet,
    /// Some kinds could not be stored. `report` lists the kinds that were.
    #[error("import incomplete after {rows} rows: {source}", rows = .report.total_rows)]
    Partial {
        report: ImportReport,
        source: StoreError,
    },
}

/// Rows extracted from one recognized sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSheet {
    pub kind: Kind,
    pub rows: Vec<Fields>,
    /// Header cells that are not fields of `kind`; their values are dropped.
    pub ignored_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedSheet {
    pub kind: Kind,
    pub sheet: String,
    pub rows: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored_columns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: Vec<ImportedSheet>,
    pub total_rows: usize,
}

impl ImportReport {
    pub fn kinds(&self) -> Vec<Kind> {
        self.imported.iter().map(|sheet| sheet.kind).collect()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.imported.iter().map(|sheet| sheet.kind.label()).collect()
    }
}

/// Parses `bytes` as a workbook and extracts every recognized sheet, in kind order.
pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<ParsedSheet>, ImportError> {
    let mut workbook =
        calamine::open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(ImportError::Malformed)?;
    let names = workbook.sheet_names();

    let mut sheets = Vec::new();
    for kind in Kind::ALL {
        if !names.iter().any(|name| name == kind.sheet_name()) {
            continue;
        }
        let range = workbook
            .worksheet_range(kind.sheet_name())
            .map_err(ImportError::Malformed)?;
        sheets.push(sheet_rows(kind, &range));
    }

    if sheets.is_empty() {
        return Err(ImportError::NoMatchingSheet);
    }
    Ok(sheets)
}

/// Parses the workbook and appends each recognized sheet to its collection.
///
/// Kinds are appended independently: a storage failure on one kind does not
/// stop the others, and the first such failure is returned once all have
/// been attempted together with the report of what did land.
pub fn import_workbook(store: &RecordStore, bytes: &[u8]) -> Result<ImportReport, ImportError> {
    let sheets = parse_workbook(bytes)?;

    let mut report = ImportReport::default();
    let mut first_failure: Option<StoreError> = None;
    for sheet in sheets {
        match append_sheet(store, &sheet) {
            Ok(rows) => {
                info!(kind = %sheet.kind, rows, "sheet imported");
                report.total_rows += rows;
                report.imported.push(ImportedSheet {
                    kind: sheet.kind,
                    sheet: sheet.kind.sheet_name().to_string(),
                    rows,
                    ignored_columns: sheet.ignored_columns,
                });
            }
            Err(err) => {
                error!(kind = %sheet.kind, error = %err, "sheet import failed");
                first_failure.get_or_insert(err);
            }
        }
    }

    match first_failure {
        Some(source) => Err(ImportError::Partial { report, source }),
        None => Ok(report),
    }
}

fn append_sheet(store: &RecordStore, sheet: &ParsedSheet) -> Result<usize, StoreError> {
    match sheet.kind {
        Kind::Cpi => append_rows::<CpiRecord>(store, &sheet.rows),
        Kind::Population => append_rows::<PopulationRecord>(store, &sheet.rows),
        Kind::Agriculture => append_rows::<AgricultureRecord>(store, &sheet.rows),
    }
}

fn append_rows<R: Record>(store: &RecordStore, rows: &[Fields]) -> Result<usize, StoreError> {
    let records: Vec<R> = rows.iter().map(R::from_fields).collect();
    store.append(&records)?;
    Ok(records.len())
}

/// First non-empty row is the header; each later non-empty row becomes one record.
fn sheet_rows(kind: Kind, range: &Range<Data>) -> ParsedSheet {
    let mut rows = range
        .rows()
        .skip_while(|row| row.iter().all(|cell| cell_value(cell).is_none()));

    let Some(header_row) = rows.next() else {
        return ParsedSheet {
            kind,
            rows: Vec::new(),
            ignored_columns: Vec::new(),
        };
    };

    let headers: Vec<Option<String>> = header_row
        .iter()
        .map(|cell| {
            let header = cell.to_string().trim().to_string();
            (!header.is_empty()).then_some(header)
        })
        .collect();

    let mut ignored_columns: Vec<String> = Vec::new();
    for header in headers.iter().flatten() {
        if !kind.fields().contains(&header.as_str()) && !ignored_columns.contains(header) {
            ignored_columns.push(header.clone());
        }
    }

    let rows = rows
        .filter_map(|row| {
            let fields: Fields = headers
                .iter()
                .zip(row)
                .filter_map(|(header, cell)| Some((header.clone()?, cell_value(cell)?)))
                .collect();
            (!fields.is_empty()).then_some(fields)
        })
        .collect();

    ParsedSheet {
        kind,
        rows,
        ignored_columns,
    }
}

fn cell_value(cell: &Data) -> Option<FieldValue> {
    match cell {
        Data::Empty => None,
        Data::String(text) if text.is_empty() => None,
        Data::String(text) => Some(FieldValue::Text(text.clone())),
        Data::Int(value) => Some(FieldValue::Int(*value)),
        Data::Float(value) => Some(FieldValue::from_f64(*value)),
        Data::Bool(value) => Some(FieldValue::Bool(*value)),
        other => Some(FieldValue::Text(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(cells: &[&[Data]]) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|row| row.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height.saturating_sub(1), width.saturating_sub(1)));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    #[test]
    fn header_row_maps_columns_to_fields() {
        let sheet = sheet_rows(
            Kind::Cpi,
            &range(&[
                &[text("state"), text("lga"), text("month"), text("year"), text("value")],
                &[text("Lagos"), text("Ikeja"), text("January"), Data::Float(2024.0), Data::Float(101.5)],
            ]),
        );
        assert_eq!(sheet.rows.len(), 1);
        let row = &sheet.rows[0];
        assert_eq!(row["state"], FieldValue::Text("Lagos".into()));
        assert_eq!(row["year"], FieldValue::Int(2024));
        assert_eq!(row["value"], FieldValue::Float(101.5));
        assert!(sheet.ignored_columns.is_empty());
    }

    #[test]
    fn blank_rows_and_cells_are_skipped() {
        let sheet = sheet_rows(
            Kind::Agriculture,
            &range(&[
                &[Data::Empty, Data::Empty],
                &[text(" crop "), text("value")],
                &[text("Yam"), Data::Empty],
                &[Data::Empty, Data::Empty],
                &[text("Rice"), Data::Int(40)],
            ]),
        );
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].get("crop"), Some(&FieldValue::Text("Yam".into())));
        assert!(!sheet.rows[0].contains_key("value"));
        assert_eq!(sheet.rows[1]["value"], FieldValue::Int(40));
    }

    #[test]
    fn whitespace_cells_are_kept() {
        let sheet = sheet_rows(
            Kind::Agriculture,
            &range(&[&[text("crop"), text("lga")], &[text("Yam"), text(" ")]]),
        );
        assert_eq!(sheet.rows[0]["lga"], FieldValue::Text(" ".into()));
    }

    #[test]
    fn unknown_headers_are_reported_once() {
        let sheet = sheet_rows(
            Kind::Agriculture,
            &range(&[
                &[text("crop"), text("notes"), Data::Empty, text("notes")],
                &[text("Maize"), text("dry season"), text("orphan"), text("again")],
            ]),
        );
        assert_eq!(sheet.ignored_columns, vec!["notes".to_string()]);
        let record = AgricultureRecord::from_fields(&sheet.rows[0]);
        assert_eq!(record.crop, Some("Maize".into()));
        assert_eq!(record.value, None);
    }

    #[test]
    fn empty_sheet_has_no_rows() {
        let sheet = sheet_rows(Kind::Population, &Range::empty());
        assert!(sheet.rows.is_empty());
    }

    #[test]
    fn unparseable_bytes_are_malformed() {
        let err = parse_workbook(b"definitely not a spreadsheet").unwrap_err();
        assert!(matches!(err, ImportError::Malformed(_)));
    }
}

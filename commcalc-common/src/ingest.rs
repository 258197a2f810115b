//! Upload ingest: CSV and spreadsheet bytes into a raw table
//!
//! Cells are kept exactly as exported (strings with `$`, `,`, `%` decorations,
//! numbers, or blanks). All numeric interpretation happens later in
//! [`crate::report::coerce`].

use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// A single cell as parsed from the upload
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
}

impl RawCell {
    /// Cell rendered as text (numbers via `Display`, blanks as "")
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            RawCell::Empty => Cow::Borrowed(""),
            RawCell::Text(s) => Cow::Borrowed(s.as_str()),
            RawCell::Number(n) => Cow::Owned(n.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            RawCell::Number(_) => false,
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(value.to_string())
        }
    }
}

/// Uploaded table with vendor headers, untouched
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    /// Build a table from string headers and string rows
    pub fn from_strings<H, R>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: IntoIterator,
        <R::Item as IntoIterator>::Item: AsRef<str>,
    {
        Self {
            headers: headers.into_iter().map(|h| h.as_ref().to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|c| RawCell::from(c.as_ref())).collect())
                .collect(),
        }
    }

    /// Cell at (row, column); missing trailing cells read as blank
    pub fn cell(&self, row: usize, column: usize) -> &RawCell {
        static EMPTY: RawCell = RawCell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }
}

/// Upload file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Csv,
    /// xlsx / xlsm / xls / ods workbook (first worksheet)
    Xlsx,
}

impl InputFormat {
    /// Parse a format name or file extension
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" | "txt" => Some(InputFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(InputFormat::Xlsx),
            _ => None,
        }
    }

    /// Detect format from a file path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_name)
    }

    /// Guess the format from leading bytes: zip (xlsx, ods) and OLE (xls)
    /// containers are workbooks, anything else is treated as CSV
    pub fn sniff(bytes: &[u8]) -> Self {
        const ZIP: &[u8] = b"PK\x03\x04";
        const OLE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
        if bytes.starts_with(ZIP) || bytes.starts_with(OLE) {
            InputFormat::Xlsx
        } else {
            InputFormat::Csv
        }
    }
}

/// Read an upload in the given format
///
/// `header_row` is the 0-based row holding the real header for spreadsheets;
/// CSV uploads always carry their header on the first line.
pub fn read_table(bytes: Vec<u8>, format: InputFormat, header_row: usize) -> Result<RawTable> {
    match format {
        InputFormat::Csv => read_csv(&bytes),
        InputFormat::Xlsx => read_spreadsheet(bytes, header_row),
    }
}

/// Parse CSV bytes; ragged rows are accepted and padded on access
pub fn read_csv(bytes: &[u8]) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::Ingest("CSV upload has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<RawCell> = record.iter().map(RawCell::from).collect();
        if row.iter().all(RawCell::is_empty) {
            continue;
        }
        rows.push(row);
    }

    debug!(columns = headers.len(), rows = rows.len(), "Parsed CSV upload");
    Ok(RawTable { headers, rows })
}

/// Parse workbook bytes, taking the header from `header_row` of the first sheet
pub fn read_spreadsheet(bytes: Vec<u8>, header_row: usize) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| Error::Spreadsheet(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::Spreadsheet("Workbook contains no worksheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::Spreadsheet(format!("{}: {}", sheet_name, e)))?;

    // Range rows begin at the first used row, not at absolute row 0
    let first_used = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows_iter = range.rows().skip(header_row.saturating_sub(first_used));

    let header = rows_iter.next().ok_or_else(|| {
        Error::Ingest(format!(
            "Header row {} not found in sheet '{}'",
            header_row + 1,
            sheet_name
        ))
    })?;
    let headers: Vec<String> = header.iter().map(|c| cell_to_raw(c).as_text().into_owned()).collect();

    let rows: Vec<Vec<RawCell>> = rows_iter
        .map(|row| row.iter().map(cell_to_raw).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(RawCell::is_empty))
        .collect();

    debug!(
        sheet = %sheet_name,
        columns = headers.len(),
        rows = rows.len(),
        "Parsed spreadsheet upload"
    );
    Ok(RawTable { headers, rows })
}

fn cell_to_raw(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(n) => RawCell::Number(*n as f64),
        Data::String(s) => RawCell::from(s.as_str()),
        other => RawCell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_keeps_decorations_and_whitespace_headers() {
        let csv = " Employee Full Name ,GP,VZ Perks Rate\nJosh Ordonez,\"$1,200.50\",56%\n";
        let table = read_csv(csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec![" Employee Full Name ", "GP", "VZ Perks Rate"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, 1), &RawCell::Text("$1,200.50".to_string()));
        assert_eq!(table.cell(0, 2), &RawCell::Text("56%".to_string()));
    }

    #[test]
    fn test_csv_ragged_rows_pad_as_blank() {
        let csv = "A,B,C\n1,2\n";
        let table = read_csv(csv.as_bytes()).unwrap();

        assert_eq!(table.cell(0, 2), &RawCell::Empty);
        assert_eq!(table.cell(5, 0), &RawCell::Empty);
    }

    #[test]
    fn test_csv_skips_blank_lines() {
        let csv = "A,B\n1,2\n,\n3,4\n";
        let table = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_csv_without_header_is_rejected() {
        let err = read_csv(b"").unwrap_err();
        assert!(matches!(err, Error::Ingest(_)));
    }

    #[test]
    fn test_garbage_workbook_is_spreadsheet_error() {
        let err = read_spreadsheet(b"not a workbook".to_vec(), 1).unwrap_err();
        assert!(matches!(err, Error::Spreadsheet(_)));
    }

    fn two_row_workbook(first_row: u32) -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(first_row, 0, "Employee Full Name").unwrap();
        sheet.write_string(first_row, 1, "GP").unwrap();
        sheet.write_string(first_row + 1, 0, "Ana Lopez").unwrap();
        sheet.write_number(first_row + 1, 1, 1234.5).unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_workbook_header_row_is_absolute() {
        // Rows above the header are blank, so the used range starts at row 2
        let table = read_spreadsheet(two_row_workbook(2), 2).unwrap();

        assert_eq!(table.headers, vec!["Employee Full Name", "GP"]);
        assert_eq!(table.cell(0, 0), &RawCell::Text("Ana Lopez".to_string()));
        assert_eq!(table.cell(0, 1), &RawCell::Number(1234.5));
    }

    #[test]
    fn test_workbook_header_row_past_end_is_ingest_error() {
        let err = read_spreadsheet(two_row_workbook(0), 5).unwrap_err();
        assert!(matches!(err, Error::Ingest(_)));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(InputFormat::from_name("CSV"), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_name(".xlsx"), Some(InputFormat::Xlsx));
        assert_eq!(InputFormat::from_name("ods"), Some(InputFormat::Xlsx));
        assert_eq!(InputFormat::from_name("pdf"), None);
        assert_eq!(
            InputFormat::from_path(Path::new("/tmp/report.XLSX")),
            Some(InputFormat::Xlsx)
        );
    }

    #[test]
    fn test_sniff() {
        assert_eq!(InputFormat::sniff(b"PK\x03\x04rest"), InputFormat::Xlsx);
        assert_eq!(InputFormat::sniff(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1]), InputFormat::Xlsx);
        assert_eq!(InputFormat::sniff(b"Employee Full Name,GA"), InputFormat::Csv);
        assert_eq!(InputFormat::sniff(b""), InputFormat::Csv);
    }
}

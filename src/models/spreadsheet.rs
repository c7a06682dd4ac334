use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier and URL returned by the spreadsheet create call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpreadsheetRef {
    pub id: String,
    pub url: String,
}

/// A header row plus data rows, all cells kept as opaque strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }
}

pub trait ToSheetRows {
    /// Convert to the row-major cell grid the Sheets API expects.
    fn to_sheet_rows(&self) -> Vec<Vec<Value>>;
}

impl ToSheetRows for SheetTable {
    fn to_sheet_rows(&self) -> Vec<Vec<Value>> {
        std::iter::once(&self.header)
            .chain(self.rows.iter())
            .map(|row| to_cells(row))
            .collect()
    }
}

impl ToSheetRows for [Vec<String>] {
    fn to_sheet_rows(&self) -> Vec<Vec<Value>> {
        self.iter().map(|row| to_cells(row)).collect()
    }
}

fn to_cells(row: &[String]) -> Vec<Value> {
    row.iter().map(|cell| Value::String(cell.clone())).collect()
}

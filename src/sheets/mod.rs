mod client;
mod writer;

pub use client::SheetsClient;
pub use writer::SpreadsheetWriter;

#[cfg(test)]
pub(crate) use writer::mocks;

use crate::error::Result;
use crate::models::SpreadsheetRef;
use async_trait::async_trait;
use serde_json::Value;

/// Range written on a fresh spreadsheet: top-left of the first sheet
pub const DATA_RANGE: &str = "A1";

#[async_trait]
pub trait SpreadsheetApi {
    async fn create_spreadsheet(&self, title: &str) -> Result<SpreadsheetRef>;

    /// Overwrite `range` with `values` in a single batch update
    async fn batch_write(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<()>;

    /// Insert `values` as new rows after the table found at `range`
    async fn append(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<()>;
}

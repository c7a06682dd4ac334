use super::{DATA_RANGE, SpreadsheetApi};
use crate::error::Result;
use crate::models::{SheetTable, SpreadsheetRef, ToSheetRows};
use tracing::{debug, info, instrument};

pub struct SpreadsheetWriter<S> {
    api: S,
}

impl<S> SpreadsheetWriter<S>
where
    S: SpreadsheetApi + Sync,
{
    pub fn new(api: S) -> Self {
        Self { api }
    }

    /// Create a new spreadsheet
    pub async fn create(&self, title: &str) -> Result<SpreadsheetRef> {
        self.api.create_spreadsheet(title).await
    }

    /// Create a new spreadsheet titled `title` holding `table`.
    ///
    /// Always creates a new file, even if one with the same title exists. If
    /// the write fails the created spreadsheet is left behind empty.
    #[instrument(name = "Creating and populating spreadsheet", skip(self, table))]
    pub async fn create_and_populate(
        &self,
        title: &str,
        table: &SheetTable,
    ) -> Result<SpreadsheetRef> {
        let spreadsheet = self.api.create_spreadsheet(title).await?;

        self.api
            .batch_write(&spreadsheet.id, DATA_RANGE, table.to_sheet_rows())
            .await?;

        info!(url = %spreadsheet.url, rows = table.rows.len(), "Spreadsheet populated");

        Ok(spreadsheet)
    }

    /// Append `rows` below the existing data of the first sheet
    #[instrument(name = "Appending to spreadsheet", skip(self, rows))]
    pub async fn append_rows(&self, spreadsheet_id: &str, rows: &[Vec<String>]) -> Result<bool> {
        if rows.is_empty() {
            debug!("Nothing to append");
            return Ok(true);
        }

        self.api
            .append(spreadsheet_id, DATA_RANGE, rows.to_sheet_rows())
            .await?;

        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod mocks {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum SheetsCall {
        Create(String),
        BatchWrite {
            id: String,
            range: String,
            values: Vec<Vec<Value>>,
        },
        Append {
            id: String,
            range: String,
            values: Vec<Vec<Value>>,
        },
    }

    #[derive(Clone, Default)]
    pub(crate) struct MockSheetsApi {
        pub calls: Arc<Mutex<Vec<SheetsCall>>>,
        pub fail_writes: bool,
    }

    #[async_trait]
    impl SpreadsheetApi for MockSheetsApi {
        async fn create_spreadsheet(&self, title: &str) -> Result<SpreadsheetRef> {
            self.calls
                .lock()
                .unwrap()
                .push(SheetsCall::Create(title.to_string()));
            Ok(SpreadsheetRef {
                id: "sheet-123".to_string(),
                url: "https://docs.google.com/spreadsheets/d/sheet-123/edit".to_string(),
            })
        }

        async fn batch_write(
            &self,
            spreadsheet_id: &str,
            range: &str,
            values: Vec<Vec<Value>>,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(SheetsCall::BatchWrite {
                id: spreadsheet_id.to_string(),
                range: range.to_string(),
                values,
            });
            match self.fail_writes {
                true => Err(AppError::Sheets("Failed to write values: 403".to_string())),
                false => Ok(()),
            }
        }

        async fn append(
            &self,
            spreadsheet_id: &str,
            range: &str,
            values: Vec<Vec<Value>>,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(SheetsCall::Append {
                id: spreadsheet_id.to_string(),
                range: range.to_string(),
                values,
            });
            Ok(())
        }
    }
}

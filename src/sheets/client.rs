use super::SpreadsheetApi;
use crate::error::{AppError, Result};
use crate::google::GoogleAuth;
use crate::models::SpreadsheetRef;
use async_trait::async_trait;
use google_sheets4::api::{
    BatchUpdateValuesRequest, Scope, Sheets, Spreadsheet, SpreadsheetProperties, ValueRange,
};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use serde_json::Value;
use tracing::{debug, instrument};

const AUTH_SCOPE: Scope = Scope::Spreadsheet;

pub struct SheetsClient {
    hub: Sheets<HttpsConnector<HttpConnector>>,
}

impl SheetsClient {
    /// Create a new SheetsClient with authenticated access
    #[instrument(name = "Authenticating to Google Sheets", skip_all)]
    pub async fn new(auth: &GoogleAuth) -> Result<Self> {
        let access_token = auth.access_token().await?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| AppError::Config(format!("Failed to load native TLS roots: {}", e)))?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);

        Ok(Self {
            hub: Sheets::new(client, access_token),
        })
    }
}

#[async_trait]
impl SpreadsheetApi for SheetsClient {
    #[instrument(name = "Creating new spreadsheet", skip(self))]
    async fn create_spreadsheet(&self, title: &str) -> Result<SpreadsheetRef> {
        let spreadsheet = Spreadsheet {
            properties: Some(SpreadsheetProperties {
                title: Some(title.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let (_, result) = self
            .hub
            .spreadsheets()
            .create(spreadsheet)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to create spreadsheet: {}", e)))?;

        let id = result
            .spreadsheet_id
            .ok_or_else(|| AppError::Sheets("Created spreadsheet has empty ID".to_string()))?;

        let url = result
            .spreadsheet_url
            .ok_or_else(|| AppError::Sheets("Created spreadsheet has empty URL".to_string()))?;

        debug!(id = %id, "Created spreadsheet");

        Ok(SpreadsheetRef { id, url })
    }

    #[instrument(name = "Writing values", skip(self, values), fields(rows = values.len()))]
    async fn batch_write(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<()> {
        let request = BatchUpdateValuesRequest {
            value_input_option: Some("RAW".to_string()),
            data: Some(vec![ValueRange {
                major_dimension: Some("ROWS".to_string()),
                range: Some(range.to_string()),
                values: Some(values),
            }]),
            ..Default::default()
        };

        self.hub
            .spreadsheets()
            .values_batch_update(request, spreadsheet_id)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to write values: {}", e)))?;

        Ok(())
    }

    #[instrument(name = "Appending rows", skip(self, values), fields(rows = values.len()))]
    async fn append(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<()> {
        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: None,
            values: Some(values),
        };

        self.hub
            .spreadsheets()
            .values_append(value_range, spreadsheet_id, range)
            .value_input_option("RAW")
            .insert_data_option("INSERT_ROWS")
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to append rows: {}", e)))?;

        Ok(())
    }
}

use crate::error::{AppError, Result};
use crate::gmail::resolve_sheet_url;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const DEFAULT_EMAIL_SUBJECT: &str = "Google Sheet link";
const DEFAULT_EMAIL_MESSAGE: &str = "Here is the link to the Google Sheet.";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CreateSheetInput {
    pub title: String,
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateSheetOutput {
    pub spreadsheet_id: String,
    pub spreadsheet_url: String,
}

/// Agents name the recipient either way and sometimes only embed the URL in
/// the message text, so both are accepted here.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SendSheetLinkEmailInput {
    #[serde(default)]
    pub to_email: Option<String>,
    #[serde(default)]
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub sheet_url: Option<String>,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_subject() -> String {
    DEFAULT_EMAIL_SUBJECT.to_string()
}

fn default_message() -> String {
    DEFAULT_EMAIL_MESSAGE.to_string()
}

/// A sheet-link email with every field resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLinkEmail {
    pub to_email: String,
    pub subject: String,
    pub sheet_url: String,
    pub message: String,
}

impl SendSheetLinkEmailInput {
    pub fn resolve(self) -> Result<SheetLinkEmail> {
        let to_email = [self.to_email, self.recipient_email]
            .into_iter()
            .flatten()
            .map(|email| email.trim().to_string())
            .find(|email| !email.is_empty())
            .ok_or_else(|| {
                AppError::Validation("to_email or recipient_email is required".to_string())
            })?;

        let sheet_url = resolve_sheet_url(self.sheet_url.as_deref(), &self.message)?;

        Ok(SheetLinkEmail {
            to_email,
            subject: self.subject,
            sheet_url,
            message: self.message,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SendEmailOutput {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SendTelegramMessageInput {
    /// Numeric chat id or `@channelusername`
    #[serde(deserialize_with = "string_or_number")]
    pub chat_id: String,
    pub text: String,
    #[serde(default)]
    pub parse_mode: Option<String>,
}

impl SendTelegramMessageInput {
    /// Accept the arguments either bare or wrapped as `{"input": {...}}`
    pub(super) fn unwrap_args(args: Value) -> Value {
        match args {
            Value::Object(mut map) if map.contains_key("input") => {
                map.remove("input").unwrap_or(Value::Null)
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SendTelegramMessageOutput {
    pub status: String,
    pub message_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CreateGsheetInput {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateGsheetOutput {
    pub sheet_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppendGsheetRowsInput {
    pub sheet_id: String,
    pub values: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SendGmailInput {
    pub to: String,
    pub subject: String,
    pub body_html: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OkOutput {
    pub ok: bool,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

pub mod types;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::gmail::{self, EmailSender};
use crate::google::GoogleAuth;
use crate::models::{OutboundEmail, SheetTable};
use crate::sheets::{SheetsClient, SpreadsheetApi, SpreadsheetWriter};
use crate::telegram::{ChatSender, SendMessageRequest, TelegramClient};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, instrument};
use types::{
    AppendGsheetRowsInput, CreateGsheetInput, CreateGsheetOutput, CreateSheetInput,
    CreateSheetOutput, OkOutput, SendEmailOutput, SendGmailInput, SendSheetLinkEmailInput,
    SendTelegramMessageInput, SendTelegramMessageOutput, SheetLinkEmail,
};

pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
}

pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "create_sheet",
        description: "Create a Google Sheet and populate it with header + rows",
    },
    ToolSpec {
        name: "send_sheet_link_email",
        description: "Email a Google Sheet link (URL may be embedded in the message)",
    },
    ToolSpec {
        name: "send_telegram_message",
        description: "Send a message to a Telegram chat",
    },
    ToolSpec {
        name: "create_gsheet",
        description: "Create an empty Google Sheet and return its id + url",
    },
    ToolSpec {
        name: "append_gsheet_rows",
        description: "Append rows to an existing Google Sheet",
    },
    ToolSpec {
        name: "send_gmail",
        description: "Send an HTML email",
    },
];

/// A tool invocation with its arguments parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    CreateSheet(CreateSheetInput),
    SendSheetLinkEmail(SendSheetLinkEmailInput),
    SendTelegramMessage(SendTelegramMessageInput),
    CreateGsheet(CreateGsheetInput),
    AppendGsheetRows(AppendGsheetRowsInput),
    SendGmail(SendGmailInput),
}

impl ToolCall {
    pub fn parse(name: &str, args: Value) -> Result<Self> {
        Ok(match name {
            "create_sheet" => ToolCall::CreateSheet(parse_args(name, args)?),
            "send_sheet_link_email" => ToolCall::SendSheetLinkEmail(parse_args(name, args)?),
            "send_telegram_message" => ToolCall::SendTelegramMessage(parse_args(
                name,
                SendTelegramMessageInput::unwrap_args(args),
            )?),
            "create_gsheet" => ToolCall::CreateGsheet(parse_args(name, args)?),
            "append_gsheet_rows" => ToolCall::AppendGsheetRows(parse_args(name, args)?),
            "send_gmail" => ToolCall::SendGmail(parse_args(name, args)?),
            other => {
                return Err(AppError::Validation(format!("unknown tool '{}'", other)));
            }
        })
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| AppError::Validation(format!("{}: invalid arguments: {}", tool, e)))
}

fn to_value<T: Serialize>(output: T) -> Result<Value> {
    Ok(serde_json::to_value(output)?)
}

/// Run `call` against the real providers configured in `config`
#[instrument(name = "Invoking tool", skip_all)]
pub async fn invoke(config: &Config, call: ToolCall) -> Result<Value> {
    match call {
        ToolCall::CreateSheet(input) => {
            let writer = sheets_writer(config).await?;
            to_value(create_sheet(&writer, input).await?)
        }
        ToolCall::CreateGsheet(input) => {
            let writer = sheets_writer(config).await?;
            to_value(create_gsheet(&writer, input).await?)
        }
        ToolCall::AppendGsheetRows(input) => {
            let writer = sheets_writer(config).await?;
            to_value(append_gsheet_rows(&writer, input).await?)
        }
        ToolCall::SendSheetLinkEmail(input) => {
            // Validate before any credential or network work
            let email = input.resolve()?;
            let mailer = gmail::sender_from_config(config).await?;
            to_value(send_sheet_link_email(mailer.as_ref(), email).await?)
        }
        ToolCall::SendGmail(input) => {
            let mailer = gmail::sender_from_config(config).await?;
            to_value(send_gmail(mailer.as_ref(), input).await?)
        }
        ToolCall::SendTelegramMessage(input) => {
            let client = TelegramClient::new(&config.telegram)?;
            to_value(send_telegram_message(&client, input).await?)
        }
    }
}

async fn sheets_writer(config: &Config) -> Result<SpreadsheetWriter<SheetsClient>> {
    let auth = GoogleAuth::from_config(&config.google)?;
    let client = SheetsClient::new(&auth).await?;
    Ok(SpreadsheetWriter::new(client))
}

pub async fn create_sheet<S>(
    writer: &SpreadsheetWriter<S>,
    input: CreateSheetInput,
) -> Result<CreateSheetOutput>
where
    S: SpreadsheetApi + Sync,
{
    let table = SheetTable::new(input.header, input.rows);
    let spreadsheet = writer.create_and_populate(&input.title, &table).await?;

    Ok(CreateSheetOutput {
        spreadsheet_id: spreadsheet.id,
        spreadsheet_url: spreadsheet.url,
    })
}

pub async fn create_gsheet<S>(
    writer: &SpreadsheetWriter<S>,
    input: CreateGsheetInput,
) -> Result<CreateGsheetOutput>
where
    S: SpreadsheetApi + Sync,
{
    let spreadsheet = writer.create(&input.title).await?;

    Ok(CreateGsheetOutput {
        sheet_id: spreadsheet.id,
        url: spreadsheet.url,
    })
}

pub async fn append_gsheet_rows<S>(
    writer: &SpreadsheetWriter<S>,
    input: AppendGsheetRowsInput,
) -> Result<OkOutput>
where
    S: SpreadsheetApi + Sync,
{
    let ok = writer.append_rows(&input.sheet_id, &input.values).await?;
    Ok(OkOutput { ok })
}

pub async fn send_sheet_link_email<M>(mailer: &M, email: SheetLinkEmail) -> Result<SendEmailOutput>
where
    M: EmailSender + Sync + ?Sized,
{
    let status = gmail::send_sheet_link_email(
        mailer,
        &email.to_email,
        &email.subject,
        &email.sheet_url,
        &email.message,
    )
    .await?;
    info!(%status);

    Ok(SendEmailOutput { status })
}

pub async fn send_gmail<M>(mailer: &M, input: SendGmailInput) -> Result<OkOutput>
where
    M: EmailSender + Sync + ?Sized,
{
    let email = OutboundEmail::html(input.to, input.subject, input.body_html);
    mailer.send(&email).await?;

    Ok(OkOutput { ok: true })
}

pub async fn send_telegram_message<C>(
    chat: &C,
    input: SendTelegramMessageInput,
) -> Result<SendTelegramMessageOutput>
where
    C: ChatSender + Sync + ?Sized,
{
    let request = SendMessageRequest {
        chat_id: input.chat_id,
        text: input.text,
        parse_mode: input.parse_mode,
    };
    let message_id = chat.send_message(&request).await?;

    Ok(SendTelegramMessageOutput {
        status: "sent".to_string(),
        message_id: Some(message_id),
    })
}

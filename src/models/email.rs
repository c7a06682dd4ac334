use crate::error::{AppError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, SinglePart};

// RFC 2045 line length for base64 bodies
const BASE64_LINE_LEN: usize = 76;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Plain,
    Html,
}

impl BodyKind {
    fn mime_type(self) -> &'static str {
        match self {
            BodyKind::Plain => "text/plain",
            BodyKind::Html => "text/html",
        }
    }
}

/// A single-part message, built once and sent once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub kind: BodyKind,
}

impl OutboundEmail {
    pub fn plain(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            kind: BodyKind::Plain,
        }
    }

    pub fn html(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            kind: BodyKind::Html,
        }
    }

    fn recipient(&self) -> Result<Mailbox> {
        self.to
            .parse()
            .map_err(|e| AppError::Validation(format!("invalid recipient '{}': {}", self.to, e)))
    }

    /// RFC 2822 message for the Gmail API. The sender is filled in by Gmail.
    pub fn to_rfc2822(&self) -> Result<String> {
        let to = self.recipient()?;

        let encoded_body = STANDARD.encode(self.body.as_bytes());
        let wrapped_body = encoded_body
            .as_bytes()
            .chunks(BASE64_LINE_LEN)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("\r\n");

        Ok(format!(
            "To: {to}\r\n\
             Subject: {subject}\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: {mime}; charset=\"utf-8\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             {wrapped_body}\r\n",
            subject = encode_header(&self.subject),
            mime = self.kind.mime_type(),
        ))
    }

    /// Message for SMTP submission from `from`
    pub fn to_lettre(&self, from: &str) -> Result<lettre::Message> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| AppError::Config(format!("invalid sender '{}': {}", from, e)))?;

        let content_type = match self.kind {
            BodyKind::Plain => ContentType::TEXT_PLAIN,
            BodyKind::Html => ContentType::TEXT_HTML,
        };
        let part = SinglePart::builder()
            .content_type(content_type)
            .body(self.body.clone());

        lettre::Message::builder()
            .from(from)
            .to(self.recipient()?)
            .subject(self.subject.clone())
            .singlepart(part)
            .map_err(|e| AppError::Smtp(format!("email build: {}", e)))
    }
}

/// RFC 2047 encoded-word for non-ASCII header values
fn encode_header(value: &str) -> String {
    // Header injection guard
    let value = value.replace(['\r', '\n'], " ");
    if value.is_ascii() {
        value
    } else {
        format!("=?utf-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

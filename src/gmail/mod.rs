mod api;
mod smtp;

pub use api::GmailApiClient;
pub use smtp::SmtpClient;

use crate::config::{Config, GoogleAuthMode, MailTransport};
use crate::error::{AppError, Result};
use crate::google::GoogleAuth;
use crate::models::OutboundEmail;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static SHEET_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://docs\.google\.com/spreadsheets/[^\s)]+").expect("valid sheet URL regex")
});

#[async_trait]
pub trait EmailSender {
    /// Send `email`, returning the provider's message id when it reports one
    async fn send(&self, email: &OutboundEmail) -> Result<Option<String>>;
}

/// Build the sender for the configured mail transport
pub async fn sender_from_config(config: &Config) -> Result<Box<dyn EmailSender + Send + Sync>> {
    match config.mail.transport {
        MailTransport::Smtp => {
            let (sender, app_password) = config.mail.smtp_credentials()?;
            Ok(Box::new(SmtpClient::new(
                &config.mail.smtp_host,
                config.mail.smtp_port,
                sender,
                app_password,
            )?))
        }
        MailTransport::GmailApi => {
            let auth = GoogleAuth::from_config(&config.google)?;
            if auth.mode() == GoogleAuthMode::ServiceAccount {
                return Err(AppError::Config(
                    "The Gmail API transport needs user OAuth; set MAIL_TRANSPORT=smtp when \
                     using a service account"
                        .to_string(),
                ));
            }
            Ok(Box::new(GmailApiClient::new(&auth).await?))
        }
    }
}

/// First spreadsheet URL found in free text
pub fn extract_sheet_url(text: &str) -> Option<&str> {
    SHEET_URL_PATTERN.find(text).map(|m| m.as_str())
}

/// Use `explicit` if given, otherwise look for a spreadsheet URL in `text`
pub fn resolve_sheet_url(explicit: Option<&str>, text: &str) -> Result<String> {
    explicit
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .or_else(|| extract_sheet_url(text))
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::Validation(
                "sheet_url is missing and could not be parsed from message".to_string(),
            )
        })
}

pub fn sheet_link_body(message: &str, sheet_url: &str) -> String {
    format!("{}\n\nGoogle Sheet link: {}", message, sheet_url)
}

/// Send `message` plus the sheet link as a plain-text email
pub async fn send_sheet_link_email<M>(
    mailer: &M,
    to_email: &str,
    subject: &str,
    sheet_url: &str,
    message: &str,
) -> Result<String>
where
    M: EmailSender + Sync + ?Sized,
{
    let email = OutboundEmail::plain(to_email, subject, sheet_link_body(message, sheet_url));
    let message_id = mailer.send(&email).await?;

    Ok(format!(
        "Email sent to {} (message id: {})",
        to_email,
        message_id.unwrap_or_default()
    ))
}


#[cfg(test)]
mod tests {
    use super::mocks::MockMailer;
    use super::*;
    use crate::models::BodyKind;
    use tempfile::TempDir;

    const URL: &str = "https://docs.google.com/spreadsheets/d/1AbC_dEf-123/edit";

    #[test]
    fn test_extracts_exact_url_from_text() {
        let text = format!("Here you go: {} enjoy", URL);
        assert_eq!(extract_sheet_url(&text), Some(URL));
    }

    #[test]
    fn test_extraction_stops_at_closing_paren() {
        let text = format!("(see {})", URL);
        assert_eq!(extract_sheet_url(&text), Some(URL));
    }

    #[test]
    fn test_first_url_wins() {
        let second = "https://docs.google.com/spreadsheets/d/other";
        let text = format!("{} and {}", URL, second);
        assert_eq!(extract_sheet_url(&text), Some(URL));
    }

    #[test]
    fn test_other_urls_are_ignored() {
        assert_eq!(
            extract_sheet_url("https://docs.google.com/document/d/123 https://example.com"),
            None
        );
    }

    #[test]
    fn test_explicit_url_takes_precedence() {
        let text = format!("link {}", URL);
        assert_eq!(
            resolve_sheet_url(Some("https://example.com/x"), &text).unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_blank_explicit_url_falls_back_to_text() {
        let text = format!("link {}", URL);
        assert_eq!(resolve_sheet_url(Some("  "), &text).unwrap(), URL);
    }

    #[test]
    fn test_no_url_anywhere_is_validation_error() {
        let err = resolve_sheet_url(None, "no link here").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_send_sheet_link_email() {
        let mailer = MockMailer::default();

        let status = send_sheet_link_email(&mailer, "a@example.com", "Standings", URL, "Hi")
            .await
            .unwrap();

        assert_eq!(status, "Email sent to a@example.com (message id: msg-42)");
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, BodyKind::Plain);
        assert_eq!(sent[0].subject, "Standings");
        assert_eq!(sent[0].body, format!("Hi\n\nGoogle Sheet link: {}", URL));
    }

    #[tokio::test]
    async fn test_send_failure_propagates() {
        let mailer = MockMailer {
            fail: true,
            ..Default::default()
        };

        let err = send_sheet_link_email(&mailer, "a@example.com", "S", URL, "Hi")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Gmail(_)));
    }

    #[tokio::test]
    async fn test_smtp_transport_requires_credentials() {
        let mut config = Config::default();
        config.mail.transport = MailTransport::Smtp;

        let err = sender_from_config(&config).await.err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_gmail_api_with_service_account_is_config_error() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("sa.json");
        std::fs::write(&key_file, "{}").unwrap();

        let mut config = Config::default();
        config.google.auth_mode = GoogleAuthMode::ServiceAccount;
        config.google.service_account_file = Some(key_file);
        config.mail.transport = MailTransport::GmailApi;

        let err = sender_from_config(&config).await.err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }
}

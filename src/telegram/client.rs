use super::ChatSender;
use super::types::{ApiResponse, SendMessageRequest, SentMessage};
use crate::config::TelegramConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TelegramClient {
    client: Client,
    api_base_url: String,
}

impl TelegramClient {
    /// Fails before any network call when the bot token is not configured
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let token = config.bot_token()?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Telegram(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base_url: format!("{}/bot{}", config.api_base.trim_end_matches('/'), token),
        })
    }
}

#[async_trait]
impl ChatSender for TelegramClient {
    #[instrument(name = "Sending Telegram message", skip_all, fields(chat_id = %request.chat_id))]
    async fn send_message(&self, request: &SendMessageRequest) -> Result<i64> {
        let url = format!("{}/sendMessage", self.api_base_url);

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // Telegram reports failures as {"ok": false, "description": ...}
        let parsed: Option<ApiResponse<SentMessage>> = serde_json::from_str(&body).ok();

        let message = match parsed {
            Some(ApiResponse {
                ok: true,
                result: Some(message),
                ..
            }) if status.is_success() => message,
            Some(ApiResponse {
                description: Some(description),
                ..
            }) => {
                return Err(AppError::Telegram(format!(
                    "Failed to send message: {} - {}",
                    status, description
                )));
            }
            _ => {
                return Err(AppError::Telegram(format!(
                    "Failed to send message: {} - {}",
                    status, body
                )));
            }
        };

        debug!(message_id = message.message_id, "Telegram accepted message");

        Ok(message.message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;

    fn config(api_base: &str) -> TelegramConfig {
        TelegramConfig {
            bot_token: Some("123:abc".to_string()),
            api_base: api_base.to_string(),
        }
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let err = TelegramClient::new(&TelegramConfig::default()).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_send_message_posts_payload() {
        let (base, handle) = serve_once(200, r#"{"ok":true,"result":{"message_id":77}}"#);
        let client = TelegramClient::new(&config(&base)).unwrap();

        let message_id = client
            .send_message(&SendMessageRequest {
                chat_id: "@channel".to_string(),
                text: "Sheet ready".to_string(),
                parse_mode: None,
            })
            .await
            .unwrap();

        assert_eq!(message_id, 77);
        let request = handle.join().unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "/bot123:abc/sendMessage");
        let payload: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({"chat_id": "@channel", "text": "Sheet ready"})
        );
    }

    #[tokio::test]
    async fn test_parse_mode_is_forwarded() {
        let (base, handle) = serve_once(200, r#"{"ok":true,"result":{"message_id":1}}"#);
        let client = TelegramClient::new(&config(&base)).unwrap();

        client
            .send_message(&SendMessageRequest {
                chat_id: "42".to_string(),
                text: "<b>done</b>".to_string(),
                parse_mode: Some("HTML".to_string()),
            })
            .await
            .unwrap();

        let payload: serde_json::Value =
            serde_json::from_str(&handle.join().unwrap().body).unwrap();
        assert_eq!(payload["parse_mode"], "HTML");
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let (base, handle) = serve_once(
            400,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        );
        let client = TelegramClient::new(&config(&base)).unwrap();

        let err = client
            .send_message(&SendMessageRequest {
                chat_id: "0".to_string(),
                text: "x".to_string(),
                parse_mode: None,
            })
            .await
            .unwrap_err();
        handle.join().unwrap();

        assert!(matches!(err, AppError::Telegram(_)));
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_reported() {
        let (base, handle) = serve_once(502, "bad gateway");
        let client = TelegramClient::new(&config(&base)).unwrap();

        let err = client
            .send_message(&SendMessageRequest {
                chat_id: "0".to_string(),
                text: "x".to_string(),
                parse_mode: None,
            })
            .await
            .unwrap_err();
        handle.join().unwrap();

        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("bad gateway"));
    }
}

use super::EmailSender;
use crate::error::{AppError, Result};
use crate::google::GoogleAuth;
use crate::models::OutboundEmail;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

pub struct GmailApiClient {
    client: Client,
    access_token: String,
    api_base_url: String,
}

impl GmailApiClient {
    /// Create a new GmailApiClient with authenticated access
    #[instrument(name = "Authenticating to Gmail", skip_all)]
    pub async fn new(auth: &GoogleAuth) -> Result<Self> {
        let access_token = auth.access_token().await?;
        Ok(Self::with_token(access_token, GMAIL_API_BASE))
    }

    fn with_token(access_token: String, api_base_url: &str) -> Self {
        Self {
            client: Client::new(),
            access_token,
            api_base_url: api_base_url.to_string(),
        }
    }
}

/// Gmail's `raw` field: base64url of the full RFC 2822 message
fn encode_raw(email: &OutboundEmail) -> Result<String> {
    Ok(URL_SAFE.encode(email.to_rfc2822()?.as_bytes()))
}

#[async_trait]
impl EmailSender for GmailApiClient {
    #[instrument(name = "Sending email via Gmail API", skip_all, fields(to = %email.to))]
    async fn send(&self, email: &OutboundEmail) -> Result<Option<String>> {
        let raw = encode_raw(email)?;
        let url = format!("{}/messages/send", self.api_base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Gmail(format!(
                "Failed to send message: {} - {}",
                status, body
            )));
        }

        let sent: SendResponse = response.json().await?;
        debug!(id = %sent.id, "Gmail accepted message");

        Ok(Some(sent.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;

    #[test]
    fn test_raw_is_base64url_of_rfc2822() {
        let email = OutboundEmail::plain("a@example.com", "Subject?>>", "body ~~~ ???");
        let raw = encode_raw(&email).unwrap();

        assert!(!raw.contains('+') && !raw.contains('/'));
        let decoded = URL_SAFE.decode(raw).unwrap();
        assert_eq!(decoded, email.to_rfc2822().unwrap().into_bytes());
    }

    #[tokio::test]
    async fn test_send_posts_raw_with_bearer_token() {
        let (base, handle) = serve_once(200, r#"{"id":"18c0ffee","threadId":"18c0ffee"}"#);
        let client = GmailApiClient::with_token("token-1".to_string(), &base);
        let email = OutboundEmail::plain("a@example.com", "S", "B");

        let id = client.send(&email).await.unwrap();

        assert_eq!(id.as_deref(), Some("18c0ffee"));
        let request = handle.join().unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "/messages/send");
        assert_eq!(request.authorization.as_deref(), Some("Bearer token-1"));
        let payload: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(payload["raw"], encode_raw(&email).unwrap());
    }

    #[tokio::test]
    async fn test_error_response_is_gmail_error() {
        let (base, handle) = serve_once(403, r#"{"error":{"code":403,"message":"denied"}}"#);
        let client = GmailApiClient::with_token("token".to_string(), &base);
        let email = OutboundEmail::plain("a@example.com", "S", "B");

        let err = client.send(&email).await.unwrap_err();
        handle.join().unwrap();

        assert!(matches!(err, AppError::Gmail(_)));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_fails_before_network() {
        let client = GmailApiClient::with_token("token".to_string(), "http://127.0.0.1:1");
        let email = OutboundEmail::plain("nobody", "S", "B");

        let err = client.send(&email).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

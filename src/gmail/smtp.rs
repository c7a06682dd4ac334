use super::EmailSender;
use crate::error::{AppError, Result};
use crate::models::OutboundEmail;
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{info, instrument};

/// SMTP submission with STARTTLS, authenticated by an app password
pub struct SmtpClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
}

impl SmtpClient {
    pub fn new(host: &str, port: u16, sender: String, app_password: String) -> Result<Self> {
        let credentials = Credentials::new(sender.clone(), app_password);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::Smtp(format!("SMTP relay: {}", e)))?
            .port(port)
            .credentials(credentials)
            .build();

        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl EmailSender for SmtpClient {
    #[instrument(name = "Sending email via SMTP", skip_all, fields(to = %email.to))]
    async fn send(&self, email: &OutboundEmail) -> Result<Option<String>> {
        let message = email.to_lettre(&self.sender)?;
        let message_id = message
            .headers()
            .get_raw("Message-ID")
            .map(str::to_string);

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Smtp(format!("SMTP send: {}", e)))?;

        info!("Email sent");

        Ok(message_id)
    }
}

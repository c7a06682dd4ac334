mod client;
pub mod types;

pub use client::TelegramClient;
pub use types::SendMessageRequest;

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ChatSender {
    /// Post a message, returning the id Telegram assigned to it
    async fn send_message(&self, request: &SendMessageRequest) -> Result<i64>;
}

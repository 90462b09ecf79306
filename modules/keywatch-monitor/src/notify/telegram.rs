use anyhow::Result;
use async_trait::async_trait;
use telegram_client::TelegramBot;

use crate::traits::MessageSink;

#[async_trait]
impl MessageSink for TelegramBot {
    async fn deliver(&self, recipient: i64, text: &str) -> Result<()> {
        self.send_html(recipient, text).await?;
        Ok(())
    }
}

use async_trait::async_trait;

use crate::{domain::ChannelName, Result};

/// Outbound side of a chat connection: one `send` per delivered line.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send(&self, channel: &ChannelName, text: &str) -> Result<()>;
}

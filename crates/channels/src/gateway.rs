use {async_trait::async_trait, serde::Serialize};

use crate::{body::MessageBody, error::Result};

/// A channel as seen by the provider.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelInfo {
    pub id: String,
    /// Guild the channel belongs to; `None` for DM channels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Provider-facing message operations.
///
/// Every call can fail independently. Callers fanning out across channels
/// must catch failures at the per-channel boundary; one channel's failure
/// never aborts a sibling's operation.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Look up a channel. Returns [`crate::Error::NotFound`] when the
    /// channel does not exist or is not visible to the bot.
    async fn fetch_channel(&self, guild_id: &str, channel_id: &str) -> Result<ChannelInfo>;

    /// Send a fresh message, returning the provider-assigned message id.
    async fn send_message(&self, channel_id: &str, body: &MessageBody) -> Result<String>;

    /// Edit a previously sent message in place, keeping its id. Returns
    /// [`crate::Error::NotFound`] when the message is gone.
    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        body: &MessageBody,
    ) -> Result<()>;

    /// Delete a previously sent message. Callers treat
    /// [`crate::Error::NotFound`] as success.
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()>;
}

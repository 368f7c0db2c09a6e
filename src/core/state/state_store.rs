use super::state_models::{ChannelState, GuildState};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Entry for a channel, only when it carries a usable message id.
    async fn get(&self, guild_id: u64, channel_id: u64) -> Result<Option<ChannelState>, StateError>;
    async fn set(
        &self,
        guild_id: u64,
        channel_id: u64,
        state: ChannelState,
    ) -> Result<(), StateError>;
    /// Keeps the channel key but forgets its message (`null` on disk).
    async fn clear(&self, guild_id: u64, channel_id: u64) -> Result<(), StateError>;
    /// Drops the channel key entirely.
    async fn remove(&self, guild_id: u64, channel_id: u64) -> Result<(), StateError>;
    async fn guild_state(&self, guild_id: u64) -> Result<GuildState, StateError>;
    async fn replace_guild_state(&self, guild_id: u64, state: GuildState) -> Result<(), StateError>;
    async fn delete_guild(&self, guild_id: u64) -> Result<(), StateError>;
    async fn guild_ids(&self) -> Result<Vec<u64>, StateError>;
}

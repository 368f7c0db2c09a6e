use crate::core::config::{GuildConfig, MonitoredServer};
use crate::core::status::ServerStatus;
use async_trait::async_trait;

/// Everything needed to render one status message.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub guild: GuildConfig,
    pub server: MonitoredServer,
    pub status: ServerStatus,
    /// PNG attached as `server-icon.png`.
    pub icon: Option<Vec<u8>>,
}

/// Publishing failures, classified by what the scheduler should do next.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The message is gone for good; a new one has to be posted.
    #[error("Message no longer exists")]
    MessageMissing,
    /// Network trouble or a Discord outage; try again on the next tick.
    #[error("Transient failure: {0}")]
    Transient(String),
    #[error("Publish failed: {0}")]
    Other(String),
}

/// Where status messages live. Implemented by the Discord layer.
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    /// Whether the bot can currently see the channel.
    async fn channel_available(&self, channel_id: u64) -> bool;
    /// Fetches the existing message and edits it in place.
    async fn edit(
        &self,
        channel_id: u64,
        message_id: u64,
        snapshot: &StatusSnapshot,
    ) -> Result<(), PublishError>;
    /// Posts a new message and returns its id.
    async fn send(&self, channel_id: u64, snapshot: &StatusSnapshot) -> Result<u64, PublishError>;
    async fn delete(&self, channel_id: u64, message_id: u64) -> Result<(), PublishError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ChannelUnavailable,
    /// The server was removed from the guild config since the timer started.
    NotConfigured,
    Transient,
    Failed,
}

/// What a single update cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Created(u64),
    Edited(u64),
    /// The old message was deleted on Discord's side and a new one was posted.
    Replaced(u64),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub deleted: usize,
    pub errors: usize,
}

use super::status_models::ServerStatus;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Live Minecraft status lookups. Implementations apply their own timeout and
/// report unreachable servers as offline.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn query(&self, address: &str, port: u16) -> ServerStatus;
}

/// Server icons saved per guild so offline embeds can still show one.
#[async_trait]
pub trait IconStore: Send + Sync {
    async fn save_online(
        &self,
        guild_id: u64,
        server_name: &str,
        png: &[u8],
    ) -> Result<(), IconError>;

    /// Last saved online icon, falling back to a manually placed local one.
    async fn load(&self, guild_id: u64, server_name: &str) -> Option<Vec<u8>>;
}

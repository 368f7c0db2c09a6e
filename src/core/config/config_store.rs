use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Raw document storage for the global and per-guild configuration.
///
/// Stores hand back the text exactly as persisted so the service can tell
/// whether a migration changed anything before rewriting the file.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn read_global(&self) -> Result<Option<String>, StoreError>;
    async fn write_global(&self, contents: &str) -> Result<(), StoreError>;
    async fn read_guild(&self, guild_id: u64) -> Result<Option<String>, StoreError>;
    async fn write_guild(&self, guild_id: u64, contents: &str) -> Result<(), StoreError>;
    async fn guild_ids(&self) -> Result<Vec<u64>, StoreError>;
}

use crate::core::state::{ChannelState, GuildState, StateError, StateStore};
use crate::infra::json_files::{guild_file_name, list_guild_files, read_optional, write_file};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// One `states/guild_<id>.json` per guild, loaded on first access and cached.
pub struct JsonStateStore {
    dir: PathBuf,
    cache: RwLock<HashMap<u64, GuildState>>,
}

impl JsonStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn path(&self, guild_id: u64) -> PathBuf {
        self.dir.join(guild_file_name(guild_id))
    }

    async fn read_from_disk(path: &Path, guild_id: u64) -> Result<GuildState, StateError> {
        let Some(raw) = read_optional(path).await? else {
            return Ok(GuildState::default());
        };
        // A corrupt state file only costs us the message ids; start clean.
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(guild_id, "Unreadable state file, starting empty: {}", e);
            GuildState::default()
        }))
    }

    async fn load(&self, guild_id: u64) -> Result<GuildState, StateError> {
        if let Some(state) = self.cache.read().await.get(&guild_id) {
            return Ok(state.clone());
        }

        let mut cache = self.cache.write().await;
        if let Some(state) = cache.get(&guild_id) {
            return Ok(state.clone());
        }
        let state = Self::read_from_disk(&self.path(guild_id), guild_id).await?;
        cache.insert(guild_id, state.clone());
        Ok(state)
    }

    /// Applies `change` and persists the guild while holding the write lock.
    /// The cache only sees the change once the file is written.
    async fn update(
        &self,
        guild_id: u64,
        change: impl FnOnce(&mut GuildState),
    ) -> Result<(), StateError> {
        let mut cache = self.cache.write().await;
        let mut state = match cache.get(&guild_id) {
            Some(state) => state.clone(),
            None => Self::read_from_disk(&self.path(guild_id), guild_id).await?,
        };
        change(&mut state);

        let contents = serde_json::to_string_pretty(&state)?;
        write_file(&self.path(guild_id), &contents).await?;
        cache.insert(guild_id, state);
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn get(&self, guild_id: u64, channel_id: u64) -> Result<Option<ChannelState>, StateError> {
        Ok(self.load(guild_id).await?.get(channel_id).cloned())
    }

    async fn set(
        &self,
        guild_id: u64,
        channel_id: u64,
        state: ChannelState,
    ) -> Result<(), StateError> {
        self.update(guild_id, |guild| {
            guild.servers.insert(channel_id.to_string(), Some(state));
        })
        .await
    }

    async fn clear(&self, guild_id: u64, channel_id: u64) -> Result<(), StateError> {
        self.update(guild_id, |guild| {
            guild.servers.insert(channel_id.to_string(), None);
        })
        .await
    }

    async fn remove(&self, guild_id: u64, channel_id: u64) -> Result<(), StateError> {
        self.update(guild_id, |guild| {
            guild.servers.remove(&channel_id.to_string());
        })
        .await
    }

    async fn guild_state(&self, guild_id: u64) -> Result<GuildState, StateError> {
        self.load(guild_id).await
    }

    async fn replace_guild_state(&self, guild_id: u64, state: GuildState) -> Result<(), StateError> {
        self.update(guild_id, |guild| *guild = state).await
    }

    async fn delete_guild(&self, guild_id: u64) -> Result<(), StateError> {
        self.cache.write().await.remove(&guild_id);
        match tokio::fs::remove_file(self.path(guild_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn guild_ids(&self) -> Result<Vec<u64>, StateError> {
        Ok(list_guild_files(&self.dir).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_state_persistence_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path());
        store.set(1, 42, ChannelState::new(900, "online")).await.unwrap();

        // Reload from file
        let store2 = JsonStateStore::new(dir.path());
        let state = store2.get(1, 42).await.unwrap().unwrap();
        assert_eq!(state.message(), Some(900));
        assert_eq!(state.last_status, "online");
        assert_eq!(store2.guild_ids().await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_clear_keeps_null_entry() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path());
        store.set(1, 42, ChannelState::new(900, "online")).await.unwrap();
        store.clear(1, 42).await.unwrap();

        assert_eq!(store.get(1, 42).await.unwrap(), None);
        let raw = std::fs::read_to_string(dir.path().join("guild_1.json")).unwrap();
        assert!(raw.contains("\"42\": null"));

        store.remove(1, 42).await.unwrap();
        assert!(store.guild_state(1).await.unwrap().servers.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cache_unchanged() {
        let dir = TempDir::new().unwrap();
        let states = dir.path().join("states");
        let store = JsonStateStore::new(&states);
        store.set(1, 42, ChannelState::new(900, "online")).await.unwrap();

        // A plain file where the directory was makes every write fail.
        std::fs::remove_dir_all(&states).unwrap();
        std::fs::write(&states, "not a directory").unwrap();

        assert!(store.set(1, 42, ChannelState::new(901, "offline")).await.is_err());
        assert!(store.clear(1, 42).await.is_err());
        let cached = store.get(1, 42).await.unwrap().unwrap();
        assert_eq!(cached.message(), Some(900));
        assert_eq!(cached.last_status, "online");
    }

    #[tokio::test]
    async fn test_reads_files_written_elsewhere() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("guild_3.json"),
            r#"{"servers":{"10":{"messageID":"77","lastStatus":"offline","lastUpdate":"2024-05-01T10:00:00Z"},"11":{}}}"#,
        )
        .unwrap();

        let store = JsonStateStore::new(dir.path());
        assert_eq!(store.get(3, 10).await.unwrap().unwrap().message(), Some(77));
        assert_eq!(store.get(3, 11).await.unwrap(), None);

        store.delete_guild(3).await.unwrap();
        assert!(!dir.path().join("guild_3.json").exists());
    }
}

use crate::core::config::{ConfigStore, StoreError};
use crate::infra::json_files::{guild_file_name, list_guild_files, read_optional, write_file};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// `global-config.json` plus one `configs/guild_<id>.json` per guild.
pub struct JsonConfigStore {
    global_path: PathBuf,
    configs_dir: PathBuf,
}

impl JsonConfigStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            global_path: root.join("global-config.json"),
            configs_dir: root.join("configs"),
        }
    }

    pub fn guild_path(&self, guild_id: u64) -> PathBuf {
        self.configs_dir.join(guild_file_name(guild_id))
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn read_global(&self) -> Result<Option<String>, StoreError> {
        Ok(read_optional(&self.global_path).await?)
    }

    async fn write_global(&self, contents: &str) -> Result<(), StoreError> {
        Ok(write_file(&self.global_path, contents).await?)
    }

    async fn read_guild(&self, guild_id: u64) -> Result<Option<String>, StoreError> {
        Ok(read_optional(&self.guild_path(guild_id)).await?)
    }

    async fn write_guild(&self, guild_id: u64, contents: &str) -> Result<(), StoreError> {
        Ok(write_file(&self.guild_path(guild_id), contents).await?)
    }

    async fn guild_ids(&self) -> Result<Vec<u64>, StoreError> {
        Ok(list_guild_files(&self.configs_dir).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ConfigService, MonitoredServer};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_guild_config_roundtrip_on_disk() {
        let dir = TempDir::new().unwrap();
        let service = ConfigService::new(JsonConfigStore::new(dir.path()))
            .await
            .unwrap();
        assert!(dir.path().join("global-config.json").exists());

        let mut config = service.load_or_create_guild(11, "Disk").await.unwrap();
        config
            .servers
            .push(MonitoredServer::new("Hub", "hub.example.org", 25565, 99, 30_000));
        service.save_guild(11, &config).await.unwrap();

        // Fresh service over the same directory
        let service2 = ConfigService::new(JsonConfigStore::new(dir.path()))
            .await
            .unwrap();
        let loaded = service2.load_guild(11).await.unwrap().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(service2.guild_ids().await.unwrap(), vec![11]);
    }

    #[tokio::test]
    async fn test_migrated_file_is_stable() {
        let dir = TempDir::new().unwrap();
        let store = JsonConfigStore::new(dir.path());
        let path = store.guild_path(5);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"servers":[{"serverName":"Old","serverIP":"old.example.org","serverPort":25565,"channelID":"8"}]}"#,
        )
        .unwrap();

        let service = ConfigService::new(store).await.unwrap();
        service.load_guild(5).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        service.load_guild(5).await.unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert!(String::from_utf8(first).unwrap().contains("\"updateInterval\": 10000"));
    }
}

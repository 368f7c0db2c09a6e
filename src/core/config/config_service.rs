use super::config_models::{GlobalConfig, GlobalDefaults, GuildConfig};
use super::config_store::{ConfigStore, StoreError};
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Invalid global config: {0}")]
    InvalidGlobal(serde_json::Error),
    #[error("Invalid config for guild {guild_id}: {source}")]
    InvalidGuild {
        guild_id: u64,
        source: serde_json::Error,
    },
}

/// Fills in what older guild files lack. Field-level defaults are handled by
/// serde; this covers values that depend on the global defaults.
pub fn migrate_guild(config: &mut GuildConfig, defaults: &GlobalDefaults) {
    for server in &mut config.servers {
        if server.update_interval.is_none() {
            server.update_interval = Some(defaults.update_interval);
        }
    }
}

pub struct ConfigService<S: ConfigStore> {
    store: S,
    global: RwLock<GlobalConfig>,
}

impl<S: ConfigStore> ConfigService<S> {
    /// Loads `global-config.json`, writing the defaults when it does not exist yet.
    pub async fn new(store: S) -> Result<Self, ConfigError> {
        let global = Self::load_global(&store).await?;
        Ok(Self {
            store,
            global: RwLock::new(global),
        })
    }

    async fn load_global(store: &S) -> Result<GlobalConfig, ConfigError> {
        match store.read_global().await? {
            Some(raw) => serde_json::from_str(&raw).map_err(ConfigError::InvalidGlobal),
            None => {
                let global = GlobalConfig::default();
                let contents = serde_json::to_string_pretty(&global).map_err(StoreError::from)?;
                store.write_global(&contents).await?;
                tracing::info!("Created default global config");
                Ok(global)
            }
        }
    }

    pub async fn global(&self) -> GlobalConfig {
        self.global.read().await.clone()
    }

    pub async fn defaults(&self) -> GlobalDefaults {
        self.global.read().await.defaults.clone()
    }

    pub async fn reload_global(&self) -> Result<(), ConfigError> {
        let fresh = Self::load_global(&self.store).await?;
        *self.global.write().await = fresh;
        Ok(())
    }

    /// Loads and migrates a guild config. The file is rewritten only when the
    /// migrated form differs from what is on disk, so a second load of the
    /// same file never touches it.
    pub async fn load_guild(&self, guild_id: u64) -> Result<Option<GuildConfig>, ConfigError> {
        let Some(raw) = self.store.read_guild(guild_id).await? else {
            return Ok(None);
        };

        let mut config: GuildConfig = serde_json::from_str(&raw)
            .map_err(|source| ConfigError::InvalidGuild { guild_id, source })?;
        let defaults = self.defaults().await;
        migrate_guild(&mut config, &defaults);

        let migrated = serde_json::to_string_pretty(&config).map_err(StoreError::from)?;
        if migrated != raw {
            tracing::info!(guild_id, "Migrated guild config");
            self.store.write_guild(guild_id, &migrated).await?;
        }

        Ok(Some(config))
    }

    pub async fn load_or_create_guild(
        &self,
        guild_id: u64,
        guild_name: &str,
    ) -> Result<GuildConfig, ConfigError> {
        if let Some(config) = self.load_guild(guild_id).await? {
            return Ok(config);
        }

        let defaults = self.defaults().await;
        let config = GuildConfig::new(guild_id, guild_name, &defaults);
        self.save_guild(guild_id, &config).await?;
        tracing::info!(guild_id, guild_name, "Created guild config");
        Ok(config)
    }

    pub async fn save_guild(&self, guild_id: u64, config: &GuildConfig) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(config).map_err(StoreError::from)?;
        self.store.write_guild(guild_id, &contents).await?;
        Ok(())
    }

    pub async fn guild_ids(&self) -> Result<Vec<u64>, ConfigError> {
        Ok(self.store.guild_ids().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MonitoredServer;
    use async_trait::async_trait;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store counting guild writes
    #[derive(Default)]
    struct MockConfigStore {
        global: DashMap<(), String>,
        guilds: DashMap<u64, String>,
        guild_writes: AtomicUsize,
    }

    #[async_trait]
    impl ConfigStore for MockConfigStore {
        async fn read_global(&self) -> Result<Option<String>, StoreError> {
            Ok(self.global.get(&()).map(|g| g.clone()))
        }

        async fn write_global(&self, contents: &str) -> Result<(), StoreError> {
            self.global.insert((), contents.to_string());
            Ok(())
        }

        async fn read_guild(&self, guild_id: u64) -> Result<Option<String>, StoreError> {
            Ok(self.guilds.get(&guild_id).map(|g| g.clone()))
        }

        async fn write_guild(&self, guild_id: u64, contents: &str) -> Result<(), StoreError> {
            self.guild_writes.fetch_add(1, Ordering::SeqCst);
            self.guilds.insert(guild_id, contents.to_string());
            Ok(())
        }

        async fn guild_ids(&self) -> Result<Vec<u64>, StoreError> {
            Ok(self.guilds.iter().map(|e| *e.key()).collect())
        }
    }

    const LEGACY_GUILD: &str = r#"{
  "_guild_info": { "guildId": "7", "guildName": "Test", "setupDate": "2024-01-01T00:00:00Z" },
  "servers": [
    { "serverName": "Survival", "serverIP": "mc.example.org", "serverPort": 25565, "channelID": "42" }
  ],
  "customFlag": "kept"
}"#;

    #[tokio::test]
    async fn creates_default_global_config() {
        let service = ConfigService::new(MockConfigStore::default()).await.unwrap();
        let global = service.global().await;
        assert_eq!(global.defaults.update_interval, 10_000);
        assert!(!global.has_token());
        assert!(service.store.global.get(&()).is_some());
    }

    #[tokio::test]
    async fn migration_fills_defaults_and_is_idempotent() {
        let store = MockConfigStore::default();
        store.guilds.insert(7, LEGACY_GUILD.to_string());
        let service = ConfigService::new(store).await.unwrap();

        let config = service.load_guild(7).await.unwrap().unwrap();
        let server: &MonitoredServer = &config.servers[0];
        assert_eq!(server.update_interval, Some(10_000));
        assert!(server.monitoring_enabled);
        assert_eq!(server.text_settings.language, "global");
        assert_eq!(config.global_text_settings.default_language, "en");
        assert_eq!(config.extra.get("customFlag").and_then(|v| v.as_str()), Some("kept"));
        assert_eq!(service.store.guild_writes.load(Ordering::SeqCst), 1);

        let first = service.store.guilds.get(&7).unwrap().clone();
        let again = service.load_guild(7).await.unwrap().unwrap();
        let second = service.store.guilds.get(&7).unwrap().clone();

        assert_eq!(again, config);
        assert_eq!(first, second);
        assert_eq!(service.store.guild_writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_guild_json_is_reported() {
        let store = MockConfigStore::default();
        store.guilds.insert(9, "{ not json".to_string());
        let service = ConfigService::new(store).await.unwrap();

        let result = service.load_guild(9).await;
        assert!(matches!(result, Err(ConfigError::InvalidGuild { guild_id: 9, .. })));
    }

    #[tokio::test]
    async fn load_or_create_persists_new_guild() {
        let service = ConfigService::new(MockConfigStore::default()).await.unwrap();
        let created = service.load_or_create_guild(3, "Fresh").await.unwrap();
        assert_eq!(created.guild_info.guild_name, "Fresh");
        assert_eq!(created.footer_text, "mcapi.us");

        let loaded = service.load_guild(3).await.unwrap().unwrap();
        assert_eq!(loaded, created);
    }
}

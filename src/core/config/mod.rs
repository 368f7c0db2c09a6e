pub mod config_models;
pub mod config_service;
pub mod config_store;

pub use config_models::{
    normalize_hex_color, ButtonMessages, ButtonSettings, EmbedColors, EmbedSettings, Emojis,
    GlobalConfig, GlobalDefaults, GuildConfig, MonitoredServer, SetupPermissions, TextDefaults,
    DEFAULT_FOOTER, DEFAULT_PORT, DEFAULT_UPDATE_INTERVAL_MS, GLOBAL_LANGUAGE, TOKEN_PLACEHOLDER,
};
pub use config_service::{ConfigError, ConfigService};
pub use config_store::{ConfigStore, StoreError};

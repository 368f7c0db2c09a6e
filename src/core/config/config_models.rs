use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_PORT: u16 = 25565;
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_FOOTER: &str = "mcapi.us";
pub const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN";

/// Language marker meaning "use whatever the guild uses".
pub const GLOBAL_LANGUAGE: &str = "global";
pub const FALLBACK_LANGUAGE: &str = "en";

fn enabled() -> bool {
    true
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_language() -> String {
    FALLBACK_LANGUAGE.to_string()
}

fn global_language() -> String {
    GLOBAL_LANGUAGE.to_string()
}

fn default_footer() -> String {
    DEFAULT_FOOTER.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedColors {
    pub online: String,
    pub offline: String,
}

impl Default for EmbedColors {
    fn default() -> Self {
        Self {
            online: "#00FF00".to_string(),
            offline: "#FF0000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emojis {
    pub online: String,
    pub offline: String,
    pub ip: String,
    pub version: String,
    pub players: String,
    pub ping: String,
    pub port: String,
    pub player_list: String,
    pub motd: String,
}

impl Default for Emojis {
    fn default() -> Self {
        Self {
            online: "🟢".to_string(),
            offline: "🔴".to_string(),
            ip: "🌐".to_string(),
            version: "⚙️".to_string(),
            players: "👥".to_string(),
            ping: "📶".to_string(),
            port: "🔑".to_string(),
            player_list: "👤".to_string(),
            motd: "📢".to_string(),
        }
    }
}

/// Replies sent by the status message buttons. `{ip}`, `{port}`, `{count}`,
/// `{max}`, `{players}` and `{serverName}` are substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonMessages {
    pub ip_message: String,
    pub port_message: String,
    pub players_message: String,
}

impl Default for ButtonMessages {
    fn default() -> Self {
        Self {
            ip_message: "📋 **Server IP:**\n```\n{ip}\n```".to_string(),
            port_message: "🔑 **Server Port:**\n```\n{port}\n```".to_string(),
            players_message: "👥 **Online ({count}/{max}):**\n```\n{players}\n```".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupPermissions {
    #[serde(default = "enabled")]
    pub allow_administrator: bool,
    #[serde(default)]
    pub allowed_roles: Vec<String>,
}

impl Default for SetupPermissions {
    fn default() -> Self {
        Self {
            allow_administrator: true,
            allowed_roles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDefaults {
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "enabled")]
    pub allow_custom_texts: bool,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            allow_custom_texts: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDefaults {
    #[serde(default = "GlobalDefaults::default_interval")]
    pub update_interval: u64,
    #[serde(default)]
    pub embed_colors: EmbedColors,
    #[serde(default)]
    pub default_emojis: Emojis,
    #[serde(default)]
    pub default_button_messages: ButtonMessages,
    #[serde(default)]
    pub setup_permissions: SetupPermissions,
    #[serde(default)]
    pub text_settings: TextDefaults,
}

impl GlobalDefaults {
    fn default_interval() -> u64 {
        DEFAULT_UPDATE_INTERVAL_MS
    }
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL_MS,
            embed_colors: EmbedColors::default(),
            default_emojis: Emojis::default(),
            default_button_messages: ButtonMessages::default(),
            setup_permissions: SetupPermissions::default(),
            text_settings: TextDefaults::default(),
        }
    }
}

/// Contents of `global-config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub verbose_logging: bool,
    #[serde(default)]
    pub defaults: GlobalDefaults,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            token: TOKEN_PLACEHOLDER.to_string(),
            verbose_logging: false,
            defaults: GlobalDefaults::default(),
        }
    }
}

impl GlobalConfig {
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty() && self.token != TOKEN_PLACEHOLDER
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildInfo {
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub guild_name: String,
    #[serde(default)]
    pub setup_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedSettings {
    #[serde(rename = "colorOnline", default, skip_serializing_if = "Option::is_none")]
    pub color_online: Option<String>,
    #[serde(rename = "colorOffline", default, skip_serializing_if = "Option::is_none")]
    pub color_offline: Option<String>,
    #[serde(rename = "showIP", default, skip_serializing_if = "Option::is_none")]
    pub show_ip: Option<bool>,
    #[serde(rename = "showPort", default, skip_serializing_if = "Option::is_none")]
    pub show_port: Option<bool>,
    #[serde(rename = "showPlayers", default, skip_serializing_if = "Option::is_none")]
    pub show_players: Option<bool>,
    #[serde(rename = "showMOTD", default, skip_serializing_if = "Option::is_none")]
    pub show_motd: Option<bool>,
}

impl EmbedSettings {
    // IP, player list and MOTD are shown unless switched off; the port field is opt-in.
    pub fn shows_ip(&self) -> bool {
        self.show_ip != Some(false)
    }

    pub fn shows_port(&self) -> bool {
        self.show_port == Some(true)
    }

    pub fn shows_players(&self) -> bool {
        self.show_players != Some(false)
    }

    pub fn shows_motd(&self) -> bool {
        self.show_motd != Some(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "showIPButton", default, skip_serializing_if = "Option::is_none")]
    pub show_ip_button: Option<bool>,
    #[serde(rename = "showPortButton", default, skip_serializing_if = "Option::is_none")]
    pub show_port_button: Option<bool>,
    #[serde(rename = "showPlayersButton", default, skip_serializing_if = "Option::is_none")]
    pub show_players_button: Option<bool>,
}

impl ButtonSettings {
    pub fn row_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    pub fn shows_ip(&self) -> bool {
        self.show_ip_button != Some(false)
    }

    pub fn shows_port(&self) -> bool {
        self.show_port_button == Some(true)
    }

    pub fn shows_players(&self) -> bool {
        self.show_players_button == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTextSettings {
    #[serde(default = "global_language")]
    pub language: String,
    #[serde(default)]
    pub custom_texts: Option<Value>,
}

impl Default for ServerTextSettings {
    fn default() -> Self {
        Self {
            language: global_language(),
            custom_texts: None,
        }
    }
}

/// One Minecraft server watched in one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredServer {
    #[serde(default)]
    pub server_name: String,
    #[serde(rename = "serverIP", default)]
    pub server_ip: String,
    #[serde(default = "default_port")]
    pub server_port: u16,
    #[serde(rename = "channelID", default)]
    pub channel_id: String,
    /// Milliseconds between polls. Filled from the global default on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<u64>,
    #[serde(default = "enabled")]
    pub use_server_icon: bool,
    #[serde(default = "enabled")]
    pub auto_save_icon: bool,
    #[serde(default = "enabled")]
    pub monitoring_enabled: bool,
    #[serde(default)]
    pub embed_settings: EmbedSettings,
    #[serde(default)]
    pub button_settings: ButtonSettings,
    #[serde(default)]
    pub text_settings: ServerTextSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MonitoredServer {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        port: u16,
        channel_id: u64,
        update_interval: u64,
    ) -> Self {
        Self {
            server_name: name.into(),
            server_ip: address.into(),
            server_port: port,
            channel_id: channel_id.to_string(),
            update_interval: Some(update_interval),
            use_server_icon: true,
            auto_save_icon: true,
            monitoring_enabled: true,
            embed_settings: EmbedSettings::default(),
            button_settings: ButtonSettings {
                enabled: Some(true),
                ..ButtonSettings::default()
            },
            text_settings: ServerTextSettings::default(),
            extra: Map::new(),
        }
    }

    /// Channel snowflake, if the stored id parses.
    pub fn channel(&self) -> Option<u64> {
        self.channel_id.trim().parse().ok().filter(|id| *id != 0)
    }

    /// `host` or `host:port` when the port is not the Minecraft default.
    pub fn display_address(&self) -> String {
        if self.server_port == DEFAULT_PORT {
            self.server_ip.clone()
        } else {
            format!("{}:{}", self.server_ip, self.server_port)
        }
    }
}

/// Contents of `configs/guild_<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildConfig {
    #[serde(rename = "_guild_info", default)]
    pub guild_info: GuildInfo,
    #[serde(default)]
    pub servers: Vec<MonitoredServer>,
    #[serde(default)]
    pub setup_permissions: SetupPermissions,
    #[serde(default)]
    pub embed_colors: EmbedColors,
    #[serde(default)]
    pub default_emojis: Emojis,
    #[serde(default)]
    pub default_button_messages: ButtonMessages,
    #[serde(default = "default_footer")]
    pub footer_text: String,
    #[serde(default)]
    pub global_text_settings: TextDefaults,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GuildConfig {
    /// Fresh config for a guild, seeded from the global defaults.
    pub fn new(guild_id: u64, guild_name: &str, defaults: &GlobalDefaults) -> Self {
        Self {
            guild_info: GuildInfo {
                guild_id: guild_id.to_string(),
                guild_name: guild_name.to_string(),
                setup_date: chrono::Utc::now().to_rfc3339(),
            },
            servers: Vec::new(),
            setup_permissions: defaults.setup_permissions.clone(),
            embed_colors: defaults.embed_colors.clone(),
            default_emojis: defaults.default_emojis.clone(),
            default_button_messages: defaults.default_button_messages.clone(),
            footer_text: default_footer(),
            global_text_settings: defaults.text_settings.clone(),
            extra: Map::new(),
        }
    }

    /// Language a server's texts render in: its own setting, or the guild
    /// default when set to "global".
    pub fn effective_language<'a>(&'a self, server: Option<&'a MonitoredServer>) -> &'a str {
        if let Some(server) = server {
            let language = server.text_settings.language.trim();
            if !language.is_empty() && language != GLOBAL_LANGUAGE {
                return language;
            }
        }

        let language = self.global_text_settings.default_language.trim();
        if language.is_empty() {
            FALLBACK_LANGUAGE
        } else {
            language
        }
    }

    pub fn server_by_channel(&self, channel_id: u64) -> Option<&MonitoredServer> {
        self.servers.iter().find(|s| s.channel() == Some(channel_id))
    }

    pub fn online_color(&self, server: &MonitoredServer) -> u32 {
        server
            .embed_settings
            .color_online
            .as_deref()
            .and_then(parse_hex_color)
            .or_else(|| parse_hex_color(&self.embed_colors.online))
            .unwrap_or(0x00FF00)
    }

    pub fn offline_color(&self, server: &MonitoredServer) -> u32 {
        server
            .embed_settings
            .color_offline
            .as_deref()
            .and_then(parse_hex_color)
            .or_else(|| parse_hex_color(&self.embed_colors.offline))
            .unwrap_or(0xFF0000)
    }
}

/// Accepts `#RRGGBB` or `RRGGBB` in any case and returns the canonical
/// upper-case `#RRGGBB` form.
pub fn normalize_hex_color(input: &str) -> Option<String> {
    let digits = input.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("#{}", digits.to_ascii_uppercase()))
}

pub fn parse_hex_color(input: &str) -> Option<u32> {
    let normalized = normalize_hex_color(input)?;
    u32::from_str_radix(&normalized[1..], 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_colors() {
        assert_eq!(normalize_hex_color("#00ff00").as_deref(), Some("#00FF00"));
        assert_eq!(normalize_hex_color("ab12Cd").as_deref(), Some("#AB12CD"));
        assert_eq!(normalize_hex_color("#12345"), None);
        assert_eq!(normalize_hex_color("#GGGGGG"), None);
        assert_eq!(parse_hex_color("#FF0000"), Some(0xFF0000));
    }

    #[test]
    fn global_language_follows_guild_default() {
        let mut guild = GuildConfig::new(1, "test", &GlobalDefaults::default());
        guild.global_text_settings.default_language = "de".to_string();
        let mut server = MonitoredServer::new("Survival", "mc.example.org", 25565, 42, 10_000);

        assert_eq!(guild.effective_language(Some(&server)), "de");

        server.text_settings.language = "en".to_string();
        assert_eq!(guild.effective_language(Some(&server)), "en");

        guild.global_text_settings.default_language = String::new();
        assert_eq!(guild.effective_language(None), FALLBACK_LANGUAGE);
    }

    #[test]
    fn server_colors_override_guild_colors() {
        let guild = GuildConfig::new(1, "test", &GlobalDefaults::default());
        let mut server = MonitoredServer::new("Survival", "mc.example.org", 25565, 42, 10_000);
        assert_eq!(guild.online_color(&server), 0x00FF00);

        server.embed_settings.color_online = Some("#123456".to_string());
        assert_eq!(guild.online_color(&server), 0x123456);
        assert_eq!(guild.offline_color(&server), 0xFF0000);
    }

    #[test]
    fn display_address_hides_default_port() {
        let server = MonitoredServer::new("A", "play.example.org", 25565, 1, 10_000);
        assert_eq!(server.display_address(), "play.example.org");
        let server = MonitoredServer::new("B", "play.example.org", 25570, 1, 10_000);
        assert_eq!(server.display_address(), "play.example.org:25570");
    }
}

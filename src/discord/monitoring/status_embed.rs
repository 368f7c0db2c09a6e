// Renders a status snapshot into the embed, button row and icon attachment
// of a status message.

use crate::core::config::{GuildConfig, MonitoredServer};
use crate::core::monitoring::StatusSnapshot;
use crate::core::texts::{TextCatalog, TextStore};
use poise::serenity_prelude as serenity;

pub const ICON_FILE_NAME: &str = "server-icon.png";
const FIELD_LIMIT: usize = 1024;

pub struct StatusMessage {
    pub embed: serenity::CreateEmbed,
    pub components: Vec<serenity::CreateActionRow>,
    pub icon: Option<serenity::CreateAttachment>,
}

/// Cuts `text` to at most `limit` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

struct Localizer<'a, S: TextStore> {
    texts: &'a TextCatalog<S>,
    guild: &'a GuildConfig,
    server: &'a MonitoredServer,
}

impl<S: TextStore> Localizer<'_, S> {
    fn get(&self, key: &str, vars: &[(&str, String)]) -> String {
        self.texts.text(self.guild, Some(self.server), key, vars)
    }

    fn label(&self, key: &str, emoji: &str) -> String {
        self.get(key, &[("emoji", emoji.to_string())])
    }
}

pub fn render<S: TextStore>(texts: &TextCatalog<S>, snapshot: &StatusSnapshot) -> StatusMessage {
    let guild = &snapshot.guild;
    let server = &snapshot.server;
    let tr = Localizer {
        texts,
        guild,
        server,
    };

    let mut embed = if snapshot.status.online {
        online_embed(&tr, snapshot)
    } else {
        offline_embed(&tr, snapshot)
    };
    embed = embed
        .footer(serenity::CreateEmbedFooter::new(tr.get(
            "status.footer",
            &[("footerText", guild.footer_text.clone())],
        )))
        .timestamp(serenity::Timestamp::now());

    let icon = match &snapshot.icon {
        Some(png) if server.use_server_icon => {
            embed = embed.thumbnail(format!("attachment://{ICON_FILE_NAME}"));
            Some(serenity::CreateAttachment::bytes(png.clone(), ICON_FILE_NAME))
        }
        _ => None,
    };

    StatusMessage {
        embed,
        components: status_buttons(&tr).into_iter().collect(),
        icon,
    }
}

fn online_embed<S: TextStore>(tr: &Localizer<'_, S>, snapshot: &StatusSnapshot) -> serenity::CreateEmbed {
    let guild = tr.guild;
    let server = tr.server;
    let status = &snapshot.status;
    let emojis = &guild.default_emojis;
    let settings = &server.embed_settings;

    let mut embed = serenity::CreateEmbed::new()
        .title(tr.get(
            "status.online.title",
            &[
                ("emoji", emojis.online.clone()),
                ("serverName", server.server_name.clone()),
            ],
        ))
        .color(guild.online_color(server));

    if settings.shows_ip() {
        embed = embed.field(
            tr.label("status.online.fields.ip", &emojis.ip),
            format!("`{}`", server.display_address()),
            false,
        );
    }
    if settings.shows_port() {
        embed = embed.field(
            tr.label("status.online.fields.port", &emojis.port),
            format!("`{}`", server.server_port),
            true,
        );
    }

    let ping = status
        .latency_ms
        .map_or_else(|| "-".to_string(), |ms| format!("{ms}ms"));
    embed = embed
        .field(
            tr.label("status.online.fields.version", &emojis.version),
            truncate(&status.version, FIELD_LIMIT),
            true,
        )
        .field(
            tr.label("status.online.fields.players", &emojis.players),
            format!("{}/{}", status.players.online, status.players.max),
            true,
        )
        .field(tr.label("status.online.fields.ping", &emojis.ping), ping, true);

    if settings.shows_players() {
        let list = if !status.players.sample.is_empty() {
            Some(truncate(&status.players.sample.join(", "), FIELD_LIMIT))
        } else if status.players.max > 0 {
            Some(tr.get("status.online.noPlayers", &[]))
        } else {
            None
        };
        if let Some(list) = list {
            embed = embed.field(
                tr.label("status.online.fields.playerList", &emojis.player_list),
                list,
                false,
            );
        }
    }

    if settings.shows_motd() {
        let motd = if status.motd.trim().is_empty() {
            tr.get("status.online.noMotd", &[])
        } else {
            truncate(&status.motd, FIELD_LIMIT)
        };
        embed = embed.field(tr.label("status.online.fields.motd", &emojis.motd), motd, false);
    }

    embed
}

fn offline_embed<S: TextStore>(tr: &Localizer<'_, S>, _snapshot: &StatusSnapshot) -> serenity::CreateEmbed {
    let guild = tr.guild;
    let server = tr.server;
    let emojis = &guild.default_emojis;

    serenity::CreateEmbed::new()
        .title(tr.get(
            "status.offline.title",
            &[
                ("emoji", emojis.offline.clone()),
                ("serverName", server.server_name.clone()),
            ],
        ))
        .description(tr.get("status.offline.description", &[]))
        .color(guild.offline_color(server))
        .field(
            tr.label("status.offline.fields.ip", &emojis.ip),
            format!("`{}`", server.display_address()),
            false,
        )
}

fn status_buttons<S: TextStore>(tr: &Localizer<'_, S>) -> Option<serenity::CreateActionRow> {
    let server = tr.server;
    let settings = &server.button_settings;
    if !settings.row_enabled() {
        return None;
    }
    let channel = server.channel()?;
    let emojis = &tr.guild.default_emojis;

    let mut buttons = Vec::new();
    if settings.shows_ip() {
        buttons.push(
            serenity::CreateButton::new(format!("ip_{channel}"))
                .label(tr.get("buttons.ip.label", &[]))
                .emoji(serenity::ReactionType::Unicode(emojis.ip.clone()))
                .style(serenity::ButtonStyle::Primary),
        );
    }
    if settings.shows_port() {
        buttons.push(
            serenity::CreateButton::new(format!("port_{channel}"))
                .label(tr.get("buttons.port.label", &[]))
                .emoji(serenity::ReactionType::Unicode(emojis.port.clone()))
                .style(serenity::ButtonStyle::Secondary),
        );
    }
    if settings.shows_players() {
        buttons.push(
            serenity::CreateButton::new(format!("players_{channel}"))
                .label(tr.get("buttons.players.label", &[]))
                .emoji(serenity::ReactionType::Unicode(emojis.players.clone()))
                .style(serenity::ButtonStyle::Success),
        );
    }

    if buttons.is_empty() {
        None
    } else {
        Some(serenity::CreateActionRow::Buttons(buttons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{GlobalDefaults, MonitoredServer};
    use crate::core::status::{PlayerCounts, ServerStatus};
    use crate::infra::texts::FileTextStore;
    use serde_json::Value;
    use tempfile::TempDir;

    async fn catalog(dir: &TempDir) -> TextCatalog<FileTextStore> {
        let store = FileTextStore::new(dir.path());
        store.install_bundled().await.unwrap();
        TextCatalog::new(store, "en").await.unwrap()
    }

    fn snapshot(status: ServerStatus, icon: Option<Vec<u8>>) -> StatusSnapshot {
        let guild = GuildConfig::new(1, "Guild", &GlobalDefaults::default());
        let server = MonitoredServer::new("Survival", "play.example.net", 25566, 42, 10_000);
        StatusSnapshot {
            guild,
            server,
            status,
            icon,
        }
    }

    fn online() -> ServerStatus {
        ServerStatus {
            online: true,
            version: "1.21".to_string(),
            players: PlayerCounts {
                online: 2,
                max: 20,
                sample: vec!["Alex".to_string(), "Steve".to_string()],
            },
            motd: "Welcome".to_string(),
            latency_ms: Some(31),
            favicon: None,
            error: None,
        }
    }

    fn field_names(embed: &serenity::CreateEmbed) -> Vec<String> {
        let json = serde_json::to_value(embed).unwrap();
        json["fields"]
            .as_array()
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| f["name"].as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("äöüäöü", 4), "äöü…");
    }

    #[tokio::test]
    async fn test_online_embed_layout() {
        let dir = TempDir::new().unwrap();
        let texts = catalog(&dir).await;
        let message = render(&texts, &snapshot(online(), Some(vec![1, 2, 3])));

        let json = serde_json::to_value(&message.embed).unwrap();
        assert_eq!(json["title"], Value::from("🟢 Survival is online"));
        assert_eq!(json["color"], Value::from(0x00FF00));
        assert_eq!(json["thumbnail"]["url"], Value::from("attachment://server-icon.png"));

        let names = field_names(&message.embed);
        assert_eq!(
            names,
            vec!["🌐 IP", "⚙️ Version", "👥 Players", "📶 Ping", "👤 Online now", "📢 MOTD"]
        );
        assert_eq!(json["fields"][0]["value"], Value::from("`play.example.net:25566`"));
        assert!(message.icon.is_some());

        // Only the IP button is on by default.
        match message.components.as_slice() {
            [serenity::CreateActionRow::Buttons(buttons)] => assert_eq!(buttons.len(), 1),
            other => panic!("unexpected components: {}", other.len()),
        }
    }

    #[tokio::test]
    async fn test_hidden_fields_and_empty_player_list() {
        let dir = TempDir::new().unwrap();
        let texts = catalog(&dir).await;
        let mut snap = snapshot(online(), None);
        snap.status.players.sample.clear();
        snap.server.embed_settings.show_ip = Some(false);
        snap.server.embed_settings.show_port = Some(true);
        snap.server.embed_settings.show_motd = Some(false);

        let message = render(&texts, &snap);
        let json = serde_json::to_value(&message.embed).unwrap();
        let names = field_names(&message.embed);
        assert_eq!(
            names,
            vec!["🔑 Port", "⚙️ Version", "👥 Players", "📶 Ping", "👤 Online now"]
        );
        assert_eq!(json["fields"][4]["value"], Value::from("Nobody is online right now"));
        assert!(json.get("thumbnail").map_or(true, Value::is_null));
    }

    #[tokio::test]
    async fn test_offline_embed_uses_saved_icon_and_server_language() {
        let dir = TempDir::new().unwrap();
        let texts = catalog(&dir).await;
        let mut snap = snapshot(ServerStatus::offline("timeout"), Some(vec![9]));
        snap.server.text_settings.language = "de".to_string();
        snap.server.embed_settings.color_offline = Some("#123456".to_string());

        let message = render(&texts, &snap);
        let json = serde_json::to_value(&message.embed).unwrap();
        assert_eq!(json["title"], Value::from("🔴 Survival ist offline"));
        assert_eq!(json["color"], Value::from(0x123456));
        assert_eq!(field_names(&message.embed), vec!["🌐 IP"]);
        assert!(message.icon.is_some());

        snap.server.use_server_icon = false;
        assert!(render(&texts, &snap).icon.is_none());
    }

    #[tokio::test]
    async fn test_button_row_follows_settings() {
        let dir = TempDir::new().unwrap();
        let texts = catalog(&dir).await;
        let mut snap = snapshot(online(), None);
        snap.server.button_settings.show_port_button = Some(true);
        snap.server.button_settings.show_players_button = Some(true);
        match render(&texts, &snap).components.as_slice() {
            [serenity::CreateActionRow::Buttons(buttons)] => assert_eq!(buttons.len(), 3),
            other => panic!("unexpected components: {}", other.len()),
        }

        snap.server.button_settings.show_ip_button = Some(false);
        snap.server.button_settings.show_port_button = None;
        snap.server.button_settings.show_players_button = None;
        assert!(render(&texts, &snap).components.is_empty());

        snap.server.button_settings.show_ip_button = None;
        snap.server.button_settings.enabled = Some(false);
        assert!(render(&texts, &snap).components.is_empty());
    }
}

// Replies to the IP / port / players buttons under a status message.

use super::custom_ids::StatusButton;
use crate::core::config::{GuildConfig, MonitoredServer};
use crate::core::status::ServerStatus;
use crate::core::texts::{fill_placeholders, TextCatalog, TextStore};
use crate::discord::monitoring::status_embed::truncate;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

const MESSAGE_LIMIT: usize = 2000;

fn server_vars(server: &MonitoredServer) -> Vec<(&'static str, String)> {
    vec![
        ("ip", server.display_address()),
        ("port", server.server_port.to_string()),
        ("serverName", server.server_name.clone()),
    ]
}

pub fn ip_reply(config: &GuildConfig, server: &MonitoredServer) -> String {
    fill_placeholders(&config.default_button_messages.ip_message, &server_vars(server))
}

pub fn port_reply(config: &GuildConfig, server: &MonitoredServer) -> String {
    fill_placeholders(&config.default_button_messages.port_message, &server_vars(server))
}

pub fn players_reply<S: TextStore>(
    texts: &TextCatalog<S>,
    config: &GuildConfig,
    server: &MonitoredServer,
    status: &ServerStatus,
) -> String {
    if !status.online {
        return texts.text(config, Some(server), "buttons.players.offline", &[]);
    }
    let players = &status.players;
    if players.sample.is_empty() {
        return texts.text(
            config,
            Some(server),
            "buttons.players.noPlayers",
            &[("max", players.max.to_string())],
        );
    }

    let mut vars = server_vars(server);
    vars.push(("count", players.online.to_string()));
    vars.push(("max", players.max.to_string()));
    vars.push(("players", players.sample.join("\n")));
    truncate(
        &fill_placeholders(&config.default_button_messages.players_message, &vars),
        MESSAGE_LIMIT,
    )
}

fn ephemeral(content: String) -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

pub async fn handle(
    ctx: &serenity::Context,
    data: &Data,
    mci: &serenity::ComponentInteraction,
    button: StatusButton,
) -> Result<(), Error> {
    let Some(guild_id) = mci.guild_id else {
        return Ok(());
    };
    let channel_id = match button {
        StatusButton::Ip(c) | StatusButton::Port(c) | StatusButton::Players(c) => c,
    };

    let config = data.config.load_guild(guild_id.get()).await?;
    let Some((config, server)) = config.and_then(|config| {
        let server = config.server_by_channel(channel_id).cloned()?;
        Some((config, server))
    }) else {
        let language = data.guild_language(Some(guild_id)).await;
        let text = data.texts.get(&language, "buttons.error.serverNotFound", &[]);
        mci.create_response(&ctx.http, ephemeral(text)).await?;
        return Ok(());
    };

    match button {
        StatusButton::Ip(_) => {
            mci.create_response(&ctx.http, ephemeral(ip_reply(&config, &server)))
                .await?;
        }
        StatusButton::Port(_) => {
            mci.create_response(&ctx.http, ephemeral(port_reply(&config, &server)))
                .await?;
        }
        StatusButton::Players(_) => {
            mci.defer_ephemeral(&ctx.http).await?;
            let status = data.status.query(&server.server_ip, server.server_port).await;
            let text = players_reply(&data.texts, &config, &server, &status);
            mci.edit_response(&ctx.http, serenity::EditInteractionResponse::new().content(text))
                .await?;
        }
    }

    tracing::debug!(guild_id = guild_id.get(), channel_id, ?button, "Answered status button");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GlobalDefaults;
    use crate::core::status::PlayerCounts;
    use crate::infra::texts::FileTextStore;
    use tempfile::TempDir;

    fn guild() -> (GuildConfig, MonitoredServer) {
        let config = GuildConfig::new(7, "Guild", &GlobalDefaults::default());
        let server = MonitoredServer::new("Skyblock", "sky.example.net", 25565, 99, 10_000);
        (config, server)
    }

    fn online(sample: &[&str]) -> ServerStatus {
        ServerStatus {
            online: true,
            version: "1.20.4".to_string(),
            players: PlayerCounts {
                online: sample.len() as u32,
                max: 50,
                sample: sample.iter().map(|s| s.to_string()).collect(),
            },
            motd: String::new(),
            latency_ms: Some(12),
            favicon: None,
            error: None,
        }
    }

    async fn catalog(dir: &TempDir) -> TextCatalog<FileTextStore> {
        let store = FileTextStore::new(dir.path());
        store.install_bundled().await.unwrap();
        TextCatalog::new(store, "en").await.unwrap()
    }

    #[test]
    fn ip_and_port_use_the_configured_templates() {
        let (mut config, server) = guild();
        assert_eq!(ip_reply(&config, &server), "📋 **Server IP:**\n```\nsky.example.net\n```");
        assert_eq!(port_reply(&config, &server), "🔑 **Server Port:**\n```\n25565\n```");

        config.default_button_messages.ip_message = "{serverName} → {ip}".to_string();
        assert_eq!(ip_reply(&config, &server), "Skyblock → sky.example.net");
    }

    #[tokio::test]
    async fn test_players_reply_lists_names() {
        let dir = TempDir::new().unwrap();
        let texts = catalog(&dir).await;
        let (config, server) = guild();

        let reply = players_reply(&texts, &config, &server, &online(&["Alex", "Steve"]));
        assert_eq!(reply, "👥 **Online (2/50):**\n```\nAlex\nSteve\n```");
    }

    #[tokio::test]
    async fn test_players_reply_offline_and_empty() {
        let dir = TempDir::new().unwrap();
        let texts = catalog(&dir).await;
        let (config, server) = guild();

        let offline = players_reply(&texts, &config, &server, &ServerStatus::offline("timeout"));
        assert_eq!(offline, "❌ **The server is offline or unreachable!**");

        let empty = players_reply(&texts, &config, &server, &online(&[]));
        assert_eq!(empty, "👥 **Online (0/50):**\n➖ Nobody is online");
    }
}

// The add-server flow: modal, then a channel pick awaited in place.
//
// The pending server lives on this handler's stack until the channel is
// chosen, so an abandoned flow leaves nothing behind.

use super::custom_ids::CHANNEL_SELECT;
use super::menus::{self, ChannelChoice, PendingServer, Tr};
use crate::core::config::{MonitoredServer, DEFAULT_PORT};
use crate::core::permissions::ChannelPermission;
use crate::discord::channel_access;
use crate::discord::commands::guild_name;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;
use std::time::Duration;

pub const SESSION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    Empty,
    Port(String),
}

impl FormError {
    pub fn text<S: crate::core::texts::TextStore>(&self, tr: &Tr<'_, S>) -> String {
        match self {
            FormError::Empty => tr.get("errors.invalidInput"),
            FormError::Port(value) => tr.with("errors.invalidPort", &[("value", value.clone())]),
        }
    }
}

/// Value of a text input in a submitted modal.
pub fn input_value(modal: &serenity::ModalInteraction, custom_id: &str) -> Option<String> {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                input.value.clone()
            }
            _ => None,
        })
}

/// Validates the server modal. An empty port means the default port.
pub fn parse_server_form(
    name: Option<String>,
    address: Option<String>,
    port: Option<String>,
) -> Result<PendingServer, FormError> {
    let name = name.unwrap_or_default().trim().to_string();
    let address = address.unwrap_or_default().trim().to_string();
    if name.is_empty() || address.is_empty() {
        return Err(FormError::Empty);
    }

    let port = port.unwrap_or_default();
    let port = match port.trim() {
        "" => DEFAULT_PORT,
        raw => match raw.parse::<u16>() {
            Ok(p) if p > 0 => p,
            _ => return Err(FormError::Port(raw.to_string())),
        },
    };

    Ok(PendingServer {
        name,
        address,
        port,
    })
}

pub fn read_server_form(modal: &serenity::ModalInteraction) -> Result<PendingServer, FormError> {
    parse_server_form(
        input_value(modal, menus::INPUT_NAME),
        input_value(modal, menus::INPUT_ADDRESS),
        input_value(modal, menus::INPUT_PORT),
    )
}

fn missing_in_channel(ctx: &serenity::Context, channel_id: u64) -> Vec<ChannelPermission> {
    let channel = ctx
        .cache
        .channel(serenity::ChannelId::new(channel_id))
        .map(|c| serenity::GuildChannel::clone(&c));
    match channel {
        Some(channel) => channel_access::missing_in(&ctx.cache, &channel),
        None => ChannelPermission::REQUIRED.to_vec(),
    }
}

pub async fn add_server(
    ctx: &serenity::Context,
    data: &Data,
    modal: &serenity::ModalInteraction,
    guild_id: serenity::GuildId,
) -> Result<(), Error> {
    let name = guild_name(&ctx.cache, guild_id);
    let config = data.guild_config(guild_id, &name).await?;
    let tr = Tr::new(&data.texts, &config);

    let pending = match read_server_form(modal) {
        Ok(pending) => pending,
        Err(e) => {
            let response = serenity::CreateInteractionResponse::Message(menus::notice(e.text(&tr)).message());
            modal.create_response(&ctx.http, response).await?;
            return Ok(());
        }
    };

    // A channel holds at most one status message.
    let used: Vec<u64> = config.servers.iter().filter_map(MonitoredServer::channel).collect();
    let choices = channel_access::text_channels(&ctx.cache, guild_id)
        .into_iter()
        .filter(|c| !used.contains(&c.id.get()))
        .map(|c| ChannelChoice {
            id: c.id.get(),
            ready: channel_access::missing_in(&ctx.cache, &c).is_empty(),
            name: c.name,
        })
        .collect();
    let choices = menus::order_channel_choices(choices);
    if choices.is_empty() {
        let text = tr.get("setup.servers.channelSelect.noChannels");
        let response = serenity::CreateInteractionResponse::Message(menus::notice(text).message());
        modal.create_response(&ctx.http, response).await?;
        return Ok(());
    }

    let select_id = format!("{CHANNEL_SELECT}{}", modal.id.get());
    let picker = menus::channel_picker(&tr, &pending, &choices, &select_id);
    modal
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(picker.message()),
        )
        .await?;

    let expected = select_id.clone();
    let Some(mci) = serenity::ComponentInteractionCollector::new(ctx)
        .author_id(modal.user.id)
        .timeout(SESSION_TIMEOUT)
        .filter(move |mci| mci.data.custom_id == expected)
        .await
    else {
        tracing::debug!(guild_id = guild_id.get(), server = %pending.name, "Add-server session expired");
        modal
            .edit_response(&ctx.http, menus::session_expired(&tr).edit())
            .await?;
        return Ok(());
    };

    let channel_id = match &mci.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => {
            values.first().and_then(|v| v.parse::<u64>().ok())
        }
        _ => None,
    };
    let Some(channel_id) = channel_id.filter(|id| *id != 0) else {
        return Ok(());
    };

    let missing = missing_in_channel(ctx, channel_id);
    if !missing.is_empty() {
        let list = channel_access::permission_list(&data.texts, &tr.language, &missing);
        mci.create_response(&ctx.http, menus::missing_permissions(&tr, channel_id, list).update())
            .await?;
        return Ok(());
    }

    // Reload: the config may have changed while the picker was open.
    let mut config = data.guild_config(guild_id, &name).await?;
    let interval = data.config.defaults().await.update_interval;
    config.servers.push(MonitoredServer::new(
        pending.name.clone(),
        pending.address.clone(),
        pending.port,
        channel_id,
        interval,
    ));
    data.config.save_guild(guild_id.get(), &config).await?;
    tracing::info!(
        guild_id = guild_id.get(),
        channel_id,
        server = %pending.name,
        address = %pending.display_address(),
        "Server added"
    );

    let done = menus::success(
        &tr,
        tr.get("setup.servers.added.title"),
        tr.with(
            "setup.servers.added.description",
            &[
                ("serverName", pending.name.clone()),
                ("channel", menus::channel_mention(channel_id)),
            ],
        ),
        "servers",
    );
    mci.create_response(&ctx.http, done.update()).await?;

    data.monitoring.start_monitoring(guild_id.get()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn accepts_trimmed_values_and_default_port() {
        let pending = parse_server_form(some(" Lobby "), some("mc.example.net "), some("")).unwrap();
        assert_eq!(
            pending,
            PendingServer {
                name: "Lobby".to_string(),
                address: "mc.example.net".to_string(),
                port: DEFAULT_PORT,
            }
        );

        let custom = parse_server_form(some("Lobby"), some("10.0.0.5"), some("25570")).unwrap();
        assert_eq!(custom.port, 25570);
    }

    #[test]
    fn rejects_empty_fields_and_bad_ports() {
        assert_eq!(
            parse_server_form(some("  "), some("host"), None),
            Err(FormError::Empty)
        );
        assert_eq!(parse_server_form(some("x"), None, None), Err(FormError::Empty));
        assert_eq!(
            parse_server_form(some("x"), some("host"), some("70000")),
            Err(FormError::Port("70000".to_string()))
        );
        assert_eq!(
            parse_server_form(some("x"), some("host"), some("0")),
            Err(FormError::Port("0".to_string()))
        );
        assert_eq!(
            parse_server_form(some("x"), some("host"), some("abc")),
            Err(FormError::Port("abc".to_string()))
        );
    }
}

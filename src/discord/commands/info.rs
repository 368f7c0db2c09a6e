use super::setup_permission_check;
use crate::discord::channel_access;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::Mentionable;

/// Show bot statistics.
#[poise::command(slash_command, guild_only)]
pub async fn botinfo(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let guild_id = ctx.guild_id();
    let servers = match guild_id {
        Some(guild_id) => data
            .config
            .load_guild(guild_id.get())
            .await?
            .map_or(0, |config| config.servers.len()),
        None => 0,
    };
    let guilds = ctx.cache().guilds().len();
    let ping = ctx.ping().await;
    let language = data.guild_language(guild_id).await;
    let t = |key: &str| data.texts.get(&language, key, &[]);

    let mut embed = serenity::CreateEmbed::new()
        .title(t("commands.botinfo.title"))
        .color(0x5865F2)
        .field(t("commands.botinfo.fields.servers"), servers.to_string(), true)
        .field(t("commands.botinfo.fields.guilds"), guilds.to_string(), true)
        .field(
            t("commands.botinfo.fields.ping"),
            format!("{}ms", ping.as_millis()),
            true,
        )
        .field(
            t("commands.botinfo.fields.version"),
            format!("v{}", env!("CARGO_PKG_VERSION")),
            true,
        )
        .footer(serenity::CreateEmbedFooter::new(t("commands.botinfo.footer")))
        .timestamp(serenity::Timestamp::now());

    if let Some(avatar) = ctx.cache().current_user().avatar_url() {
        embed = embed.thumbnail(avatar);
    }

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Check the bot's permissions in a channel.
#[poise::command(slash_command, guild_only, check = "setup_permission_check")]
pub async fn checkperms(
    ctx: Context<'_>,
    #[description = "Channel to check (defaults to this one)"]
    #[channel_types("Text")]
    channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let data = ctx.data();
    let language = data.guild_language(ctx.guild_id()).await;
    let t = |key: &str| data.texts.get(&language, key, &[]);

    let channel = match channel {
        Some(channel) => Some(channel),
        None => ctx.guild_channel().await,
    };
    let Some(channel) = channel.filter(|c| c.kind == serenity::ChannelType::Text) else {
        ctx.send(
            poise::CreateReply::default()
                .content(t("commands.checkperms.errors.notTextChannel"))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    let missing = channel_access::missing_in(ctx.cache(), &channel);
    let (title, color) = if missing.is_empty() {
        (t("commands.checkperms.title.allPermissions"), 0x57F287)
    } else {
        (t("commands.checkperms.title.missingPermissions"), 0xED4245)
    };

    let mut embed = serenity::CreateEmbed::new()
        .title(title)
        .description(data.texts.get(
            &language,
            "commands.checkperms.channel",
            &[("channel", channel.mention().to_string())],
        ))
        .color(color)
        .field(
            t("commands.checkperms.fields.permissions"),
            channel_access::permission_list(&data.texts, &language, &missing),
            false,
        );
    if !missing.is_empty() {
        embed = embed.field(
            t("commands.checkperms.fields.solution.label"),
            t("commands.checkperms.fields.solution.text"),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

// Commands that reset the bot's view of a guild.

use super::setup_permission_check;
use crate::discord::{Context, Error};

/// Reload configuration and texts, then restart monitoring.
#[poise::command(slash_command, guild_only, check = "setup_permission_check")]
pub async fn reload(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    ctx.defer_ephemeral().await?;

    let data = ctx.data();
    data.config.reload_global().await?;
    let default_language = data.config.defaults().await.text_settings.default_language;
    data.texts.set_default_language(&default_language);
    let languages = data.texts.reload().await?;
    let servers = data.monitoring.start_monitoring(guild_id.get()).await?;
    tracing::info!(guild_id = guild_id.get(), languages, servers, "Reloaded configuration");

    let language = data.guild_language(Some(guild_id)).await;
    ctx.say(data.texts.get(&language, "commands.reload.success", &[]))
        .await?;
    Ok(())
}

/// Delete and re-post every status message of this server.
#[poise::command(slash_command, guild_only, check = "setup_permission_check")]
pub async fn refresh(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    ctx.defer_ephemeral().await?;

    let data = ctx.data();
    let language = data.guild_language(Some(guild_id)).await;
    let text = match data.monitoring.refresh_guild(guild_id.get()).await {
        Ok(report) => {
            tracing::info!(
                guild_id = guild_id.get(),
                deleted = report.deleted,
                errors = report.errors,
                "Refreshed status messages"
            );
            data.texts.get(
                &language,
                "commands.refresh.success",
                &[
                    ("deleted", report.deleted.to_string()),
                    ("errors", report.errors.to_string()),
                ],
            )
        }
        Err(e) => {
            tracing::error!(guild_id = guild_id.get(), "Refresh failed: {}", e);
            data.texts.get(&language, "commands.refresh.error", &[])
        }
    };

    ctx.say(text).await?;
    Ok(())
}

// Discord commands module.
// Each command group gets its own file; shared types live here.

pub mod info;
pub mod maintenance;
pub mod setup;

use crate::core::config::{ConfigService, GuildConfig};
use crate::core::monitoring::MonitoringService;
use crate::core::permissions::has_setup_permission;
use crate::core::status::StatusSource;
use crate::core::texts::TextCatalog;
use crate::infra::config::JsonConfigStore;
use crate::infra::texts::FileTextStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub type Texts = TextCatalog<FileTextStore>;
pub type Monitoring = MonitoringService<JsonConfigStore>;

/// Data that's shared across all commands and interaction handlers.
pub struct Data {
    pub config: Arc<ConfigService<JsonConfigStore>>,
    pub texts: Arc<Texts>,
    pub status: Arc<dyn StatusSource>,
    pub monitoring: Arc<Monitoring>,
}

impl Data {
    pub async fn guild_config(
        &self,
        guild_id: serenity::GuildId,
        guild_name: &str,
    ) -> Result<GuildConfig, Error> {
        Ok(self
            .config
            .load_or_create_guild(guild_id.get(), guild_name)
            .await?)
    }

    /// Language for replies that belong to no particular server.
    pub async fn guild_language(&self, guild_id: Option<serenity::GuildId>) -> String {
        if let Some(guild_id) = guild_id {
            match self.config.load_guild(guild_id.get()).await {
                Ok(Some(config)) => return config.effective_language(None).to_string(),
                Ok(None) => {}
                Err(e) => tracing::warn!(guild_id = guild_id.get(), "Failed to load guild config: {}", e),
            }
        }
        self.texts.default_language()
    }
}

/// Cached guild name, empty when the guild is not cached.
pub fn guild_name(cache: &serenity::Cache, guild_id: serenity::GuildId) -> String {
    cache
        .guild(guild_id)
        .map(|guild| guild.name.clone())
        .unwrap_or_default()
}

pub fn member_may_setup(member: &serenity::Member, config: &GuildConfig) -> bool {
    let is_admin = member.permissions.is_some_and(|p| p.administrator());
    let roles: Vec<u64> = member.roles.iter().map(|r| r.get()).collect();
    has_setup_permission(&config.setup_permissions, is_admin, &roles)
}

/// Command check: Administrator (when allowed) or one of the guild's setup roles.
pub async fn setup_permission_check(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };
    let name = guild_name(ctx.cache(), guild_id);
    let config = ctx.data().guild_config(guild_id, &name).await?;

    Ok(match ctx.author_member().await {
        Some(member) => member_may_setup(&member, &config),
        None => false,
    })
}

pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::CommandCheckFailed { ctx, error, .. } => {
            if let Some(error) = error {
                tracing::error!(command = %ctx.command().name, "Permission check failed: {}", error);
            }
            reply_error(ctx, "commands.errors.noPermission").await;
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                command = %ctx.command().name,
                guild_id = ?ctx.guild_id().map(|g| g.get()),
                "Command failed: {}",
                error
            );
            reply_error(ctx, "commands.errors.generalError").await;
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {}", e);
            }
        }
    }
}

async fn reply_error(ctx: Context<'_>, key: &str) {
    let language = ctx.data().guild_language(ctx.guild_id()).await;
    let text = ctx.data().texts.get(&language, key, &[]);
    if let Err(e) = ctx
        .send(poise::CreateReply::default().content(text).ephemeral(true))
        .await
    {
        tracing::warn!("Failed to send error reply: {}", e);
    }
}

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        setup::setup(),
        maintenance::reload(),
        maintenance::refresh(),
        info::botinfo(),
        info::checkperms(),
    ]
}

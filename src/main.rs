// This is the entry point of the Minecraft status bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON files, Server List Ping)
// - `discord/` = Discord-specific adapters (commands, menus, status messages)
// - `cli/` = Command line parsing and the `doctor` tools
//
// This file's job is to:
// 1. Parse the command line and load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "cli/cli_layer.rs"]
mod cli;
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::cli::{Cli, Commands, DataPaths};
use crate::core::config::{ConfigService, GlobalConfig, TOKEN_PLACEHOLDER};
use crate::core::status::StatusSource;
use crate::core::texts::TextCatalog;
use crate::discord::commands::on_error;
use crate::discord::monitoring::DiscordPublisher;
use crate::discord::{Data, Error};
use crate::infra::config::JsonConfigStore;
use crate::infra::state::JsonStateStore;
use crate::infra::status::{FileIconStore, SlpClient, DEFAULT_TIMEOUT};
use crate::infra::texts::FileTextStore;
use anyhow::Context;
use clap::Parser;
use poise::serenity_prelude as serenity;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let Err(e) = discord::setup::handle_interaction(ctx, data, interaction).await {
                tracing::error!("Failed to handle interaction: {}", e);
            }
        }
        serenity::FullEvent::GuildCreate { guild, is_new } => {
            // Joined after startup: give the guild a config right away.
            if *is_new == Some(true) {
                tracing::info!(guild_id = guild.id.get(), guild = %guild.name, "Joined guild");
                if let Err(e) = data
                    .config
                    .load_or_create_guild(guild.id.get(), &guild.name)
                    .await
                {
                    tracing::error!(guild_id = guild.id.get(), "Failed to create guild config: {}", e);
                }
            }
        }
        serenity::FullEvent::GuildDelete { incomplete, .. } => {
            if !incomplete.unavailable {
                let guild_id = incomplete.id.get();
                if data.monitoring.stop_monitoring(guild_id) {
                    tracing::info!(guild_id, "Left guild, monitoring stopped");
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Stdout plus a daily rolling file under `logs/`. The guard flushes the file
/// writer and must live as long as the process.
fn init_tracing(
    paths: &DataPaths,
    verbose: bool,
) -> tracing_appender::non_blocking::WorkerGuard {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},serenity=warn,h2=warn,hyper=warn,rustls=warn")));

    let file_appender = tracing_appender::rolling::daily(paths.logs(), "bot.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    guard
}

/// `DISCORD_TOKEN` wins over the token in `global-config.json`.
fn resolve_token(env_token: Option<String>, global: &GlobalConfig) -> anyhow::Result<String> {
    let token = env_token
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| global.token.clone());
    let token = token.trim().to_string();
    if token.is_empty() || token == TOKEN_PLACEHOLDER {
        anyhow::bail!(
            "No bot token configured. Set DISCORD_TOKEN in .env or `token` in global-config.json."
        );
    }
    Ok(token)
}

async fn run_bot(paths: DataPaths) -> anyhow::Result<()> {
    paths
        .create_all()
        .with_context(|| format!("Failed to create data folders in {}", paths.root().display()))?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let config = Arc::new(
        ConfigService::new(JsonConfigStore::new(paths.root()))
            .await
            .context("Failed to load global-config.json")?,
    );
    let global = config.global().await;

    let _log_guard = init_tracing(&paths, global.verbose_logging);
    tracing::info!(data_dir = %paths.root().display(), "Starting Minecraft status bot v{}", env!("CARGO_PKG_VERSION"));

    let token = resolve_token(std::env::var("DISCORD_TOKEN").ok(), &global)?;

    let text_store = FileTextStore::new(paths.texts());
    text_store
        .install_bundled()
        .await
        .context("Failed to install bundled language files")?;
    let texts = Arc::new(
        TextCatalog::new(text_store, &global.defaults.text_settings.default_language)
            .await
            .context("Failed to load language files")?,
    );

    let status: Arc<dyn StatusSource> = Arc::new(SlpClient::new(DEFAULT_TIMEOUT));
    let states = Arc::new(JsonStateStore::new(paths.states()));
    let icons = Arc::new(FileIconStore::new(paths.icons()));

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Only guild events are needed: commands and components arrive as interactions.

    let intents = serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    tracing::info!(
                        command = %ctx.command().qualified_name,
                        user = %ctx.author().name,
                        guild_id = ctx.guild_id().map(|g| g.get()),
                        "Running command"
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    tracing::debug!(command = %ctx.command().qualified_name, "Command finished");
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "Connected to Discord");

                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");

                // The publisher needs the gateway's HTTP client and cache,
                // so monitoring can only be wired up once we are connected.
                let publisher = Arc::new(DiscordPublisher::new(
                    ctx.http.clone(),
                    ctx.cache.clone(),
                    Arc::clone(&texts),
                ));
                let monitoring = Arc::new(discord::commands::Monitoring::new(
                    Arc::clone(&config),
                    states,
                    Arc::clone(&status),
                    icons,
                    publisher,
                ));

                let guild_ids: Vec<u64> = ready.guilds.iter().map(|g| g.id.get()).collect();
                let started = monitoring.start_all(&guild_ids).await;
                tracing::info!(servers = started, "Monitoring started");

                let shutdown_monitoring = Arc::clone(&monitoring);
                let shard_manager = framework.shard_manager().clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Shutting down");
                        shutdown_monitoring.shutdown().await;
                        shard_manager.shutdown_all().await;
                    }
                });

                Ok(Data {
                    config,
                    texts,
                    status,
                    monitoring,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Failed to create Discord client")?;

    client.start().await.context("Discord client stopped with an error")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let paths = DataPaths::new(cli.data_dir);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            run_bot(paths).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Doctor { cmd } => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .init();
            if cli::doctor::run(&paths, cmd).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_token_overrides_config() {
        let mut global = GlobalConfig::default();
        global.token = "from-config".to_string();
        assert_eq!(
            resolve_token(Some("from-env".to_string()), &global).unwrap(),
            "from-env"
        );
        assert_eq!(resolve_token(None, &global).unwrap(), "from-config");
        assert_eq!(
            resolve_token(Some("  ".to_string()), &global).unwrap(),
            "from-config"
        );
    }

    #[test]
    fn placeholder_token_is_rejected() {
        let global = GlobalConfig::default();
        assert!(resolve_token(None, &global).is_err());
    }
}

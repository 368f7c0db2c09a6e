// `doctor` subcommands. Each returns whether the checked thing is healthy;
// the caller maps `false` to exit code 1.

use super::{DataPaths, DoctorCommand, LangCommand};
use crate::core::config::GuildConfig;
use crate::core::diagnostics::{
    analyze_states, apply_entry_cleanup, check_global_config, check_guild_config,
    check_languages, plan_cleanup, CleanupAction, Report,
};
use crate::core::state::{GuildState, StateStore};
use crate::core::status::ServerStatus;
use crate::core::texts::TextCatalog;
use crate::infra::json_files::{guild_file_name, list_guild_files, read_optional};
use crate::infra::state::JsonStateStore;
use crate::infra::status::{SlpClient, DEFAULT_TIMEOUT};
use crate::infra::texts::FileTextStore;
use anyhow::Context;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

const DISCORD_GATEWAY_URL: &str = "https://discord.com/api/v10/gateway";

pub async fn run(paths: &DataPaths, cmd: DoctorCommand) -> anyhow::Result<bool> {
    match cmd {
        DoctorCommand::CheckConfig => check_config(paths).await,
        DoctorCommand::CheckLanguages => check_language_files(paths).await,
        DoctorCommand::StateReport => state_report(paths).await,
        DoctorCommand::StateCleanup { yes } => state_cleanup(paths, yes).await,
        DoctorCommand::Ping { address, port } => ping(&address, port).await,
        DoctorCommand::Network { sample } => network(&sample).await,
        DoctorCommand::Lang { cmd } => lang(paths, cmd).await,
    }
}

fn print_report(title: &str, report: &Report) {
    println!("== {title} ==");
    for issue in &report.issues {
        println!("  ❌ {issue}");
    }
    for warning in &report.warnings {
        println!("  ⚠️  {warning}");
    }
    if report.issues.is_empty() && report.warnings.is_empty() {
        println!("  ✅ no findings");
    }
}

/// Validates the raw JSON of the global config and all guild configs.
pub async fn config_report(paths: &DataPaths, token_override: Option<&str>) -> anyhow::Result<Report> {
    let mut report = Report::default();

    match read_optional(&paths.global_config()).await? {
        None => report.issue("global-config.json does not exist"),
        Some(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(value) => report.merge(check_global_config(&value, token_override)),
            Err(e) => report.issue(format!("global-config.json is not valid JSON: {e}")),
        },
    }

    for guild_id in list_guild_files(&paths.configs()).await? {
        let path = paths.configs().join(guild_file_name(guild_id));
        let Some(raw) = read_optional(&path).await? else {
            continue;
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => report.merge(check_guild_config(guild_id, &value)),
            Err(e) => report.issue(format!("Guild {guild_id}: config is not valid JSON: {e}")),
        }
    }

    Ok(report)
}

async fn check_config(paths: &DataPaths) -> anyhow::Result<bool> {
    let token = std::env::var("DISCORD_TOKEN").ok();
    let report = config_report(paths, token.as_deref()).await?;
    print_report("Configuration", &report);
    Ok(report.is_ok())
}

async fn check_language_files(paths: &DataPaths) -> anyhow::Result<bool> {
    let texts = TextCatalog::new(FileTextStore::new(paths.texts()), "en")
        .await
        .context("Failed to load language files")?;
    let bundles = texts.bundles();
    println!("Loaded languages: {}", bundles.keys().cloned().collect::<Vec<_>>().join(", "));

    let report = check_languages(&bundles);
    print_report("Languages", &report);
    Ok(report.is_ok())
}

/// Guild configs as stored, without migration.
#[derive(Debug, Default)]
pub struct StoredConfigs {
    pub configs: BTreeMap<u64, GuildConfig>,
    /// Guilds whose config file exists but does not parse, with the parse error.
    pub unreadable: BTreeMap<u64, String>,
}

impl StoredConfigs {
    pub fn unreadable_ids(&self) -> BTreeSet<u64> {
        self.unreadable.keys().copied().collect()
    }
}

pub async fn load_guild_configs(paths: &DataPaths) -> anyhow::Result<StoredConfigs> {
    let mut stored = StoredConfigs::default();
    for guild_id in list_guild_files(&paths.configs()).await? {
        let path = paths.configs().join(guild_file_name(guild_id));
        let Some(raw) = read_optional(&path).await? else {
            continue;
        };
        match serde_json::from_str::<GuildConfig>(&raw) {
            Ok(config) => {
                stored.configs.insert(guild_id, config);
            }
            Err(e) => {
                tracing::warn!(guild_id, "Unreadable guild config: {}", e);
                stored.unreadable.insert(guild_id, e.to_string());
            }
        }
    }
    Ok(stored)
}

async fn load_states(store: &JsonStateStore) -> anyhow::Result<BTreeMap<u64, GuildState>> {
    let mut states = BTreeMap::new();
    for guild_id in store.guild_ids().await? {
        states.insert(guild_id, store.guild_state(guild_id).await?);
    }
    Ok(states)
}

async fn state_report(paths: &DataPaths) -> anyhow::Result<bool> {
    let store = JsonStateStore::new(paths.states());
    let states = load_states(&store).await?;
    let stored = load_guild_configs(paths).await?;
    let report = analyze_states(&states, &stored.configs);

    println!("== State ==");
    for guild in &report.guilds {
        println!(
            "  guild {} ({}): {} entries, {} active, {} orphaned",
            guild.guild_id,
            guild.guild_name.as_deref().unwrap_or("no config"),
            guild.entries,
            guild.active,
            guild.orphaned
        );
    }
    println!(
        "  total: {} entries, {} active, {} orphaned",
        report.total_entries(),
        report.total_active(),
        report.total_orphaned()
    );
    for (guild_id, error) in &stored.unreadable {
        println!("  ❌ guild {guild_id}: config does not parse: {error}");
    }
    if let (Some(oldest), Some(newest)) = (report.oldest_update, report.newest_update) {
        println!("  updates between {} and {}", oldest.to_rfc3339(), newest.to_rfc3339());
    }
    Ok(true)
}

fn describe(action: &CleanupAction) -> String {
    match action {
        CleanupAction::DeleteStateFile { guild_id } => {
            format!("delete state file of guild {guild_id} (no config)")
        }
        CleanupAction::RemoveOrphanedEntry { guild_id, channel_id } => {
            format!("guild {guild_id}: remove entry for unconfigured channel {channel_id}")
        }
        CleanupAction::RemoveEmptyEntry { guild_id, channel_id } => {
            format!("guild {guild_id}: remove empty entry for channel {channel_id}")
        }
    }
}

/// Applies a cleanup plan. Returns the number of removed files and entries.
pub async fn apply_cleanup(
    store: &JsonStateStore,
    states: BTreeMap<u64, GuildState>,
    actions: &[CleanupAction],
) -> anyhow::Result<usize> {
    let mut removed = 0;
    for (guild_id, mut state) in states {
        if actions.contains(&CleanupAction::DeleteStateFile { guild_id }) {
            store.delete_guild(guild_id).await?;
            removed += 1;
            continue;
        }
        let count = apply_entry_cleanup(guild_id, &mut state, actions);
        if count > 0 {
            store.replace_guild_state(guild_id, state).await?;
            removed += count;
        }
    }
    Ok(removed)
}

async fn state_cleanup(paths: &DataPaths, apply: bool) -> anyhow::Result<bool> {
    let store = JsonStateStore::new(paths.states());
    let states = load_states(&store).await?;
    let stored = load_guild_configs(paths).await?;
    let actions = plan_cleanup(&states, &stored.configs, &stored.unreadable_ids());

    // Their state stays untouched until the config is fixed.
    for (guild_id, error) in &stored.unreadable {
        println!("  ❌ guild {guild_id}: config does not parse, state kept: {error}");
    }
    let healthy = stored.unreadable.is_empty();

    if actions.is_empty() {
        println!("✅ Nothing to clean up");
        return Ok(healthy);
    }
    for action in &actions {
        println!("  - {}", describe(action));
    }
    if !apply {
        println!("{} change(s) planned. Run again with --yes to apply.", actions.len());
        return Ok(healthy);
    }

    let removed = apply_cleanup(&store, states, &actions).await?;
    println!("✅ Removed {removed} item(s)");
    Ok(healthy)
}

fn format_status(address: &str, port: u16, status: &ServerStatus) -> String {
    let mut lines = vec![format!("{address}:{port}")];
    if !status.online {
        lines.push("  offline".to_string());
        return lines.join("\n");
    }
    lines.push(format!("  version: {}", status.version));
    lines.push(format!(
        "  players: {}/{}",
        status.players.online, status.players.max
    ));
    if !status.players.sample.is_empty() {
        lines.push(format!("  sample: {}", status.players.sample.join(", ")));
    }
    lines.push(format!("  motd: {}", status.motd));
    if let Some(latency) = status.latency_ms {
        lines.push(format!("  ping: {latency}ms"));
    }
    lines.push(format!(
        "  icon: {}",
        if status.favicon.is_some() { "yes" } else { "no" }
    ));
    lines.join("\n")
}

async fn ping(address: &str, port: u16) -> anyhow::Result<bool> {
    let client = SlpClient::new(DEFAULT_TIMEOUT);
    match client.status(address, port).await {
        Ok(status) => {
            println!("{}", format_status(address, port, &status));
            Ok(true)
        }
        Err(e) => {
            println!("{address}:{port}\n  ❌ {e}");
            Ok(false)
        }
    }
}

async fn network(sample: &str) -> anyhow::Result<bool> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let discord_ok = match http.get(DISCORD_GATEWAY_URL).send().await {
        Ok(response) if response.status().is_success() => {
            let body: Value = response.json().await.unwrap_or_default();
            println!(
                "✅ Discord API reachable (gateway {})",
                body.get("url").and_then(Value::as_str).unwrap_or("?")
            );
            true
        }
        Ok(response) => {
            println!("❌ Discord API answered {}", response.status());
            false
        }
        Err(e) => {
            println!("❌ Discord API unreachable: {e}");
            false
        }
    };

    let minecraft_ok = ping(sample, crate::core::config::DEFAULT_PORT).await?;
    Ok(discord_ok && minecraft_ok)
}

async fn lang(paths: &DataPaths, cmd: LangCommand) -> anyhow::Result<bool> {
    let texts = TextCatalog::new(FileTextStore::new(paths.texts()), "en")
        .await
        .context("Failed to load language files")?;

    match cmd {
        LangCommand::Create { name, base } => {
            let code = texts.create_custom_language(&name, &base).await?;
            println!("✅ Created {code} from {base}");
        }
        LangCommand::Delete { code } => {
            texts.delete_custom_language(&code).await?;
            println!("✅ Deleted {code}");
        }
        LangCommand::Set { code, key, value } => {
            texts.update_custom_text(&code, &key, &value).await?;
            println!("✅ {code}: {key} = {value}");
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{GlobalConfig, GlobalDefaults, MonitoredServer};
    use crate::core::state::ChannelState;
    use crate::core::status::PlayerCounts;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, contents: &str) {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn guild_json(guild_id: u64, channels: &[u64]) -> String {
        let mut config = GuildConfig::new(guild_id, "Test Guild", &GlobalDefaults::default());
        for &channel in channels {
            config
                .servers
                .push(MonitoredServer::new("Lobby", "mc.example.org", 25565, channel, 10_000));
        }
        serde_json::to_string_pretty(&config).unwrap()
    }

    #[tokio::test]
    async fn reports_missing_global_config() {
        let dir = TempDir::new().unwrap();
        let report = config_report(&DataPaths::new(dir.path()), None).await.unwrap();
        assert!(!report.is_ok());
        assert!(report.issues[0].contains("global-config.json"));
    }

    #[tokio::test]
    async fn placeholder_token_is_an_issue_unless_overridden() {
        let dir = TempDir::new().unwrap();
        let global = serde_json::to_string_pretty(&GlobalConfig::default()).unwrap();
        write(&dir, "global-config.json", &global);
        write(&dir, "configs/guild_1.json", &guild_json(1, &[10]));
        let paths = DataPaths::new(dir.path());

        let report = config_report(&paths, None).await.unwrap();
        assert!(report.issues.iter().any(|i| i.contains("token")));
    }

    #[tokio::test]
    async fn invalid_guild_json_is_reported() {
        let dir = TempDir::new().unwrap();
        write(&dir, "configs/guild_7.json", "{ not json");
        let report = config_report(&DataPaths::new(dir.path()), None).await.unwrap();
        assert!(report.issues.iter().any(|i| i.starts_with("Guild 7")));
    }

    #[tokio::test]
    async fn cleanup_removes_orphans_and_state_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "configs/guild_1.json", &guild_json(1, &[10]));
        let paths = DataPaths::new(dir.path());
        let store = JsonStateStore::new(paths.states());
        store.set(1, 10, ChannelState::new(100, "online")).await.unwrap();
        store.set(1, 20, ChannelState::new(200, "online")).await.unwrap();
        store.set(2, 30, ChannelState::new(300, "offline")).await.unwrap();

        let states = load_states(&store).await.unwrap();
        let stored = load_guild_configs(&paths).await.unwrap();
        let actions = plan_cleanup(&states, &stored.configs, &stored.unreadable_ids());
        assert_eq!(actions.len(), 2);

        let removed = apply_cleanup(&store, states, &actions).await.unwrap();
        assert_eq!(removed, 2);

        let fresh = JsonStateStore::new(paths.states());
        assert_eq!(fresh.guild_ids().await.unwrap(), vec![1]);
        let state = fresh.guild_state(1).await.unwrap();
        assert!(state.get(10).is_some());
        assert!(state.get(20).is_none());
    }

    #[tokio::test]
    async fn cleanup_keeps_state_of_unparsable_config() {
        let dir = TempDir::new().unwrap();
        write(&dir, "configs/guild_5.json", r#"{ "servers": [ broken"#);
        let paths = DataPaths::new(dir.path());
        let store = JsonStateStore::new(paths.states());
        store.set(5, 50, ChannelState::new(500, "online")).await.unwrap();

        let healthy = state_cleanup(&paths, true).await.unwrap();

        assert!(!healthy);
        assert!(paths.states().join("guild_5.json").exists());
        let state = JsonStateStore::new(paths.states()).guild_state(5).await.unwrap();
        assert_eq!(state.get(50).and_then(ChannelState::message), Some(500));
    }

    #[test]
    fn formats_online_and_offline_status() {
        let status = ServerStatus {
            online: true,
            version: "1.21.1".to_string(),
            players: PlayerCounts {
                online: 2,
                max: 20,
                sample: vec!["Alex".to_string(), "Steve".to_string()],
            },
            motd: "Welcome".to_string(),
            latency_ms: Some(42),
            favicon: None,
            error: None,
        };
        let text = format_status("mc.example.org", 25565, &status);
        assert!(text.contains("players: 2/20"));
        assert!(text.contains("sample: Alex, Steve"));
        assert!(text.contains("ping: 42ms"));

        let text = format_status("mc.example.org", 25565, &ServerStatus::offline("timeout"));
        assert!(text.ends_with("offline"));
    }
}

use super::Report;
use crate::core::config::{normalize_hex_color, TOKEN_PLACEHOLDER};
use base64::Engine;
use serde_json::Value;

const REQUIRED_EMOJIS: [&str; 9] = [
    "online",
    "offline",
    "ip",
    "version",
    "players",
    "ping",
    "port",
    "playerList",
    "motd",
];
const KNOWN_LANGUAGES: [&str; 2] = ["de", "en"];
const MIN_INTERVAL_MS: u64 = 5_000;
const MAX_INTERVAL_MS: u64 = 300_000;

fn is_hex_color(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| s.starts_with('#') && normalize_hex_color(s).is_some())
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Format checks on a bot token. The first segment of a Discord token is the
/// base64 encoded bot id.
pub fn check_token(token: &str, report: &mut Report) {
    let token = token.trim();
    if token.is_empty() || token == TOKEN_PLACEHOLDER || token == "DEIN_BOT_TOKEN" {
        report.issue("Bot token is not set");
        return;
    }
    if token.len() < 50 {
        report.issue(format!("Bot token looks too short ({} characters)", token.len()));
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        report.issue("Bot token should have three parts separated by dots");
        return;
    }

    let bot_id = base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(parts[0].trim_end_matches('='))
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()));
    if bot_id.is_none() {
        report.warn("Could not decode the bot id from the token");
    }
}

fn check_interval(value: Option<&Value>, context: &str, report: &mut Report) {
    match value.and_then(Value::as_u64) {
        None => report.issue(format!("{context}: updateInterval missing")),
        Some(ms) if ms < MIN_INTERVAL_MS => report.warn(format!(
            "{context}: updateInterval {ms}ms is very short and may hit rate limits"
        )),
        Some(ms) if ms > MAX_INTERVAL_MS => {
            report.warn(format!("{context}: updateInterval {ms}ms is longer than 5 minutes"))
        }
        Some(_) => {}
    }
}

/// Validates `global-config.json`. `token_override` is the token taken from the
/// environment, which wins over the file.
pub fn check_global_config(raw: &Value, token_override: Option<&str>) -> Report {
    let mut report = Report::default();

    let token = token_override
        .or_else(|| raw.get("token").and_then(Value::as_str))
        .unwrap_or_default();
    check_token(token, &mut report);

    let Some(defaults) = raw.get("defaults") else {
        report.issue("defaults section missing");
        return report;
    };

    check_interval(defaults.get("updateInterval"), "defaults", &mut report);

    match defaults.get("embedColors") {
        None => report.issue("embedColors missing"),
        Some(colors) => {
            for key in ["online", "offline"] {
                if !is_hex_color(colors.get(key)) {
                    report.issue(format!("Invalid {key} color (must be hex like #00FF00)"));
                }
            }
        }
    }

    match defaults.get("defaultEmojis") {
        None => report.issue("defaultEmojis missing"),
        Some(emojis) => {
            let missing: Vec<&str> = REQUIRED_EMOJIS
                .into_iter()
                .filter(|key| non_empty_str(emojis, key).is_none())
                .collect();
            if !missing.is_empty() {
                report.issue(format!("Missing emojis: {}", missing.join(", ")));
            }
        }
    }

    match defaults.get("textSettings") {
        None => report.issue("textSettings missing"),
        Some(text) => match non_empty_str(text, "defaultLanguage") {
            None => report.issue("defaultLanguage missing"),
            Some(language) if !KNOWN_LANGUAGES.contains(&language) => {
                report.warn(format!("Unusual default language: {language}"))
            }
            Some(_) => {}
        },
    }

    report
}

/// Validates one `configs/guild_<id>.json`.
pub fn check_guild_config(guild_id: u64, raw: &Value) -> Report {
    let mut report = Report::default();
    let name = raw
        .pointer("/_guild_info/guildName")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    let context = format!("{name} ({guild_id})");

    let Some(servers) = raw.get("servers").and_then(Value::as_array) else {
        report.warn(format!("{context}: no servers array"));
        return report;
    };

    for (i, server) in servers.iter().enumerate() {
        let label = format!("{context} server {}", i + 1);
        if non_empty_str(server, "serverName").is_none() {
            report.issue(format!("{label}: missing serverName"));
        }
        if non_empty_str(server, "serverIP").is_none() {
            report.issue(format!("{label}: missing serverIP"));
        }
        match server.get("serverPort").and_then(Value::as_u64) {
            None => report.issue(format!("{label}: missing serverPort")),
            Some(port) if !(1..=65_535).contains(&port) => {
                report.issue(format!("{label}: invalid port {port}"))
            }
            Some(_) => {}
        }
        if non_empty_str(server, "channelID").is_none() {
            report.issue(format!("{label}: missing channelID"));
        }
        if server.get("updateInterval").is_some() {
            check_interval(server.get("updateInterval"), &label, &mut report);
        }
        if let Some(settings) = server.get("embedSettings") {
            for key in ["colorOnline", "colorOffline"] {
                if settings.get(key).is_some() && !is_hex_color(settings.get(key)) {
                    report.issue(format!("{label}: invalid {key}"));
                }
            }
        }
    }

    report
}

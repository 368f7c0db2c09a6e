use crate::core::config::GuildConfig;
use crate::core::state::GuildState;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuildStateSummary {
    pub guild_id: u64,
    pub guild_name: Option<String>,
    pub entries: usize,
    pub active: usize,
    pub orphaned: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateReport {
    pub guilds: Vec<GuildStateSummary>,
    pub oldest_update: Option<DateTime<Utc>>,
    pub newest_update: Option<DateTime<Utc>>,
}

impl StateReport {
    pub fn total_entries(&self) -> usize {
        self.guilds.iter().map(|g| g.entries).sum()
    }

    pub fn total_active(&self) -> usize {
        self.guilds.iter().map(|g| g.active).sum()
    }

    pub fn total_orphaned(&self) -> usize {
        self.guilds.iter().map(|g| g.orphaned).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum CleanupAction {
    /// State file whose guild has no config anymore.
    DeleteStateFile { guild_id: u64 },
    /// Entry for a channel no configured server uses.
    RemoveOrphanedEntry { guild_id: u64, channel_id: String },
    /// `null` entry or one without a message id.
    RemoveEmptyEntry { guild_id: u64, channel_id: String },
}

fn configured_channels(config: &GuildConfig) -> BTreeSet<&str> {
    config.servers.iter().map(|s| s.channel_id.as_str()).collect()
}

/// Counts per guild plus the overall update time range.
pub fn analyze_states(
    states: &BTreeMap<u64, GuildState>,
    configs: &BTreeMap<u64, GuildConfig>,
) -> StateReport {
    let mut report = StateReport::default();

    for (&guild_id, state) in states {
        let config = configs.get(&guild_id);
        let channels = config.map(configured_channels);
        let mut summary = GuildStateSummary {
            guild_id,
            guild_name: config
                .map(|c| c.guild_info.guild_name.clone())
                .filter(|n| !n.is_empty()),
            entries: state.servers.len(),
            ..GuildStateSummary::default()
        };

        for (channel_id, entry) in &state.servers {
            let Some(entry) = entry.as_ref().filter(|e| e.message().is_some()) else {
                continue;
            };
            summary.active += 1;
            if channels
                .as_ref()
                .is_some_and(|c| !c.contains(channel_id.as_str()))
            {
                summary.orphaned += 1;
            }

            if let Ok(updated) = DateTime::parse_from_rfc3339(&entry.last_update) {
                let updated = updated.with_timezone(&Utc);
                if report.oldest_update.map_or(true, |o| updated < o) {
                    report.oldest_update = Some(updated);
                }
                if report.newest_update.map_or(true, |n| updated > n) {
                    report.newest_update = Some(updated);
                }
            }
        }

        report.guilds.push(summary);
    }

    report
}

/// Everything `state-cleanup` would remove. Guilds in `unreadable` have a
/// config file that failed to parse; their state is never touched.
pub fn plan_cleanup(
    states: &BTreeMap<u64, GuildState>,
    configs: &BTreeMap<u64, GuildConfig>,
    unreadable: &BTreeSet<u64>,
) -> Vec<CleanupAction> {
    let mut actions = Vec::new();

    for (&guild_id, state) in states {
        if unreadable.contains(&guild_id) {
            continue;
        }
        let Some(config) = configs.get(&guild_id) else {
            actions.push(CleanupAction::DeleteStateFile { guild_id });
            continue;
        };
        let channels = configured_channels(config);

        for (channel_id, entry) in &state.servers {
            let has_message = entry.as_ref().is_some_and(|e| e.message().is_some());
            if !has_message {
                actions.push(CleanupAction::RemoveEmptyEntry {
                    guild_id,
                    channel_id: channel_id.clone(),
                });
            } else if !channels.contains(channel_id.as_str()) {
                actions.push(CleanupAction::RemoveOrphanedEntry {
                    guild_id,
                    channel_id: channel_id.clone(),
                });
            }
        }
    }

    actions
}

/// Applies entry removals for one guild. File deletions are left to the caller.
pub fn apply_entry_cleanup(guild_id: u64, state: &mut GuildState, actions: &[CleanupAction]) -> usize {
    let mut removed = 0;
    for action in actions {
        match action {
            CleanupAction::RemoveOrphanedEntry { guild_id: g, channel_id }
            | CleanupAction::RemoveEmptyEntry { guild_id: g, channel_id }
                if *g == guild_id =>
            {
                if state.servers.remove(channel_id).is_some() {
                    removed += 1;
                }
            }
            _ => {}
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{GlobalDefaults, MonitoredServer};
    use crate::core::state::ChannelState;

    fn config_with_channels(guild_id: u64, channels: &[u64]) -> GuildConfig {
        let mut config = GuildConfig::new(guild_id, "Test", &GlobalDefaults::default());
        for &channel in channels {
            config
                .servers
                .push(MonitoredServer::new("s", "mc.example.org", 25565, channel, 10_000));
        }
        config
    }

    fn fixture() -> (BTreeMap<u64, GuildState>, BTreeMap<u64, GuildConfig>) {
        let mut guild_state = GuildState::default();
        guild_state
            .servers
            .insert("1".to_string(), Some(ChannelState::new(10, "online")));
        guild_state
            .servers
            .insert("2".to_string(), Some(ChannelState::new(20, "offline")));
        guild_state.servers.insert("3".to_string(), None);

        let mut states = BTreeMap::new();
        states.insert(100, guild_state);
        states.insert(200, GuildState::default());

        let mut configs = BTreeMap::new();
        configs.insert(100, config_with_channels(100, &[1, 3]));
        (states, configs)
    }

    #[test]
    fn analyzes_active_and_orphaned_entries() {
        let (states, configs) = fixture();
        let report = analyze_states(&states, &configs);

        assert_eq!(report.guilds.len(), 2);
        assert_eq!(report.total_entries(), 3);
        assert_eq!(report.total_active(), 2);
        assert_eq!(report.total_orphaned(), 1);
        assert!(report.oldest_update.is_some());
        assert_eq!(report.guilds[0].guild_name.as_deref(), Some("Test"));
    }

    #[test]
    fn plans_and_applies_cleanup() {
        let (mut states, configs) = fixture();
        let actions = plan_cleanup(&states, &configs, &BTreeSet::new());

        assert_eq!(
            actions,
            vec![
                CleanupAction::RemoveOrphanedEntry { guild_id: 100, channel_id: "2".to_string() },
                CleanupAction::RemoveEmptyEntry { guild_id: 100, channel_id: "3".to_string() },
                CleanupAction::DeleteStateFile { guild_id: 200 },
            ]
        );

        let state = states.get_mut(&100).unwrap();
        assert_eq!(apply_entry_cleanup(100, state, &actions), 2);
        assert_eq!(state.servers.keys().collect::<Vec<_>>(), vec!["1"]);
    }

    #[test]
    fn unreadable_config_keeps_state() {
        let (states, configs) = fixture();
        let unreadable = BTreeSet::from([200]);

        let actions = plan_cleanup(&states, &configs, &unreadable);

        assert!(actions
            .iter()
            .all(|a| !matches!(a, CleanupAction::DeleteStateFile { guild_id: 200 })));
        assert_eq!(actions.len(), 2);
    }
}

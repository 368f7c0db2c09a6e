use super::monitoring_models::{
    PublishError, RefreshReport, SkipReason, StatusPublisher, StatusSnapshot, UpdateOutcome,
};
use crate::core::config::{ConfigError, ConfigService, ConfigStore, MonitoredServer};
use crate::core::state::{ChannelState, StateError, StateStore};
use crate::core::status::{IconStore, ServerStatus, StatusSource};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const MIN_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, thiserror::Error)]
pub enum MonitoringError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("State error: {0}")]
    State(#[from] StateError),
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
    #[error("Invalid channel id: {0:?}")]
    InvalidChannel(String),
    #[error("Guild {0} is not configured")]
    GuildNotConfigured(u64),
}

/// Timers of one guild. Cancelling the token stops every server loop after
/// its current update.
struct GuildSchedule {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Keeps one status message per monitored server in sync with the server.
pub struct MonitoringService<C: ConfigStore> {
    config: Arc<ConfigService<C>>,
    states: Arc<dyn StateStore>,
    status: Arc<dyn StatusSource>,
    icons: Arc<dyn IconStore>,
    publisher: Arc<dyn StatusPublisher>,
    schedules: DashMap<u64, GuildSchedule>,
}

impl<C: ConfigStore + 'static> MonitoringService<C> {
    pub fn new(
        config: Arc<ConfigService<C>>,
        states: Arc<dyn StateStore>,
        status: Arc<dyn StatusSource>,
        icons: Arc<dyn IconStore>,
        publisher: Arc<dyn StatusPublisher>,
    ) -> Self {
        Self {
            config,
            states,
            status,
            icons,
            publisher,
            schedules: DashMap::new(),
        }
    }

    /// One update cycle for one server: query, render, then edit the known
    /// message or post a new one. Sends or edits at most one message.
    pub async fn update_status(
        &self,
        guild_id: u64,
        server: &MonitoredServer,
    ) -> Result<UpdateOutcome, MonitoringError> {
        let channel_id = server
            .channel()
            .ok_or_else(|| MonitoringError::InvalidChannel(server.channel_id.clone()))?;

        if !self.publisher.channel_available(channel_id).await {
            tracing::debug!(guild_id, channel_id, "Channel not available, skipping update");
            return Ok(UpdateOutcome::Skipped(SkipReason::ChannelUnavailable));
        }

        let guild = self
            .config
            .load_guild(guild_id)
            .await?
            .ok_or(MonitoringError::GuildNotConfigured(guild_id))?;
        // Display settings may have changed since the timer was scheduled.
        let Some(server) = guild.server_by_channel(channel_id).cloned() else {
            tracing::debug!(guild_id, channel_id, server = %server.server_name, "Server no longer configured, skipping update");
            return Ok(UpdateOutcome::Skipped(SkipReason::NotConfigured));
        };

        let status = self.status.query(&server.server_ip, server.server_port).await;
        let icon = self.resolve_icon(guild_id, &server, &status).await;
        let snapshot = StatusSnapshot {
            guild,
            server,
            status,
            icon,
        };

        let previous = self.states.get(guild_id, channel_id).await?;
        let mut replaced = false;
        if let Some(message_id) = previous.as_ref().and_then(ChannelState::message) {
            match self.publisher.edit(channel_id, message_id, &snapshot).await {
                Ok(()) => return Ok(UpdateOutcome::Edited(message_id)),
                Err(PublishError::MessageMissing) => {
                    tracing::info!(
                        guild_id,
                        channel_id,
                        message_id,
                        server = %snapshot.server.server_name,
                        "Status message was deleted, posting a new one"
                    );
                    replaced = true;
                }
                Err(PublishError::Transient(reason)) => {
                    tracing::debug!(guild_id, channel_id, %reason, "Transient error, skipping cycle");
                    return Ok(UpdateOutcome::Skipped(SkipReason::Transient));
                }
                Err(PublishError::Other(reason)) => {
                    tracing::warn!(guild_id, channel_id, %reason, "Could not update status message");
                    return Ok(UpdateOutcome::Skipped(SkipReason::Failed));
                }
            }
        }

        let message_id = self.publisher.send(channel_id, &snapshot).await?;
        self.states
            .set(
                guild_id,
                channel_id,
                ChannelState::new(message_id, snapshot.status.label()),
            )
            .await?;

        tracing::info!(
            guild_id,
            channel_id,
            message_id,
            server = %snapshot.server.server_name,
            "Posted status message"
        );

        Ok(if replaced {
            UpdateOutcome::Replaced(message_id)
        } else {
            UpdateOutcome::Created(message_id)
        })
    }

    async fn resolve_icon(
        &self,
        guild_id: u64,
        server: &MonitoredServer,
        status: &ServerStatus,
    ) -> Option<Vec<u8>> {
        if !status.online {
            return self.icons.load(guild_id, &server.server_name).await;
        }

        let png = status.favicon_png()?;
        if server.auto_save_icon {
            if let Err(e) = self
                .icons
                .save_online(guild_id, &server.server_name, &png)
                .await
            {
                tracing::warn!(guild_id, server = %server.server_name, "Failed to save server icon: {}", e);
            }
        }
        Some(png)
    }

    async fn run_update(&self, guild_id: u64, server: &MonitoredServer) {
        match self.update_status(guild_id, server).await {
            Ok(outcome) => {
                tracing::debug!(guild_id, server = %server.server_name, ?outcome, "Update finished")
            }
            Err(e) => tracing::warn!(
                guild_id,
                server = %server.server_name,
                "Status update failed: {}",
                e
            ),
        }
    }

    /// Replaces the guild's timers with one per enabled server. Servers without a
    /// status message get an immediate update; the rest wait for their first tick.
    /// Returns how many servers are scheduled.
    pub async fn start_monitoring(self: &Arc<Self>, guild_id: u64) -> Result<usize, MonitoringError> {
        self.stop_monitoring(guild_id);

        let Some(config) = self.config.load_guild(guild_id).await? else {
            return Ok(0);
        };
        let default_interval = self.config.defaults().await.update_interval;

        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();
        for server in config.servers.iter().filter(|s| s.monitoring_enabled) {
            let Some(channel_id) = server.channel() else {
                tracing::warn!(guild_id, server = %server.server_name, "Server has no valid channel, not monitoring");
                continue;
            };

            let has_state = match self.states.get(guild_id, channel_id).await {
                Ok(state) => state.is_some(),
                Err(e) => {
                    tracing::warn!(guild_id, channel_id, "Failed to read state: {}", e);
                    false
                }
            };

            let interval_ms = server
                .update_interval
                .unwrap_or(default_interval)
                .max(MIN_INTERVAL_MS);
            tasks.push(self.spawn_server_loop(
                guild_id,
                server.clone(),
                Duration::from_millis(interval_ms),
                !has_state,
                cancel.clone(),
            ));
        }

        let scheduled = tasks.len();
        if let Some(previous) = self.schedules.insert(guild_id, GuildSchedule { cancel, tasks }) {
            previous.cancel.cancel();
        }

        tracing::info!(guild_id, servers = scheduled, "Monitoring started");
        Ok(scheduled)
    }

    fn spawn_server_loop(
        self: &Arc<Self>,
        guild_id: u64,
        server: MonitoredServer,
        period: Duration,
        immediate: bool,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            if immediate {
                monitor.run_update(guild_id, &server).await;
            }

            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => monitor.run_update(guild_id, &server).await,
                }
            }
        })
    }

    /// Cancels the guild's timers. Updates already running finish first.
    pub fn stop_monitoring(&self, guild_id: u64) -> bool {
        match self.schedules.remove(&guild_id) {
            Some((_, schedule)) => {
                schedule.cancel.cancel();
                tracing::debug!(guild_id, "Monitoring stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_monitoring(&self, guild_id: u64) -> bool {
        self.schedules.contains_key(&guild_id)
    }

    /// Number of servers scheduled across all guilds.
    pub fn scheduled_servers(&self) -> usize {
        self.schedules.iter().map(|s| s.tasks.len()).sum()
    }

    /// Starts monitoring for every guild that has a config. Failures are logged per guild.
    pub async fn start_all(self: &Arc<Self>, guild_ids: &[u64]) -> usize {
        let mut started = 0;
        for &guild_id in guild_ids {
            match self.start_monitoring(guild_id).await {
                Ok(count) if count > 0 => started += 1,
                Ok(_) => {}
                Err(e) => tracing::error!(guild_id, "Failed to start monitoring: {}", e),
            }
        }
        started
    }

    /// Deletes the server's status message and forgets it, keeping the channel key.
    /// Returns whether a message was deleted.
    pub async fn reset_server(
        &self,
        guild_id: u64,
        server: &MonitoredServer,
    ) -> Result<bool, MonitoringError> {
        let channel_id = server
            .channel()
            .ok_or_else(|| MonitoringError::InvalidChannel(server.channel_id.clone()))?;
        let deleted = self.delete_message(guild_id, channel_id).await?;
        self.states.clear(guild_id, channel_id).await?;
        Ok(deleted)
    }

    /// Drops the server's message and state entry. Used when a server is removed.
    pub async fn remove_server(
        &self,
        guild_id: u64,
        server: &MonitoredServer,
    ) -> Result<(), MonitoringError> {
        let channel_id = server
            .channel()
            .ok_or_else(|| MonitoringError::InvalidChannel(server.channel_id.clone()))?;
        self.delete_message(guild_id, channel_id).await?;
        self.states.remove(guild_id, channel_id).await?;
        Ok(())
    }

    /// Re-posts one server's message from scratch and restarts the guild's timers.
    pub async fn refresh_server(
        self: &Arc<Self>,
        guild_id: u64,
        server: &MonitoredServer,
    ) -> Result<(), MonitoringError> {
        if let Err(e) = self.reset_server(guild_id, server).await {
            tracing::warn!(guild_id, server = %server.server_name, "Failed to reset server: {}", e);
        }
        self.start_monitoring(guild_id).await?;
        Ok(())
    }

    /// Deletes every status message of the guild, clears its state and starts over.
    pub async fn refresh_guild(self: &Arc<Self>, guild_id: u64) -> Result<RefreshReport, MonitoringError> {
        self.stop_monitoring(guild_id);
        let mut report = RefreshReport::default();

        let Some(config) = self.config.load_guild(guild_id).await? else {
            return Ok(report);
        };

        for server in &config.servers {
            match self.reset_server(guild_id, server).await {
                Ok(true) => report.deleted += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(guild_id, server = %server.server_name, "Failed to refresh server: {}", e);
                    report.errors += 1;
                }
            }
        }

        self.start_monitoring(guild_id).await?;
        Ok(report)
    }

    async fn delete_message(&self, guild_id: u64, channel_id: u64) -> Result<bool, MonitoringError> {
        let Some(message_id) = self
            .states
            .get(guild_id, channel_id)
            .await?
            .as_ref()
            .and_then(ChannelState::message)
        else {
            return Ok(false);
        };

        match self.publisher.delete(channel_id, message_id).await {
            Ok(()) => Ok(true),
            Err(PublishError::MessageMissing) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Cancels every guild and waits for in-flight updates to finish.
    pub async fn shutdown(&self) {
        let guild_ids: Vec<u64> = self.schedules.iter().map(|s| *s.key()).collect();
        let mut tasks = Vec::new();
        for guild_id in guild_ids {
            if let Some((_, schedule)) = self.schedules.remove(&guild_id) {
                schedule.cancel.cancel();
                tasks.extend(schedule.tasks);
            }
        }
        for task in tasks {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StoreError;
    use crate::core::state::GuildState;
    use crate::core::status::IconError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    const GUILD: u64 = 7;
    const CHANNEL_A: u64 = 100;
    const CHANNEL_B: u64 = 200;

    #[derive(Default)]
    struct MockConfigStore {
        guilds: DashMap<u64, String>,
    }

    #[async_trait]
    impl ConfigStore for MockConfigStore {
        async fn read_global(&self) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn write_global(&self, _contents: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn read_guild(&self, guild_id: u64) -> Result<Option<String>, StoreError> {
            Ok(self.guilds.get(&guild_id).map(|g| g.clone()))
        }

        async fn write_guild(&self, guild_id: u64, contents: &str) -> Result<(), StoreError> {
            self.guilds.insert(guild_id, contents.to_string());
            Ok(())
        }

        async fn guild_ids(&self) -> Result<Vec<u64>, StoreError> {
            Ok(self.guilds.iter().map(|e| *e.key()).collect())
        }
    }

    #[derive(Default)]
    struct MockStateStore {
        entries: DashMap<(u64, u64), Option<ChannelState>>,
    }

    #[async_trait]
    impl StateStore for MockStateStore {
        async fn get(&self, guild_id: u64, channel_id: u64) -> Result<Option<ChannelState>, StateError> {
            Ok(self
                .entries
                .get(&(guild_id, channel_id))
                .and_then(|e| e.clone())
                .filter(|s| s.message().is_some()))
        }

        async fn set(&self, guild_id: u64, channel_id: u64, state: ChannelState) -> Result<(), StateError> {
            self.entries.insert((guild_id, channel_id), Some(state));
            Ok(())
        }

        async fn clear(&self, guild_id: u64, channel_id: u64) -> Result<(), StateError> {
            self.entries.insert((guild_id, channel_id), None);
            Ok(())
        }

        async fn remove(&self, guild_id: u64, channel_id: u64) -> Result<(), StateError> {
            self.entries.remove(&(guild_id, channel_id));
            Ok(())
        }

        async fn guild_state(&self, _guild_id: u64) -> Result<GuildState, StateError> {
            Ok(GuildState::default())
        }

        async fn replace_guild_state(&self, _guild_id: u64, _state: GuildState) -> Result<(), StateError> {
            Ok(())
        }

        async fn delete_guild(&self, guild_id: u64) -> Result<(), StateError> {
            self.entries.retain(|(g, _), _| *g != guild_id);
            Ok(())
        }

        async fn guild_ids(&self) -> Result<Vec<u64>, StateError> {
            Ok(self.entries.iter().map(|e| e.key().0).collect())
        }
    }

    struct OnlineSource {
        queries: AtomicUsize,
    }

    #[async_trait]
    impl StatusSource for OnlineSource {
        async fn query(&self, _address: &str, _port: u16) -> ServerStatus {
            self.queries.fetch_add(1, Ordering::SeqCst);
            ServerStatus {
                online: true,
                version: "1.21".to_string(),
                ..ServerStatus::default()
            }
        }
    }

    struct NoIcons;

    #[async_trait]
    impl IconStore for NoIcons {
        async fn save_online(&self, _guild_id: u64, _name: &str, _png: &[u8]) -> Result<(), IconError> {
            Ok(())
        }

        async fn load(&self, _guild_id: u64, _name: &str) -> Option<Vec<u8>> {
            None
        }
    }

    #[derive(Clone, Copy)]
    enum EditResult {
        Ok,
        Missing,
        Transient,
        Other,
    }

    struct MockPublisher {
        edit_result: Mutex<EditResult>,
        channel_available: bool,
        next_id: AtomicU64,
        sends: AtomicUsize,
        edits: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl MockPublisher {
        fn new(edit_result: EditResult) -> Self {
            Self {
                edit_result: Mutex::new(edit_result),
                channel_available: true,
                next_id: AtomicU64::new(1000),
                sends: AtomicUsize::new(0),
                edits: AtomicUsize::new(0),
                deletes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StatusPublisher for MockPublisher {
        async fn channel_available(&self, _channel_id: u64) -> bool {
            self.channel_available
        }

        async fn edit(&self, _channel_id: u64, _message_id: u64, _snapshot: &StatusSnapshot) -> Result<(), PublishError> {
            self.edits.fetch_add(1, Ordering::SeqCst);
            let result = *self.edit_result.lock().unwrap();
            match result {
                EditResult::Ok => Ok(()),
                EditResult::Missing => Err(PublishError::MessageMissing),
                EditResult::Transient => Err(PublishError::Transient("timeout".to_string())),
                EditResult::Other => Err(PublishError::Other("forbidden".to_string())),
            }
        }

        async fn send(&self, _channel_id: u64, _snapshot: &StatusSnapshot) -> Result<u64, PublishError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
        }

        async fn delete(&self, _channel_id: u64, _message_id: u64) -> Result<(), PublishError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Harness {
        monitor: Arc<MonitoringService<MockConfigStore>>,
        states: Arc<MockStateStore>,
        source: Arc<OnlineSource>,
        publisher: Arc<MockPublisher>,
    }

    async fn harness(publisher: MockPublisher) -> Harness {
        let store = MockConfigStore::default();
        store.guilds.insert(
            GUILD,
            format!(
                r#"{{"servers": [
                    {{"serverName": "A", "serverIP": "a.example.org", "channelID": "{CHANNEL_A}"}},
                    {{"serverName": "B", "serverIP": "b.example.org", "channelID": "{CHANNEL_B}", "updateInterval": 10000}}
                ]}}"#
            ),
        );
        let config = Arc::new(ConfigService::new(store).await.unwrap());
        let states = Arc::new(MockStateStore::default());
        let source = Arc::new(OnlineSource {
            queries: AtomicUsize::new(0),
        });
        let publisher = Arc::new(publisher);
        let monitor = Arc::new(MonitoringService::new(
            config,
            states.clone(),
            source.clone(),
            Arc::new(NoIcons),
            publisher.clone(),
        ));
        Harness {
            monitor,
            states,
            source,
            publisher,
        }
    }

    fn server(channel_id: u64) -> MonitoredServer {
        MonitoredServer::new("A", "a.example.org", 25565, channel_id, 10_000)
    }

    fn seed_state(states: &MockStateStore, channel_id: u64, message_id: u64) -> ChannelState {
        let state = ChannelState::new(message_id, "online");
        states.entries.insert((GUILD, channel_id), Some(state.clone()));
        state
    }

    #[tokio::test]
    async fn creates_message_when_no_state() {
        let h = harness(MockPublisher::new(EditResult::Ok)).await;

        let outcome = h.monitor.update_status(GUILD, &server(CHANNEL_A)).await.unwrap();

        assert_eq!(outcome, UpdateOutcome::Created(1000));
        assert_eq!(h.publisher.sends.load(Ordering::SeqCst), 1);
        let state = h.states.get(GUILD, CHANNEL_A).await.unwrap().unwrap();
        assert_eq!(state.message(), Some(1000));
        assert_eq!(state.last_status, "online");
    }

    #[tokio::test]
    async fn edits_existing_message_without_duplicating() {
        let h = harness(MockPublisher::new(EditResult::Ok)).await;
        let seeded = seed_state(&h.states, CHANNEL_A, 55);

        for _ in 0..3 {
            let outcome = h.monitor.update_status(GUILD, &server(CHANNEL_A)).await.unwrap();
            assert_eq!(outcome, UpdateOutcome::Edited(55));
        }

        assert_eq!(h.publisher.sends.load(Ordering::SeqCst), 0);
        assert_eq!(h.publisher.edits.load(Ordering::SeqCst), 3);
        assert_eq!(h.states.get(GUILD, CHANNEL_A).await.unwrap(), Some(seeded));
    }

    #[tokio::test]
    async fn replaces_deleted_message_once() {
        let h = harness(MockPublisher::new(EditResult::Missing)).await;
        seed_state(&h.states, CHANNEL_A, 55);

        let outcome = h.monitor.update_status(GUILD, &server(CHANNEL_A)).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Replaced(1000));
        assert_eq!(h.publisher.sends.load(Ordering::SeqCst), 1);
        let state = h.states.get(GUILD, CHANNEL_A).await.unwrap().unwrap();
        assert_eq!(state.message(), Some(1000));

        // The replacement is edited from now on.
        *h.publisher.edit_result.lock().unwrap() = EditResult::Ok;
        let outcome = h.monitor.update_status(GUILD, &server(CHANNEL_A)).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Edited(1000));
        assert_eq!(h.publisher.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_error_leaves_everything_untouched() {
        let h = harness(MockPublisher::new(EditResult::Transient)).await;
        let seeded = seed_state(&h.states, CHANNEL_A, 55);

        let outcome = h.monitor.update_status(GUILD, &server(CHANNEL_A)).await.unwrap();

        assert_eq!(outcome, UpdateOutcome::Skipped(SkipReason::Transient));
        assert_eq!(h.publisher.sends.load(Ordering::SeqCst), 0);
        assert_eq!(h.states.get(GUILD, CHANNEL_A).await.unwrap(), Some(seeded));
    }

    #[tokio::test]
    async fn unknown_error_skips_without_new_message() {
        let h = harness(MockPublisher::new(EditResult::Other)).await;
        seed_state(&h.states, CHANNEL_A, 55);

        let outcome = h.monitor.update_status(GUILD, &server(CHANNEL_A)).await.unwrap();

        assert_eq!(outcome, UpdateOutcome::Skipped(SkipReason::Failed));
        assert_eq!(h.publisher.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unavailable_channel_is_not_queried() {
        let mut publisher = MockPublisher::new(EditResult::Ok);
        publisher.channel_available = false;
        let h = harness(publisher).await;

        let outcome = h.monitor.update_status(GUILD, &server(CHANNEL_A)).await.unwrap();

        assert_eq!(outcome, UpdateOutcome::Skipped(SkipReason::ChannelUnavailable));
        assert_eq!(h.source.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn removed_server_gets_no_message() {
        let h = harness(MockPublisher::new(EditResult::Ok)).await;

        let outcome = h.monitor.update_status(GUILD, &server(300)).await.unwrap();

        assert_eq!(outcome, UpdateOutcome::Skipped(SkipReason::NotConfigured));
        assert_eq!(h.publisher.sends.load(Ordering::SeqCst), 0);
        assert_eq!(h.source.queries.load(Ordering::SeqCst), 0);
        assert!(!h.states.entries.contains_key(&(GUILD, 300)));
    }

    #[tokio::test(start_paused = true)]
    async fn start_updates_only_servers_without_state_then_ticks() {
        let h = harness(MockPublisher::new(EditResult::Ok)).await;
        seed_state(&h.states, CHANNEL_B, 77);

        let scheduled = h.monitor.start_monitoring(GUILD).await.unwrap();
        assert_eq!(scheduled, 2);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Only A had no message.
        assert_eq!(h.publisher.sends.load(Ordering::SeqCst), 1);
        assert_eq!(h.publisher.edits.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(h.publisher.sends.load(Ordering::SeqCst), 1);
        assert_eq!(h.publisher.edits.load(Ordering::SeqCst), 2);

        assert!(h.monitor.stop_monitoring(GUILD));
        assert!(!h.monitor.is_monitoring(GUILD));
        tokio::time::sleep(Duration::from_millis(30_000)).await;
        assert_eq!(h.publisher.edits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_timers() {
        let h = harness(MockPublisher::new(EditResult::Ok)).await;
        seed_state(&h.states, CHANNEL_A, 1);
        seed_state(&h.states, CHANNEL_B, 2);

        h.monitor.start_monitoring(GUILD).await.unwrap();
        h.monitor.start_monitoring(GUILD).await.unwrap();
        assert_eq!(h.monitor.scheduled_servers(), 2);

        tokio::time::sleep(Duration::from_millis(10_050)).await;
        assert_eq!(h.publisher.edits.load(Ordering::SeqCst), 2);

        h.monitor.shutdown().await;
        assert_eq!(h.monitor.scheduled_servers(), 0);
    }

    #[tokio::test]
    async fn refresh_guild_deletes_and_reposts() {
        let h = harness(MockPublisher::new(EditResult::Ok)).await;
        seed_state(&h.states, CHANNEL_A, 11);
        seed_state(&h.states, CHANNEL_B, 22);

        let report = h.monitor.refresh_guild(GUILD).await.unwrap();
        assert_eq!(report, RefreshReport { deleted: 2, errors: 0 });
        assert_eq!(h.publisher.deletes.load(Ordering::SeqCst), 2);

        // Both servers lost their state, so both get a fresh message right away.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.publisher.sends.load(Ordering::SeqCst), 2);
        h.monitor.shutdown().await;
    }

    #[tokio::test]
    async fn remove_server_drops_state_entry() {
        let h = harness(MockPublisher::new(EditResult::Ok)).await;
        seed_state(&h.states, CHANNEL_A, 11);

        h.monitor.remove_server(GUILD, &server(CHANNEL_A)).await.unwrap();

        assert_eq!(h.publisher.deletes.load(Ordering::SeqCst), 1);
        assert!(!h.states.entries.contains_key(&(GUILD, CHANNEL_A)));
    }
}

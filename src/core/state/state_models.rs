use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Last status message posted into a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelState {
    #[serde(rename = "messageID", default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub last_status: String,
    #[serde(default)]
    pub last_update: String,
}

impl ChannelState {
    pub fn new(message_id: u64, status: &str) -> Self {
        Self {
            message_id: Some(message_id.to_string()),
            last_status: status.to_string(),
            last_update: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn message(&self) -> Option<u64> {
        self.message_id
            .as_deref()
            .and_then(|id| id.trim().parse().ok())
            .filter(|id| *id != 0)
    }
}

/// Contents of `states/guild_<id>.json`. A `null` entry means the channel
/// currently has no status message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildState {
    #[serde(default)]
    pub servers: BTreeMap<String, Option<ChannelState>>,
}

impl GuildState {
    pub fn get(&self, channel_id: u64) -> Option<&ChannelState> {
        self.servers
            .get(&channel_id.to_string())
            .and_then(Option::as_ref)
            .filter(|state| state.message().is_some())
    }
}

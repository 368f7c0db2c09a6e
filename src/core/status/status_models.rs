use base64::Engine;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerCounts {
    pub online: u32,
    pub max: u32,
    /// Names from the server's player sample. Servers may send fewer than `online`.
    pub sample: Vec<String>,
}

/// Result of one status query. Failures are represented as an offline
/// status carrying the error text, never as an `Err`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerStatus {
    pub online: bool,
    pub version: String,
    pub players: PlayerCounts,
    pub motd: String,
    pub latency_ms: Option<u64>,
    /// `data:image/png;base64,...` as sent by the server.
    pub favicon: Option<String>,
    pub error: Option<String>,
}

impl ServerStatus {
    pub fn offline(error: impl Into<String>) -> Self {
        Self {
            online: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Status string recorded in the channel state.
    pub fn label(&self) -> &'static str {
        if self.online {
            "online"
        } else {
            "offline"
        }
    }

    /// Decoded PNG bytes of the favicon, if present and well formed.
    pub fn favicon_png(&self) -> Option<Vec<u8>> {
        let favicon = self.favicon.as_deref()?;
        let encoded = favicon.split_once(',').map_or(favicon, |(_, data)| data);
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_data_url_favicon() {
        let status = ServerStatus {
            online: true,
            favicon: Some("data:image/png;base64,iVBORw0K".to_string()),
            ..ServerStatus::default()
        };
        assert_eq!(
            status.favicon_png().unwrap(),
            vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A]
        );
    }

    #[test]
    fn offline_status_has_label_and_no_icon() {
        let status = ServerStatus::offline("timed out");
        assert_eq!(status.label(), "offline");
        assert_eq!(status.error.as_deref(), Some("timed out"));
        assert!(status.favicon_png().is_none());
    }
}

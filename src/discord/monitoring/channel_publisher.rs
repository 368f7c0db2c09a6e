use super::status_embed::{self, StatusMessage};
use crate::core::monitoring::{PublishError, StatusPublisher, StatusSnapshot};
use crate::core::texts::{TextCatalog, TextStore};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Discord JSON error code for "Unknown Message".
const UNKNOWN_MESSAGE: isize = 10008;

/// Posts and edits status messages through the bot's HTTP client.
pub struct DiscordPublisher<S: TextStore> {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
    texts: Arc<TextCatalog<S>>,
}

impl<S: TextStore> DiscordPublisher<S> {
    pub fn new(
        http: Arc<serenity::Http>,
        cache: Arc<serenity::Cache>,
        texts: Arc<TextCatalog<S>>,
    ) -> Self {
        Self { http, cache, texts }
    }

    fn render(&self, snapshot: &StatusSnapshot) -> StatusMessage {
        status_embed::render(&self.texts, snapshot)
    }
}

/// Maps an HTTP status and Discord error code to what the scheduler should do.
pub fn classify_response(status: u16, code: isize) -> PublishError {
    if code == UNKNOWN_MESSAGE {
        PublishError::MessageMissing
    } else if status == 429 || status >= 500 {
        PublishError::Transient(format!("HTTP {status}"))
    } else {
        PublishError::Other(format!("HTTP {status}, code {code}"))
    }
}

pub fn classify(error: &serenity::Error) -> PublishError {
    match error {
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response)) => {
            classify_response(response.status_code.as_u16(), response.error.code)
        }
        serenity::Error::Http(serenity::HttpError::Request(e)) => {
            PublishError::Transient(e.to_string())
        }
        serenity::Error::Io(e) => PublishError::Transient(e.to_string()),
        other => PublishError::Other(other.to_string()),
    }
}

#[async_trait]
impl<S: TextStore + 'static> StatusPublisher for DiscordPublisher<S> {
    async fn channel_available(&self, channel_id: u64) -> bool {
        if channel_id == 0 {
            return false;
        }
        let channel = serenity::ChannelId::new(channel_id);
        if self.cache.channel(channel).is_some() {
            return true;
        }
        match self.http.get_channel(channel).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(channel_id, "Channel not reachable: {}", e);
                false
            }
        }
    }

    async fn edit(
        &self,
        channel_id: u64,
        message_id: u64,
        snapshot: &StatusSnapshot,
    ) -> Result<(), PublishError> {
        let message = self.render(snapshot);
        let mut attachments = serenity::EditAttachments::new();
        if let Some(icon) = message.icon {
            attachments = attachments.add(icon);
        }
        let edit = serenity::EditMessage::new()
            .embed(message.embed)
            .components(message.components)
            .attachments(attachments);

        serenity::ChannelId::new(channel_id)
            .edit_message(
                self.http.as_ref(),
                serenity::MessageId::new(message_id),
                edit,
            )
            .await
            .map(|_| ())
            .map_err(|e| classify(&e))
    }

    async fn send(&self, channel_id: u64, snapshot: &StatusSnapshot) -> Result<u64, PublishError> {
        let message = self.render(snapshot);
        let mut create = serenity::CreateMessage::new()
            .embed(message.embed)
            .components(message.components);
        if let Some(icon) = message.icon {
            create = create.add_file(icon);
        }

        serenity::ChannelId::new(channel_id)
            .send_message(self.http.as_ref(), create)
            .await
            .map(|sent| sent.id.get())
            .map_err(|e| classify(&e))
    }

    async fn delete(&self, channel_id: u64, message_id: u64) -> Result<(), PublishError> {
        serenity::ChannelId::new(channel_id)
            .delete_message(self.http.as_ref(), serenity::MessageId::new(message_id))
            .await
            .map_err(|e| classify(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_message_means_recreate() {
        assert!(matches!(
            classify_response(404, 10008),
            PublishError::MessageMissing
        ));
    }

    #[test]
    fn outages_and_rate_limits_are_transient() {
        assert!(matches!(classify_response(502, 0), PublishError::Transient(_)));
        assert!(matches!(classify_response(429, 0), PublishError::Transient(_)));
    }

    #[test]
    fn permission_errors_are_not_retried_as_missing() {
        // Missing Access / Missing Permissions
        assert!(matches!(classify_response(403, 50001), PublishError::Other(_)));
        assert!(matches!(classify_response(403, 50013), PublishError::Other(_)));
        assert!(matches!(classify_response(404, 10003), PublishError::Other(_)));
    }

    #[test]
    fn io_errors_are_transient() {
        let error = serenity::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(matches!(classify(&error), PublishError::Transient(_)));
    }
}

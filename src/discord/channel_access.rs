// What the bot may do in a guild's text channels.

use crate::core::permissions::{missing_permissions, ChannelPermission};
use crate::core::texts::TextCatalog;
use crate::core::texts::TextStore;
use poise::serenity_prelude as serenity;

fn granted(perms: serenity::Permissions, permission: ChannelPermission) -> bool {
    match permission {
        ChannelPermission::ViewChannel => perms.view_channel(),
        ChannelPermission::SendMessages => perms.send_messages(),
        ChannelPermission::EmbedLinks => perms.embed_links(),
        ChannelPermission::AttachFiles => perms.attach_files(),
        ChannelPermission::ReadMessageHistory => perms.read_message_history(),
    }
}

/// Required permissions the bot lacks in `channel`. Everything counts as
/// missing when the guild or the bot member is not cached.
pub fn missing_in(cache: &serenity::Cache, channel: &serenity::GuildChannel) -> Vec<ChannelPermission> {
    let bot_id = cache.current_user().id;
    match channel.permissions_for_user(cache, bot_id) {
        Ok(perms) => missing_from(perms),
        Err(e) => {
            tracing::debug!(channel_id = channel.id.get(), "Cannot compute permissions: {}", e);
            ChannelPermission::REQUIRED.to_vec()
        }
    }
}

pub fn missing_from(perms: serenity::Permissions) -> Vec<ChannelPermission> {
    missing_permissions(|p| granted(perms, p))
}

/// Text channels of a cached guild, in the order Discord shows them.
pub fn text_channels(cache: &serenity::Cache, guild_id: serenity::GuildId) -> Vec<serenity::GuildChannel> {
    let mut channels: Vec<serenity::GuildChannel> = cache
        .guild(guild_id)
        .map(|guild| {
            guild
                .channels
                .values()
                .filter(|c| c.kind == serenity::ChannelType::Text)
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    channels.sort_by_key(|c| (c.position, c.id));
    channels
}

/// One `✅ name` / `❌ name` line per required permission.
pub fn permission_list<S: TextStore>(
    texts: &TextCatalog<S>,
    language: &str,
    missing: &[ChannelPermission],
) -> String {
    ChannelPermission::REQUIRED
        .iter()
        .map(|p| {
            let mark = if missing.contains(p) { "❌" } else { "✅" };
            format!("{mark} {}", texts.get(language, p.text_key(), &[]))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_discord_permission_bits() {
        let perms = serenity::Permissions::VIEW_CHANNEL
            | serenity::Permissions::SEND_MESSAGES
            | serenity::Permissions::READ_MESSAGE_HISTORY;
        assert_eq!(
            missing_from(perms),
            vec![ChannelPermission::EmbedLinks, ChannelPermission::AttachFiles]
        );
        assert!(missing_from(serenity::Permissions::all()).is_empty());
    }

    #[tokio::test]
    async fn lists_every_permission_with_a_mark() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = crate::infra::texts::FileTextStore::new(dir.path());
        store.install_bundled().await.unwrap();
        let texts = TextCatalog::new(store, "en").await.unwrap();

        let list = permission_list(&texts, "en", &[ChannelPermission::AttachFiles]);
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "✅ 👁️ View channel");
        assert_eq!(lines[3], "❌ 📁 Attach files");
    }
}

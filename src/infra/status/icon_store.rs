use crate::core::status::{IconError, IconStore};
use async_trait::async_trait;
use std::path::PathBuf;

/// `Icons/guild_<id>/online/` holds icons captured from live servers,
/// `Icons/guild_<id>/local/` holds icons placed there by hand.
pub struct FileIconStore {
    root: PathBuf,
}

/// File-system safe form of a server name.
pub fn safe_name(server_name: &str) -> String {
    server_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

impl FileIconStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn icon_path(&self, guild_id: u64, kind: &str, server_name: &str) -> PathBuf {
        self.root
            .join(format!("guild_{guild_id}"))
            .join(kind)
            .join(format!("{}-servericon.png", safe_name(server_name)))
    }

    async fn read(&self, guild_id: u64, kind: &str, server_name: &str) -> Option<Vec<u8>> {
        tokio::fs::read(self.icon_path(guild_id, kind, server_name))
            .await
            .ok()
    }
}

#[async_trait]
impl IconStore for FileIconStore {
    async fn save_online(
        &self,
        guild_id: u64,
        server_name: &str,
        png: &[u8],
    ) -> Result<(), IconError> {
        let path = self.icon_path(guild_id, "online", server_name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, png).await?;
        Ok(())
    }

    async fn load(&self, guild_id: u64, server_name: &str) -> Option<Vec<u8>> {
        match self.read(guild_id, "online", server_name).await {
            Some(png) => Some(png),
            None => self.read(guild_id, "local", server_name).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitizes_names() {
        assert_eq!(safe_name("My Server #1"), "my_server__1");
    }

    #[tokio::test]
    async fn test_online_icon_wins_over_local() {
        let dir = TempDir::new().unwrap();
        let store = FileIconStore::new(dir.path());
        assert_eq!(store.load(1, "Hub").await, None);

        let local = dir.path().join("guild_1/local");
        std::fs::create_dir_all(&local).unwrap();
        std::fs::write(local.join("hub-servericon.png"), b"local").unwrap();
        assert_eq!(store.load(1, "Hub").await.as_deref(), Some(&b"local"[..]));

        store.save_online(1, "Hub", b"online").await.unwrap();
        assert_eq!(store.load(1, "Hub").await.as_deref(), Some(&b"online"[..]));
    }
}

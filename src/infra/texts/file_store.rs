use crate::core::texts::{TextError, TextStore};
use crate::infra::json_files::{list_json_files, write_file};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

/// Language files shipped with the bot, written to the texts folder when absent.
const BUNDLED: [(&str, &str); 2] = [
    ("en", include_str!("../../../texts/en.json")),
    ("de", include_str!("../../../texts/de.json")),
];

/// `texts/<code>.json` files.
pub struct FileTextStore {
    dir: PathBuf,
}

impl FileTextStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes the bundled languages that are missing on disk. Returns how many were written.
    pub async fn install_bundled(&self) -> Result<usize, TextError> {
        let mut written = 0;
        for (code, contents) in BUNDLED {
            let path = self.dir.join(format!("{code}.json"));
            if tokio::fs::try_exists(&path).await? {
                continue;
            }
            write_file(&path, contents).await?;
            tracing::info!(code, "Installed bundled language file");
            written += 1;
        }
        Ok(written)
    }
}

#[async_trait]
impl TextStore for FileTextStore {
    async fn load_all(&self) -> Result<Vec<(String, Value)>, TextError> {
        let mut bundles = Vec::new();
        for (code, path) in list_json_files(&self.dir).await? {
            let raw = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<Value>(&raw) {
                Ok(bundle) if bundle.is_object() => bundles.push((code, bundle)),
                Ok(_) => tracing::warn!(code, "Language file is not a JSON object, skipping"),
                Err(e) => tracing::warn!(code, "Invalid language file, skipping: {}", e),
            }
        }
        Ok(bundles)
    }

    async fn save(&self, code: &str, bundle: &Value) -> Result<(), TextError> {
        let contents = serde_json::to_string_pretty(bundle)?;
        write_file(&self.dir.join(format!("{code}.json")), &contents).await?;
        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<(), TextError> {
        match tokio::fs::remove_file(self.dir.join(format!("{code}.json"))).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::check_languages;
    use crate::core::texts::TextCatalog;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_bundled_languages_install_once() {
        let dir = TempDir::new().unwrap();
        let store = FileTextStore::new(dir.path());
        assert_eq!(store.install_bundled().await.unwrap(), 2);
        assert_eq!(store.install_bundled().await.unwrap(), 0);

        let codes: Vec<String> = store
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|(code, _)| code)
            .collect();
        assert_eq!(codes, vec!["de", "en"]);
    }

    #[tokio::test]
    async fn test_bundled_languages_are_consistent() {
        let dir = TempDir::new().unwrap();
        let store = FileTextStore::new(dir.path());
        store.install_bundled().await.unwrap();

        let catalog = TextCatalog::new(store, "en").await.unwrap();
        let report = check_languages(&catalog.bundles());
        assert!(report.is_ok(), "{report:?}");
        assert!(report.warnings.is_empty(), "{report:?}");
        assert_ne!(
            catalog.get("en", "status.online.title", &[]),
            "status.online.title"
        );
    }

    #[tokio::test]
    async fn test_skips_invalid_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("custom_x.json"), r#"{"a":"b"}"#).unwrap();

        let store = FileTextStore::new(dir.path());
        let bundles = store.load_all().await.unwrap();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].0, "custom_x");
    }
}

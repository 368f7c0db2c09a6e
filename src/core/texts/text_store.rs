use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
    #[error("Language already exists: {0}")]
    AlreadyExists(String),
    #[error("Only custom languages can be changed: {0}")]
    NotCustom(String),
    #[error("Invalid language name")]
    InvalidName,
    #[error("Invalid text key: {0}")]
    InvalidKey(String),
}

/// Language bundles keyed by code (`en`, `de`, `custom_<name>`).
#[async_trait]
pub trait TextStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<(String, Value)>, TextError>;
    async fn save(&self, code: &str, bundle: &Value) -> Result<(), TextError>;
    async fn delete(&self, code: &str) -> Result<(), TextError>;
}

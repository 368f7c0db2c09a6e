pub mod text_catalog;
pub mod text_store;

pub use text_catalog::{fill_placeholders, language_emoji, LanguageInfo, TextCatalog, CUSTOM_PREFIX};
pub use text_store::{TextError, TextStore};

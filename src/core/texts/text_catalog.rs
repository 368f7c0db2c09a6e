use super::text_store::{TextError, TextStore};
use crate::core::config::{GuildConfig, MonitoredServer, GLOBAL_LANGUAGE};
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

pub const STANDARD_LANGUAGES: [&str; 2] = ["de", "en"];
pub const CUSTOM_PREFIX: &str = "custom_";

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    pub emoji: &'static str,
    pub is_custom: bool,
}

/// Replaces every `{name}` placeholder with its value. Unknown placeholders stay as-is.
pub fn fill_placeholders(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

pub fn language_emoji(code: &str) -> &'static str {
    match code {
        "de" => "🇩🇪",
        "en" => "🇬🇧",
        c if c.starts_with(CUSTOM_PREFIX) => "✏️",
        _ => "🌐",
    }
}

fn lookup<'a>(bundle: &'a Value, key: &str) -> Option<&'a str> {
    key.split('.')
        .try_fold(bundle, |node, part| node.get(part))
        .and_then(Value::as_str)
}

/// All loaded language bundles with lookup, substitution and fallback.
pub struct TextCatalog<S: TextStore> {
    store: S,
    languages: DashMap<String, Value>,
    default_language: RwLock<String>,
}

impl<S: TextStore> TextCatalog<S> {
    pub async fn new(store: S, default_language: &str) -> Result<Self, TextError> {
        let catalog = Self {
            store,
            languages: DashMap::new(),
            default_language: RwLock::new(default_language.to_string()),
        };
        catalog.reload().await?;
        Ok(catalog)
    }

    pub async fn reload(&self) -> Result<usize, TextError> {
        let bundles = self.store.load_all().await?;
        self.languages.clear();
        for (code, bundle) in bundles {
            self.languages.insert(code, bundle);
        }
        tracing::info!(languages = self.languages.len(), "Loaded language files");
        Ok(self.languages.len())
    }

    pub fn default_language(&self) -> String {
        self.default_language
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_default_language(&self, language: &str) {
        *self
            .default_language
            .write()
            .unwrap_or_else(PoisonError::into_inner) = language.to_string();
    }

    fn template(&self, language: &str, key: &str) -> Option<String> {
        let bundle = self.languages.get(language)?;
        lookup(bundle.value(), key).map(str::to_owned)
    }

    /// Text for `key` in `language`, then in the default language, then the key itself.
    pub fn get(&self, language: &str, key: &str, vars: &[(&str, String)]) -> String {
        let template = self
            .template(language, key)
            .or_else(|| self.template(&self.default_language(), key))
            .unwrap_or_else(|| {
                tracing::debug!(language, key, "Text key missing in all languages");
                key.to_string()
            });
        fill_placeholders(&template, vars)
    }

    /// Same as [`get`](Self::get) with the language resolved from guild and server settings.
    pub fn text(
        &self,
        guild: &GuildConfig,
        server: Option<&MonitoredServer>,
        key: &str,
        vars: &[(&str, String)],
    ) -> String {
        self.get(guild.effective_language(server), key, vars)
    }

    pub fn has_language(&self, code: &str) -> bool {
        self.languages.contains_key(code)
    }

    pub fn language_name(&self, code: &str) -> String {
        self.languages
            .get(code)
            .and_then(|bundle| lookup(bundle.value(), "_meta.languageName").map(str::to_owned))
            .unwrap_or_else(|| code.to_string())
    }

    /// Label for select menus, e.g. `🇬🇧 English` or `🌐 Global (Deutsch)`.
    pub fn language_label(&self, code: &str, guild: &GuildConfig) -> String {
        if code == GLOBAL_LANGUAGE {
            let global = guild.effective_language(None);
            return format!(
                "{} Global ({})",
                language_emoji(global),
                self.language_name(global)
            );
        }
        format!("{} {}", language_emoji(code), self.language_name(code))
    }

    /// Standard languages first, then everything else by display name.
    pub fn available_languages(&self) -> Vec<LanguageInfo> {
        let mut languages: Vec<LanguageInfo> = self
            .languages
            .iter()
            .map(|entry| {
                let code = entry.key().clone();
                LanguageInfo {
                    name: lookup(entry.value(), "_meta.languageName")
                        .unwrap_or(&code)
                        .to_string(),
                    emoji: language_emoji(&code),
                    is_custom: code.starts_with(CUSTOM_PREFIX),
                    code,
                }
            })
            .collect();

        languages.sort_by(|a, b| {
            let a_standard = STANDARD_LANGUAGES.contains(&a.code.as_str());
            let b_standard = STANDARD_LANGUAGES.contains(&b.code.as_str());
            b_standard
                .cmp(&a_standard)
                .then_with(|| a.name.cmp(&b.name))
        });
        languages
    }

    /// Snapshot of every bundle, used by the language checks.
    pub fn bundles(&self) -> BTreeMap<String, Value> {
        self.languages
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Copies `base` into a new `custom_<name>` bundle and returns its code.
    pub async fn create_custom_language(&self, name: &str, base: &str) -> Result<String, TextError> {
        let sanitized: String = name
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        if sanitized.is_empty() {
            return Err(TextError::InvalidName);
        }

        let code = format!("{CUSTOM_PREFIX}{sanitized}");
        if self.languages.contains_key(&code) {
            return Err(TextError::AlreadyExists(code));
        }

        let mut bundle = self
            .languages
            .get(base)
            .map(|b| b.value().clone())
            .ok_or_else(|| TextError::UnknownLanguage(base.to_string()))?;
        if let Value::Object(map) = &mut bundle {
            map.insert(
                "_meta".to_string(),
                json!({
                    "language": code,
                    "languageName": name.trim(),
                    "author": "Custom",
                    "description": format!("Custom language based on {base}"),
                    "baseLanguage": base,
                    "created": chrono::Utc::now().to_rfc3339(),
                }),
            );
        }

        self.store.save(&code, &bundle).await?;
        self.languages.insert(code.clone(), bundle);
        tracing::info!(code, base, "Created custom language");
        Ok(code)
    }

    pub async fn delete_custom_language(&self, code: &str) -> Result<(), TextError> {
        if !code.starts_with(CUSTOM_PREFIX) {
            return Err(TextError::NotCustom(code.to_string()));
        }
        if self.languages.remove(code).is_none() {
            return Err(TextError::UnknownLanguage(code.to_string()));
        }
        self.store.delete(code).await?;
        tracing::info!(code, "Deleted custom language");
        Ok(())
    }

    /// Sets one dotted key in a custom bundle, creating intermediate objects.
    pub async fn update_custom_text(&self, code: &str, key: &str, value: &str) -> Result<(), TextError> {
        if !code.starts_with(CUSTOM_PREFIX) {
            return Err(TextError::NotCustom(code.to_string()));
        }
        let parts: Vec<&str> = key.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(TextError::InvalidKey(key.to_string()));
        }

        let mut bundle = self
            .languages
            .get(code)
            .map(|b| b.value().clone())
            .ok_or_else(|| TextError::UnknownLanguage(code.to_string()))?;

        let (last, path) = parts
            .split_last()
            .ok_or_else(|| TextError::InvalidKey(key.to_string()))?;
        let mut node = &mut bundle;
        for part in path {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            node = node
                .as_object_mut()
                .ok_or_else(|| TextError::InvalidKey(key.to_string()))?
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node.as_object_mut()
            .ok_or_else(|| TextError::InvalidKey(key.to_string()))?
            .insert(last.to_string(), Value::String(value.to_string()));

        self.store.save(code, &bundle).await?;
        self.languages.insert(code.to_string(), bundle);
        Ok(())
    }
}

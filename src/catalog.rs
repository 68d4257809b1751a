//! Compiled-in locale catalog.
//!
//! The catalog maps language tag -> message ID -> translated string. It is
//! built once at startup from the embedded `locales/*.yaml` files and never
//! mutated afterwards, so it can be shared by reference across concurrent
//! renders without locking.
//!
//! # Language fallback
//!
//! ```text
//! "zh"    -> zh, zh-CN, <default>
//! "de-AT" -> de-AT, de, <default>
//! ""      -> <default>
//! ```

use crate::context::MailContext;
use crate::error::TranslateError;
use crate::placeholder::substitute;
use serde::Deserialize;
use std::collections::HashMap;

/// Language used when no preferred tag has the message.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Locale files compiled into the binary, keyed by filename stem.
const EMBEDDED_LOCALES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en.yaml")),
    ("de", include_str!("../locales/de.yaml")),
    ("ko", include_str!("../locales/ko.yaml")),
    ("zh-CN", include_str!("../locales/zh-CN.yaml")),
];

/// One locale file: flat message ID -> value mapping.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct LocaleFile(HashMap<String, serde_yaml::Value>);

/// Immutable table of translated messages.
#[derive(Debug, Clone)]
pub struct LocaleCatalog {
    default_language: String,
    /// Keys are lower-cased language tags.
    messages: HashMap<String, HashMap<String, String>>,
}

impl LocaleCatalog {
    /// Build the catalog from the embedded locale files.
    pub fn embedded() -> Self {
        Self::from_sources(DEFAULT_LANGUAGE, EMBEDDED_LOCALES.iter().copied())
    }

    /// Build a catalog from `(language tag, YAML source)` pairs.
    ///
    /// A source that fails to parse is skipped with a warning; the catalog
    /// is always constructed, only smaller than expected. Non-string entries
    /// inside an otherwise valid file are ignored.
    pub fn from_sources<'a, I>(default_language: &str, sources: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut messages: HashMap<String, HashMap<String, String>> = HashMap::new();

        for (tag, raw) in sources {
            let file: LocaleFile = match serde_yaml::from_str(raw) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!(locale = %tag, error = %e, "Skipping unreadable locale file");
                    continue;
                }
            };

            let table = messages.entry(normalize_tag(tag)).or_default();
            for (id, value) in file.0 {
                match value {
                    serde_yaml::Value::String(s) => {
                        table.insert(id, s);
                    }
                    _ => {
                        tracing::debug!(locale = %tag, message_id = %id, "Ignoring non-string locale entry");
                    }
                }
            }
        }

        tracing::debug!(
            locales = messages.len(),
            default_language = %default_language,
            "Locale catalog loaded"
        );

        Self {
            default_language: default_language.to_string(),
            messages,
        }
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Language tags present in the catalog (lower-cased, sorted).
    pub fn languages(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.messages.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn has_language(&self, tag: &str) -> bool {
        self.messages.contains_key(&normalize_tag(tag))
    }

    /// Returns the first raw entry for `message_id` in `tags`, most specific
    /// first, falling back to the default language.
    pub fn lookup_tags<S: AsRef<str>>(&self, tags: &[S], message_id: &str) -> Option<&str> {
        tags.iter()
            .map(|t| t.as_ref())
            .chain(std::iter::once(self.default_language.as_str()))
            .find_map(|tag| {
                self.messages
                    .get(&normalize_tag(tag))
                    .and_then(|table| table.get(message_id))
            })
            .map(String::as_str)
    }

    /// Raw (unsubstituted) entry for `lang` following the fallback rules.
    ///
    /// # Errors
    /// Returns `TranslateError::MissingTranslation` when no candidate tag,
    /// including the default language, has the message.
    pub fn lookup(&self, lang: &str, message_id: &str) -> Result<&str, TranslateError> {
        self.lookup_tags(&preferred_tags(lang), message_id)
            .ok_or_else(|| TranslateError::MissingTranslation {
                lang: lang.to_string(),
                message_id: message_id.to_string(),
            })
    }

    /// Look up `message_id` for `lang` and substitute placeholders from `ctx`.
    ///
    /// A substitution failure returns the raw entry, the same policy the
    /// override store applies.
    pub fn localize(
        &self,
        lang: &str,
        message_id: &str,
        ctx: &MailContext,
    ) -> Result<String, TranslateError> {
        let raw = self.lookup(lang, message_id)?;
        match substitute(raw, |key| ctx.lookup_text(key)) {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!(
                    lang = %lang,
                    message_id = %message_id,
                    error = %e,
                    "Catalog substitution failed, using raw message"
                );
                Ok(raw.to_string())
            }
        }
    }
}

/// Ordered candidate tags for a catalog lookup (default language excluded).
///
/// `zh` additionally tries `zh-CN`; a region-qualified tag additionally
/// tries its base language.
pub fn preferred_tags(lang: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    if lang.is_empty() {
        return tags;
    }

    tags.push(lang.to_string());
    if lang.eq_ignore_ascii_case("zh") {
        tags.push("zh-CN".to_string());
    }
    let base = base_language(lang);
    if !tags.iter().any(|t| t == base) {
        tags.push(base.to_string());
    }
    tags
}

/// Base language of a tag: everything before the first `-`.
pub fn base_language(lang: &str) -> &str {
    lang.split_once('-').map_or(lang, |(base, _)| base)
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase()
}

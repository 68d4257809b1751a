//! Per-render substitution context.
//!
//! A `MailContext` carries the active language explicitly plus an
//! extensible key/value payload used to fill `{{ .Key }}` placeholders and
//! template variables. It is created by the caller for a single render and
//! mutated in place by branding injection before rendering.

use serde_json::Value;
use std::collections::BTreeMap;

/// Context key holding the service or product name in message bodies.
pub const SERVICE_NAME_KEY: &str = "ServiceName";

/// Substitution data for one render call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MailContext {
    lang: String,
    values: BTreeMap<String, Value>,
}

impl MailContext {
    /// Create an empty context for the given language tag.
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Active language tag. Empty means "use the catalog default".
    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn set_lang(&mut self, lang: impl Into<String>) {
        self.lang = lang.into();
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Render a context value the way placeholders print it.
    pub fn lookup_text(&self, key: &str) -> Option<String> {
        self.values.get(key).map(value_to_text)
    }
}

/// Text form of a JSON value inside a substituted string.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

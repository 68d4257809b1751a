//! Per-deployment mail template overrides (`mail_template.yaml`).
//!
//! The override file is keyed by language tag; each entry maps message IDs
//! and branding fields to strings that may contain `{{ .Key }}` placeholders:
//!
//! ```yaml
//! en:
//!   product_name: "Acme ID"
//!   footer_sent_by: "Sent by Acme Corp"
//!   subject_login: "Your {{ .ServiceName }} passcode is {{ .Code }}"
//! zh:
//!   product_name: "Acme 身份"
//! ```
//!
//! Overrides are optional: a missing file or an empty document yields no
//! store, and every lookup then falls through to the locale catalog.

use crate::branding::Branding;
use crate::context::MailContext;
use crate::error::OverrideError;
use crate::placeholder::substitute;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory searched for the override file when a relative path is not
/// found where given.
pub const OVERRIDE_SEARCH_DIR: &str = "config";

const PRODUCT_NAME_FIELD: &str = "product_name";
const FOOTER_SENT_BY_FIELD: &str = "footer_sent_by";
const COPYRIGHT_FIELD: &str = "copyright";

/// Narrow capability consumed by the resolver and composer.
///
/// Keeps the renderer independent of the override file's shape and lets
/// tests substitute their own store.
pub trait OverrideSource: Send + Sync {
    /// Branding fields for `lang`. A missing entry yields all-empty fields.
    fn branding(&self, lang: &str) -> Branding;

    /// Substituted override for `message_id`, or `None` to use the catalog.
    fn message(&self, lang: &str, message_id: &str, ctx: &MailContext) -> Option<String>;
}

type LocaleEntry = HashMap<String, serde_yaml::Value>;

/// Loaded override file contents, read-only after load.
#[derive(Debug, Clone, Default)]
pub struct MailTemplateOverrides {
    locales: HashMap<String, LocaleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RawOverrides(HashMap<String, Option<LocaleEntry>>);

impl MailTemplateOverrides {
    /// Load overrides from `path`, resolving relative paths against the
    /// process working directory.
    ///
    /// # Errors
    /// See [`MailTemplateOverrides::load_in`].
    pub fn load(path: &str) -> Result<Option<Self>, OverrideError> {
        Self::load_in(Path::new(""), path)
    }

    /// Load overrides from `path`, resolving relative paths against `base_dir`.
    ///
    /// Returns `Ok(None)` when `path` is empty, when no candidate path exists,
    /// or when the document has no top-level keys.
    ///
    /// # Errors
    /// - `OverrideError::Read` for any read failure other than "not found".
    /// - `OverrideError::Parse` if the document is not a two-level mapping.
    pub fn load_in(base_dir: &Path, path: &str) -> Result<Option<Self>, OverrideError> {
        if path.is_empty() {
            return Ok(None);
        }

        let mut found = None;
        for candidate in candidate_paths(base_dir, path) {
            match std::fs::read_to_string(&candidate) {
                Ok(content) => {
                    found = Some((candidate, content));
                    break;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::trace!(path = %candidate.display(), "Override file candidate not found");
                }
                Err(e) => {
                    return Err(OverrideError::Read {
                        path: candidate,
                        source: e,
                    });
                }
            }
        }

        let Some((resolved, content)) = found else {
            tracing::info!(path = %path, "Mail template override file not found, using locale files");
            return Ok(None);
        };

        let overrides = Self::from_yaml(&content).map_err(|e| OverrideError::Parse {
            path: resolved.clone(),
            message: e.to_string(),
        })?;

        match overrides {
            Some(overrides) => {
                tracing::info!(
                    path = %resolved.display(),
                    locales = overrides.locales.len(),
                    "Mail template overrides loaded"
                );
                Ok(Some(overrides))
            }
            None => {
                tracing::info!(path = %resolved.display(), "Mail template override file is empty");
                Ok(None)
            }
        }
    }

    /// Parse an override document. `Ok(None)` for an empty document.
    ///
    /// # Errors
    /// Returns the YAML error if the document is not a two-level mapping.
    pub fn from_yaml(content: &str) -> Result<Option<Self>, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(None);
        }

        let raw: Option<RawOverrides> = serde_yaml::from_str(content)?;
        let locales: HashMap<String, LocaleEntry> = raw
            .map(|r| r.0)
            .unwrap_or_default()
            .into_iter()
            .map(|(lang, entry)| (lang, entry.unwrap_or_default()))
            .collect();

        if locales.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Self { locales }))
        }
    }

    /// Entry for `lang`: exact match first, then the base language.
    pub fn entry(&self, lang: &str) -> Option<&LocaleEntry> {
        if let Some(entry) = self.locales.get(lang) {
            return Some(entry);
        }
        let (base, _) = lang.split_once('-')?;
        self.locales.get(base)
    }

    /// Languages present in the override file.
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.locales.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }

    fn string_field(entry: &LocaleEntry, key: &str) -> Option<String> {
        match entry.get(key) {
            Some(serde_yaml::Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

impl OverrideSource for MailTemplateOverrides {
    fn branding(&self, lang: &str) -> Branding {
        let Some(entry) = self.entry(lang) else {
            return Branding::default();
        };
        let field = |key: &str| {
            Self::string_field(entry, key)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        Branding {
            product_name: field(PRODUCT_NAME_FIELD),
            footer_sent_by: field(FOOTER_SENT_BY_FIELD),
            copyright: field(COPYRIGHT_FIELD),
        }
    }

    fn message(&self, lang: &str, message_id: &str, ctx: &MailContext) -> Option<String> {
        let entry = self.entry(lang)?;
        let raw = Self::string_field(entry, message_id)?;
        if raw.trim().is_empty() {
            return None;
        }

        // A broken override never blocks rendering.
        match substitute(&raw, |key| ctx.lookup_text(key)) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!(
                    lang = %lang,
                    message_id = %message_id,
                    error = %e,
                    "Override substitution failed, using raw override"
                );
                Some(raw)
            }
        }
    }
}

/// Paths tried in order for the override file.
///
/// An absolute path is tried as given. A relative path is tried as given,
/// then as `config/<name>`, `../config/<name>` and `../../config/<name>`,
/// each relative to `base_dir`.
pub fn candidate_paths(base_dir: &Path, path: &str) -> Vec<PathBuf> {
    let given = Path::new(path);
    if given.is_absolute() {
        return vec![given.to_path_buf()];
    }

    let mut paths = vec![base_dir.join(given)];
    if let Some(name) = given.file_name() {
        for prefix in ["", "..", "../.."] {
            paths.push(base_dir.join(prefix).join(OVERRIDE_SEARCH_DIR).join(name));
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = r#"
en:
  product_name: "  Acme ID  "
  footer_sent_by: "Sent by Acme Corp"
  welcome: "Hi {{ .Name }}"
  broken: "Hi {{ .Missing }}"
  unterminated: "Hi {{ .Name"
  blank: "   "
  number: 42
zh:
  product_name: "Acme 身份"
  subject_login: "登录 {{ .ServiceName }}"
"#;

    fn sample() -> MailTemplateOverrides {
        MailTemplateOverrides::from_yaml(SAMPLE).unwrap().unwrap()
    }

    #[test]
    fn entry_exact_match() {
        let store = sample();
        assert!(store.entry("en").is_some());
        assert!(store.entry("fr").is_none());
    }

    #[test]
    fn entry_falls_back_to_base_language() {
        let store = sample();
        let entry = store.entry("zh-TW").unwrap();
        assert!(entry.contains_key("subject_login"));
        assert!(store.entry("fr-CA").is_none());
    }

    #[test]
    fn branding_trims_fields() {
        let store = sample();
        let branding = store.branding("en-GB");
        assert_eq!(branding.product_name, "Acme ID");
        assert_eq!(branding.footer_sent_by, "Sent by Acme Corp");
        assert_eq!(branding.copyright, "");
    }

    #[test]
    fn branding_missing_entry_is_empty() {
        let store = sample();
        assert!(store.branding("fr").is_empty());
    }

    #[test]
    fn message_found_is_substituted() {
        let store = sample();
        let ctx = MailContext::new("en").with("Name", "Ann");
        assert_eq!(store.message("en", "welcome", &ctx).as_deref(), Some("Hi Ann"));
    }

    #[test]
    fn message_missing_key_returns_raw_string() {
        let store = sample();
        let ctx = MailContext::new("en");
        assert_eq!(
            store.message("en", "broken", &ctx).as_deref(),
            Some("Hi {{ .Missing }}")
        );
    }

    #[test]
    fn message_syntax_error_returns_raw_string() {
        let store = sample();
        let ctx = MailContext::new("en").with("Name", "Ann");
        assert_eq!(
            store.message("en", "unterminated", &ctx).as_deref(),
            Some("Hi {{ .Name")
        );
    }

    #[test]
    fn message_not_found_cases() {
        let store = sample();
        let ctx = MailContext::new("en");
        assert_eq!(store.message("fr", "welcome", &ctx), None);
        assert_eq!(store.message("en", "nonexistent", &ctx), None);
        assert_eq!(store.message("en", "blank", &ctx), None);
        assert_eq!(store.message("en", "number", &ctx), None);
    }

    #[test]
    fn from_yaml_empty_document_is_none() {
        assert!(MailTemplateOverrides::from_yaml("").unwrap().is_none());
        assert!(MailTemplateOverrides::from_yaml("  \n").unwrap().is_none());
        assert!(MailTemplateOverrides::from_yaml("{}").unwrap().is_none());
    }

    #[test]
    fn from_yaml_null_entry_is_kept_empty() {
        let store = MailTemplateOverrides::from_yaml("en: ~\n").unwrap().unwrap();
        assert_eq!(store.languages(), vec!["en"]);
        assert!(store.branding("en").is_empty());
    }

    #[test]
    fn from_yaml_rejects_wrong_shape() {
        assert!(MailTemplateOverrides::from_yaml("- en\n- de\n").is_err());
        assert!(MailTemplateOverrides::from_yaml("en: \"flat string\"\n").is_err());
    }

    #[test]
    fn candidate_paths_relative() {
        let paths = candidate_paths(Path::new(""), "settings/mail_template.yaml");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("settings/mail_template.yaml"),
                PathBuf::from("config/mail_template.yaml"),
                PathBuf::from("../config/mail_template.yaml"),
                PathBuf::from("../../config/mail_template.yaml"),
            ]
        );
    }

    #[test]
    fn candidate_paths_absolute_is_tried_alone() {
        let paths = candidate_paths(Path::new("/srv"), "/etc/authmail/mail_template.yaml");
        assert_eq!(paths, vec![PathBuf::from("/etc/authmail/mail_template.yaml")]);
    }

    #[test]
    fn load_empty_path_is_none() {
        assert!(MailTemplateOverrides::load("").unwrap().is_none());
    }

    #[test]
    fn load_missing_everywhere_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = MailTemplateOverrides::load_in(dir.path(), "mail_template.yaml").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_finds_file_in_parent_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("backend").join("cmd");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(dir.path().join("backend").join("config")).unwrap();
        fs::write(
            dir.path().join("backend").join("config").join("mail_template.yaml"),
            SAMPLE,
        )
        .unwrap();

        let store = MailTemplateOverrides::load_in(&nested, "mail_template.yaml")
            .unwrap()
            .unwrap();
        assert_eq!(store.branding("en").product_name, "Acme ID");
    }

    #[test]
    fn load_parse_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mail_template.yaml"), "en: [unclosed").unwrap();

        let err = MailTemplateOverrides::load_in(dir.path(), "mail_template.yaml").unwrap_err();
        match err {
            OverrideError::Parse { path, .. } => {
                assert!(path.ends_with("mail_template.yaml"));
            }
            e => panic!("Expected Parse error, got {:?}", e),
        }
    }

    #[test]
    fn load_directory_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("mail_template.yaml")).unwrap();

        let err = MailTemplateOverrides::load_in(dir.path(), "mail_template.yaml").unwrap_err();
        assert!(matches!(err, OverrideError::Read { .. }));
    }

    #[test]
    fn load_empty_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mail_template.yaml"), "").unwrap();

        let result = MailTemplateOverrides::load_in(dir.path(), "mail_template.yaml").unwrap();
        assert!(result.is_none());
    }
}

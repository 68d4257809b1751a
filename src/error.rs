//! Centralized error types for authmail using thiserror.
//!
//! Load-time errors (`ConfigError`, `OverrideError`) abort initialization.
//! Render-time errors are either swallowed at the point of degradation
//! (override substitution) or surface as typed failures from the specific
//! render call (`TemplateError`, `TranslateError`, `ComposeError`).

use std::path::PathBuf;
use thiserror::Error;

/// Errors related to service configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    LoadError(String),
    #[error("invalid configuration: {0}")]
    ValidationError(String),
    #[error("invalid email delivery settings: {0}")]
    InvalidDelivery(String),
}

/// Errors raised while loading the mail template override file.
///
/// "Not found" at every candidate path is not an error; the loader
/// returns `Ok(None)` in that case.
#[derive(Error, Debug)]
pub enum OverrideError {
    #[error("mail_template_file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("mail_template_file parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Errors raised while substituting `{{ .Key }}` placeholders.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionError {
    #[error("malformed placeholder near byte {offset}")]
    Syntax { offset: usize },
    #[error("no value for placeholder '{key}'")]
    MissingKey { key: String },
}

/// Errors related to catalog translation lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("message '{message_id}' not found for language '{lang}'")]
    MissingTranslation { lang: String, message_id: String },
}

/// Errors related to template rendering.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template '{name}' not found")]
    NotFound { name: String },
    #[error("template '{name}' is invalid: {message}")]
    Invalid { name: String, message: String },
    #[error("template render failed: {message}")]
    RenderFailed { message: String },
    #[error("translation failed: {0}")]
    MissingTranslation(#[from] TranslateError),
}

/// Errors related to building an outgoing email.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("subject: {0}")]
    Subject(#[from] TranslateError),
    #[error("body: {0}")]
    Body(#[from] TemplateError),
    #[error("invalid address '{address}': {message}")]
    InvalidAddress { address: String, message: String },
    #[error("failed to build email: {0}")]
    Build(String),
}

/// Errors related to handing a message to the mail transport.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),
    #[error("failed to send email: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::LoadError("file not found".to_string());
        assert_eq!(err.to_string(), "failed to load config file: file not found");

        let err = ConfigError::ValidationError("missing field".to_string());
        assert_eq!(err.to_string(), "invalid configuration: missing field");
    }

    #[test]
    fn override_error_display_includes_path() {
        let err = OverrideError::Parse {
            path: PathBuf::from("config/mail_template.yaml"),
            message: "expected a mapping".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "mail_template_file parse config/mail_template.yaml: expected a mapping"
        );

        let err = OverrideError::Read {
            path: PathBuf::from("/etc/mail_template.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("mail_template_file /etc/mail_template.yaml"));
    }

    #[test]
    fn substitution_error_display() {
        let err = SubstitutionError::MissingKey {
            key: "Name".to_string(),
        };
        assert_eq!(err.to_string(), "no value for placeholder 'Name'");

        let err = SubstitutionError::Syntax { offset: 3 };
        assert_eq!(err.to_string(), "malformed placeholder near byte 3");
    }

    #[test]
    fn template_error_display() {
        let err = TemplateError::NotFound {
            name: "email_verification".to_string(),
        };
        assert_eq!(err.to_string(), "template 'email_verification' not found");

        let err = TemplateError::from(TranslateError::MissingTranslation {
            lang: "fr".to_string(),
            message_id: "welcome".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "translation failed: message 'welcome' not found for language 'fr'"
        );
    }

    #[test]
    fn send_error_wraps_compose_error() {
        let err = SendError::from(ComposeError::Build("no body".to_string()));
        assert_eq!(err.to_string(), "compose error: failed to build email: no body");

        let err = SendError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "failed to send email: connection refused");
    }
}

//! Core configuration types and loading.

use super::secret::SecretString;
use crate::error::ConfigError;
use lettre::Address;
use serde::Deserialize;
use std::path::Path;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/authmail/config.yaml";

/// Main configuration structure for authmail.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Service identity and mail localization settings.
    pub service: ServiceConfig,
    /// Outgoing mail settings. Rendering works without them.
    #[serde(default)]
    pub email_delivery: Option<EmailDeliveryConfig>,
}

/// Service identity and mail localization settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name, used e.g. in the subject of outgoing emails.
    pub name: String,
    /// Locale used when a render is requested without a language.
    #[serde(default = "default_mail_locale")]
    pub default_mail_locale: String,
    /// Path to the mail template override file. Empty or absent means
    /// locale files only.
    #[serde(default)]
    pub mail_template_file: Option<String>,
}

/// Outgoing mail settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailDeliveryConfig {
    pub from_address: String,
    #[serde(default)]
    pub from_name: Option<String>,
    pub smtp: SmtpConfig,
}

/// SMTP server configuration.
///
/// `username` and `password` may reference environment variables as `${VAR}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub tls: TlsMode,
    #[serde(default = "default_true")]
    pub tls_verify: bool,
}

/// TLS mode for SMTP connections.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    None,
    #[default]
    Starttls,
    Tls,
}

fn default_mail_locale() -> String {
    crate::catalog::DEFAULT_LANGUAGE.to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LoadError` if the file cannot be read.
    /// Returns `ConfigError::ValidationError` if the YAML is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Override file path, if one is configured.
    pub fn mail_template_file(&self) -> &str {
        self.service
            .mail_template_file
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
    }

    /// Validate the whole configuration, collecting every problem.
    ///
    /// # Errors
    /// Returns a `Vec<ConfigError>` containing all validation errors found.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if self.service.name.trim().is_empty() {
            errors.push(ConfigError::ValidationError(
                "service.name must not be empty".to_string(),
            ));
        }

        let locale = &self.service.default_mail_locale;
        if locale.trim().is_empty() || locale.contains(char::is_whitespace) {
            errors.push(ConfigError::ValidationError(format!(
                "service.default_mail_locale '{}' is not a language tag",
                locale
            )));
        }

        if let Some(delivery) = &self.email_delivery {
            if let Err(e) = delivery.from_address.parse::<Address>() {
                errors.push(ConfigError::InvalidDelivery(format!(
                    "invalid from_address '{}': {}",
                    delivery.from_address, e
                )));
            }

            if delivery.smtp.host.trim().is_empty() {
                errors.push(ConfigError::InvalidDelivery(
                    "smtp.host must not be empty".to_string(),
                ));
            }

            match (&delivery.smtp.username, &delivery.smtp.password) {
                (Some(_), None) => errors.push(ConfigError::InvalidDelivery(
                    "smtp.password required when smtp.username is set".to_string(),
                )),
                (None, Some(_)) => errors.push(ConfigError::InvalidDelivery(
                    "smtp.username required when smtp.password is set".to_string(),
                )),
                (Some(_), Some(password)) if password.is_empty() => {
                    errors.push(ConfigError::InvalidDelivery(
                        "smtp.password must not be empty".to_string(),
                    ))
                }
                _ => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

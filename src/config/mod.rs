//! Configuration loading and validation for authmail.
//!
//! This module handles loading the YAML service configuration,
//! validation, and environment variable substitution for SMTP secrets.

mod env;
mod secret;
mod types;

pub use env::resolve_env_vars;
pub use secret::SecretString;
pub use types::{
    Config, DEFAULT_CONFIG_PATH, EmailDeliveryConfig, ServiceConfig, SmtpConfig, TlsMode,
};

//! Command-line interface for authmail using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format for log aggregation.
    Json,
}

/// Render localized, branded authentication emails.
#[derive(Parser, Debug)]
#[command(name = "authmail")]
#[command(version)]
#[command(about = "Render localized, branded authentication emails")]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Validate configuration, override file and templates, then exit.
    #[arg(long = "validate")]
    pub validate: bool,

    /// Template to render (e.g. "login", "email_verification").
    #[arg(short = 't', long = "template", required_unless_present = "validate")]
    pub template: Option<String>,

    /// Language tag; empty uses service.default_mail_locale.
    #[arg(short = 'l', long = "lang", default_value = "")]
    pub lang: String,

    /// Template variable as KEY=VALUE (repeatable).
    #[arg(long = "var", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Send the rendered email to this address instead of printing it.
    #[arg(long = "to")]
    pub to: Option<String>,

    /// Log format: text or json.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    pub log_format: LogFormat,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

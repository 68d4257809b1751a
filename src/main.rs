//! authmail - render (and optionally send) localized authentication emails.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use authmail::cli::{Cli, LogFormat};
use authmail::config::Config;
use authmail::{ComposerSettings, MailContext, MailTemplateOverrides, Mailer, build_composer};

/// Initialize the tracing subscriber with the specified log format.
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .with_env_filter(filter)
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    info!(config_path = %cli.config.display(), "Loading configuration");

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, path = %cli.config.display(), "Failed to load configuration");
            std::process::exit(1);
        }
    };

    // Fail fast on invalid configuration
    if let Err(errors) = config.validate() {
        for e in &errors {
            error!(error = %e, "Configuration validation error");
        }
        error!(error_count = errors.len(), "Configuration validation failed");
        std::process::exit(1);
    }

    // A half-loaded override file must not be used
    let overrides = MailTemplateOverrides::load(config.mail_template_file())
        .context("failed to load mail template overrides")?;
    let override_languages = overrides
        .as_ref()
        .map(|o| o.languages().join(", "))
        .unwrap_or_default();

    let composer = build_composer(
        ComposerSettings {
            service_name: config.service.name.clone(),
            default_mail_locale: config.service.default_mail_locale.clone(),
        },
        overrides,
    )?;

    if cli.validate {
        let renderer = composer.renderer();
        println!("Configuration is valid: {}", cli.config.display());
        println!("  Service: {}", config.service.name);
        println!("  Default mail locale: {}", config.service.default_mail_locale);
        println!(
            "  Locales: {}",
            renderer.resolver().catalog().languages().join(", ")
        );
        println!(
            "  Overrides: {}",
            if override_languages.is_empty() {
                "none".to_string()
            } else {
                override_languages
            }
        );
        println!("  Templates: {}", renderer.plain_templates().join(", "));
        println!(
            "  Email delivery: {}",
            if config.email_delivery.is_some() {
                "configured"
            } else {
                "not configured"
            }
        );
        return Ok(());
    }

    let template = cli
        .template
        .as_deref()
        .context("--template is required")?;
    let mut ctx = MailContext::new(cli.lang.clone());
    for (key, value) in &cli.vars {
        ctx.insert(key.clone(), value.clone());
    }

    match &cli.to {
        None => {
            let email = composer.compose(&cli.lang, template, &mut ctx)?;
            println!("Subject: {}", email.subject);
            println!();
            println!("{}", email.body_plain);
            println!();
            println!("{}", email.body_html);
            Ok(())
        }
        Some(to) => {
            let delivery = config
                .email_delivery
                .as_ref()
                .context("email_delivery must be configured to send")?;
            let mailer = Mailer::from_config(composer, delivery)?;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(mailer.send(to, &cli.lang, template, &mut ctx))?;
            info!(to = %to, template = %template, "authmail done");
            Ok(())
        }
    }
}

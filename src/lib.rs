//! authmail - localized, brandable email rendering for an authentication service.
//!
//! Messages are resolved through a layered lookup: per-deployment overrides
//! from `mail_template.yaml` first, then the compiled-in locale catalog.

pub mod branding;
pub mod catalog;
pub mod cli;
pub mod composer;
pub mod config;
pub mod context;
pub mod error;
pub mod mailer;
pub mod overrides;
pub mod placeholder;
pub mod resolver;
pub mod template;

use std::sync::Arc;

// Re-export commonly used types
pub use branding::{Branding, inject_branding};
pub use catalog::{LocaleCatalog, preferred_tags};
pub use cli::LogFormat;
pub use composer::{ComposedEmail, ComposerSettings, EmailComposer};
pub use context::MailContext;
pub use mailer::{EmailTransport, Mailer, SmtpTransport};
pub use overrides::{MailTemplateOverrides, OverrideSource};
pub use resolver::MessageResolver;
pub use template::TemplateRenderer;

/// Build a composer over the embedded catalog and templates.
///
/// `overrides` may be `None` when the deployment supplies no override file.
///
/// # Errors
/// Returns `TemplateError::Invalid` if an embedded template fails to compile.
pub fn build_composer(
    settings: ComposerSettings,
    overrides: Option<MailTemplateOverrides>,
) -> Result<EmailComposer, error::TemplateError> {
    let catalog = Arc::new(LocaleCatalog::embedded());
    let overrides = overrides.map(|o| Arc::new(o) as Arc<dyn OverrideSource>);
    let renderer = TemplateRenderer::new(MessageResolver::new(catalog, overrides))?;
    Ok(EmailComposer::new(renderer, settings))
}

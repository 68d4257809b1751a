//! Builds the subject / plain / HTML triple for an outgoing email.
//!
//! The composer prepares the per-render context (service name, branding,
//! active language) and delegates to the resolver for subjects and to the
//! template renderer for bodies.

use crate::branding::{Branding, inject_branding};
use crate::context::{MailContext, SERVICE_NAME_KEY};
use crate::error::{ComposeError, TemplateError, TranslateError};
use crate::template::TemplateRenderer;

/// Prefix of the catalog message ID holding a template's subject line.
pub const SUBJECT_PREFIX: &str = "subject_";

/// Rendered email content, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedEmail {
    pub subject: String,
    pub body_plain: String,
    pub body_html: String,
}

/// Service-level defaults applied to every render.
#[derive(Debug, Clone)]
pub struct ComposerSettings {
    /// Seeded as `ServiceName` when the caller did not provide one.
    pub service_name: String,
    /// Language used when a render is requested with an empty language.
    pub default_mail_locale: String,
}

/// Composes localized, branded emails.
#[derive(Debug)]
pub struct EmailComposer {
    renderer: TemplateRenderer,
    settings: ComposerSettings,
}

impl EmailComposer {
    pub fn new(renderer: TemplateRenderer, settings: ComposerSettings) -> Self {
        Self { renderer, settings }
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Branding overrides for `lang`; all-empty when none are configured.
    pub fn branding(&self, lang: &str) -> Branding {
        self.renderer
            .resolver()
            .overrides()
            .map(|store| store.branding(lang))
            .unwrap_or_default()
    }

    /// Render the subject line: message `subject_<template>`.
    ///
    /// # Errors
    /// Returns `TranslateError::MissingTranslation` if no subject exists.
    pub fn render_subject(
        &self,
        lang: &str,
        template: &str,
        ctx: &mut MailContext,
    ) -> Result<String, TranslateError> {
        let lang = self.prepare(lang, ctx);
        self.renderer
            .resolver()
            .resolve(&lang, &format!("{SUBJECT_PREFIX}{template}"), ctx)
    }

    /// Render the plain-text body.
    ///
    /// # Errors
    /// Propagates [`TemplateError`] from the renderer.
    pub fn render_body_plain(
        &self,
        lang: &str,
        template: &str,
        ctx: &mut MailContext,
    ) -> Result<String, TemplateError> {
        let lang = self.prepare(lang, ctx);
        self.renderer.render_plain(template, &lang, ctx)
    }

    /// Render the HTML body.
    ///
    /// # Errors
    /// Propagates [`TemplateError`] from the renderer.
    pub fn render_body_html(
        &self,
        lang: &str,
        template: &str,
        ctx: &mut MailContext,
    ) -> Result<String, TemplateError> {
        let lang = self.prepare(lang, ctx);
        self.renderer.render_html(template, &lang, ctx)
    }

    /// Render subject, plain body and HTML body for `template`.
    ///
    /// # Errors
    /// Returns the first failing part as a [`ComposeError`].
    pub fn compose(
        &self,
        lang: &str,
        template: &str,
        ctx: &mut MailContext,
    ) -> Result<ComposedEmail, ComposeError> {
        let span = tracing::debug_span!("compose_email", template = %template, lang = %lang);
        let _guard = span.enter();

        let subject = self.render_subject(lang, template, ctx)?;
        let body_plain = self.render_body_plain(lang, template, ctx)?;
        let body_html = self.render_body_html(lang, template, ctx)?;

        Ok(ComposedEmail {
            subject,
            body_plain,
            body_html,
        })
    }

    /// Effective language, with service name, branding and language applied to `ctx`.
    fn prepare(&self, lang: &str, ctx: &mut MailContext) -> String {
        let lang = if lang.trim().is_empty() {
            self.settings.default_mail_locale.clone()
        } else {
            lang.to_string()
        };

        if !ctx.contains_key(SERVICE_NAME_KEY) && !self.settings.service_name.is_empty() {
            ctx.insert(SERVICE_NAME_KEY, self.settings.service_name.clone());
        }
        inject_branding(ctx, &lang, self.renderer.resolver().overrides());
        ctx.set_lang(lang.clone());
        lang
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LocaleCatalog;
    use crate::overrides::{MailTemplateOverrides, OverrideSource};
    use crate::resolver::MessageResolver;
    use serde_json::json;
    use std::sync::Arc;

    const OVERRIDES: &str = r#"
en:
  product_name: "Acme ID"
  copyright: "© 2026 Acme Corp"
  subject_login: "Your {{ .ServiceName }} code: {{ .Code }}"
zh:
  product_name: "Acme 身份"
"#;

    fn composer(with_overrides: bool) -> EmailComposer {
        let catalog = Arc::new(LocaleCatalog::embedded());
        let overrides: Option<Arc<dyn OverrideSource>> = if with_overrides {
            Some(Arc::new(MailTemplateOverrides::from_yaml(OVERRIDES).unwrap().unwrap()))
        } else {
            None
        };
        let renderer = TemplateRenderer::new(MessageResolver::new(catalog, overrides)).unwrap();
        EmailComposer::new(
            renderer,
            ComposerSettings {
                service_name: "Hanko".to_string(),
                default_mail_locale: "de".to_string(),
            },
        )
    }

    fn login_ctx() -> MailContext {
        MailContext::new("").with("Code", "123456").with("TTL", 5)
    }

    #[test]
    fn subject_uses_catalog_and_service_name() {
        let composer = composer(false);
        let mut ctx = login_ctx();

        let subject = composer.render_subject("en", "login", &mut ctx).unwrap();
        assert_eq!(subject, "Use passcode 123456 to sign in to Hanko");
    }

    #[test]
    fn subject_override_with_branded_service_name() {
        let composer = composer(true);
        let mut ctx = login_ctx();

        let subject = composer.render_subject("en", "login", &mut ctx).unwrap();
        assert_eq!(subject, "Your Acme ID code: 123456");
    }

    #[test]
    fn branding_product_name_reaches_catalog_body() {
        let composer = composer(true);
        let mut ctx = login_ctx();

        let subject = composer.render_subject("zh", "login", &mut ctx).unwrap();
        assert_eq!(subject, "使用验证码 123456 登录 Acme 身份");
        assert_eq!(ctx.get(SERVICE_NAME_KEY), Some(&json!("Acme 身份")));
    }

    #[test]
    fn empty_language_uses_default_mail_locale() {
        let composer = composer(false);
        let mut ctx = login_ctx();

        let body = composer.render_body_plain("", "login", &mut ctx).unwrap();
        assert!(body.starts_with("Hallo,"), "{}", body);
        assert_eq!(ctx.lang(), "de");
    }

    #[test]
    fn caller_service_name_is_kept_without_branding() {
        let composer = composer(false);
        let mut ctx = login_ctx().with(SERVICE_NAME_KEY, "Custom");

        let subject = composer.render_subject("en", "login", &mut ctx).unwrap();
        assert!(subject.ends_with("Custom"));
    }

    #[test]
    fn compose_renders_all_parts() {
        let composer = composer(true);
        let mut ctx = login_ctx();

        let email = composer.compose("en-US", "login", &mut ctx).unwrap();

        assert_eq!(email.subject, "Your Acme ID code: 123456");
        assert!(email.body_plain.contains("123456"));
        assert!(email.body_plain.contains("Acme ID"));
        assert!(email.body_html.contains("<h1 style=\"font-size: 20px; margin: 0;\">Acme ID</h1>"));
        assert!(email.body_html.contains("© 2026 Acme Corp"));
    }

    #[test]
    fn compose_unknown_template_fails_on_subject() {
        let composer = composer(false);
        let mut ctx = login_ctx();

        let err = composer.compose("en", "nonexistent", &mut ctx).unwrap_err();
        assert!(matches!(err, ComposeError::Subject(_)));
    }

    #[test]
    fn compose_is_idempotent() {
        let composer = composer(true);
        let first = composer.compose("en", "login", &mut login_ctx()).unwrap();
        let second = composer.compose("en", "login", &mut login_ctx()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn branding_accessor() {
        let with_store = composer(true);
        let branding = with_store.branding("en");
        assert_eq!(branding.product_name, "Acme ID");
        assert_eq!(branding.footer_sent_by, "");
        assert_eq!(branding.copyright, "© 2026 Acme Corp");

        assert!(composer(false).branding("en").is_empty());
    }
}

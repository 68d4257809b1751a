//! Email body templating powered by minijinja.
//!
//! Templates call `t("message_id")` for every translatable string; the
//! call is served by the [`MessageResolver`] with the language and values
//! of the render in progress.
//!
//! # Architecture
//!
//! ```text
//! composer.rs → template.rs → resolver.rs → {overrides.rs, catalog.rs}
//! ```
//!
//! # Example
//!
//! ```ignore
//! use authmail::{MailContext, TemplateRenderer};
//!
//! let renderer = TemplateRenderer::new(resolver)?;
//! let mut ctx = MailContext::new("de").with("Code", "123456");
//!
//! let plain = renderer.render_plain("login", "de", &mut ctx)?;
//! let html = renderer.render_html("login", "de", &mut ctx)?;
//! ```

use crate::context::MailContext;
use crate::error::{TemplateError, TranslateError};
use crate::resolver::MessageResolver;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior, Value};
use std::sync::Arc;

/// Name of the shared HTML layout every HTML content template extends.
pub const LAYOUT_TEMPLATE: &str = "layout.html";

const PLAIN_SUFFIX: &str = ".txt";
const HTML_SUFFIX: &str = ".html";

/// Templates compiled into the binary, keyed by `<stem>.<kind>`.
const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html.j2")),
    ("login.txt", include_str!("../templates/login.txt.j2")),
    ("login.html", include_str!("../templates/login.html.j2")),
    (
        "email_verification.txt",
        include_str!("../templates/email_verification.txt.j2"),
    ),
    (
        "email_verification.html",
        include_str!("../templates/email_verification.html.j2"),
    ),
    (
        "password_reset.txt",
        include_str!("../templates/password_reset.txt.j2"),
    ),
    (
        "password_reset.html",
        include_str!("../templates/password_reset.html.j2"),
    ),
];

/// Renders plain-text and HTML email bodies.
///
/// All templates, including every layout + content pair, are compiled once
/// at construction. Each render works on a cheap clone of the environment
/// with a `t` function bound to that render's context, so one renderer can
/// be shared across threads.
pub struct TemplateRenderer {
    /// Pre-compiled environment holding every template.
    env: Environment<'static>,
    resolver: MessageResolver,
}

impl TemplateRenderer {
    /// Create a renderer over the embedded templates.
    ///
    /// # Errors
    /// Returns `TemplateError::Invalid` if an embedded template fails to compile.
    pub fn new(resolver: MessageResolver) -> Result<Self, TemplateError> {
        Self::with_templates(resolver, EMBEDDED_TEMPLATES.iter().copied())
    }

    /// Create a renderer over custom `(name, source)` templates.
    ///
    /// Names follow the embedded convention: `<name>.txt` for plain bodies,
    /// `<name>.html` for HTML content and `layout.html` for the layout.
    ///
    /// # Errors
    /// Returns `TemplateError::Invalid` if a template fails to compile.
    pub fn with_templates<I>(resolver: MessageResolver, templates: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (&'static str, &'static str)>,
    {
        let mut env = Environment::new();
        // Branding variables are optional; missing ones render empty.
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        env.set_auto_escape_callback(|name| {
            if name.ends_with(HTML_SUFFIX) {
                AutoEscape::Html
            } else {
                AutoEscape::None
            }
        });

        for (name, source) in templates {
            env.add_template(name, source)
                .map_err(|e| TemplateError::Invalid {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
        }

        let renderer = Self { env, resolver };
        tracing::debug!(
            plain = renderer.plain_templates().len(),
            html = renderer.html_templates().len(),
            "Mail templates compiled"
        );
        Ok(renderer)
    }

    pub fn resolver(&self) -> &MessageResolver {
        &self.resolver
    }

    /// Names of the available plain-text templates.
    pub fn plain_templates(&self) -> Vec<&str> {
        self.names_with_suffix(PLAIN_SUFFIX)
    }

    /// Names of the available HTML content templates (layout excluded).
    pub fn html_templates(&self) -> Vec<&str> {
        self.names_with_suffix(HTML_SUFFIX)
            .into_iter()
            .filter(|name| format!("{name}{HTML_SUFFIX}") != LAYOUT_TEMPLATE)
            .collect()
    }

    fn names_with_suffix(&self, suffix: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .env
            .templates()
            .filter_map(|(name, _)| name.strip_suffix(suffix))
            .collect();
        names.sort_unstable();
        names
    }

    /// Render the plain-text body `template_name` for `lang`.
    ///
    /// Sets the active language on `ctx` before rendering. The result is
    /// trimmed of surrounding whitespace.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Rendered body.
    /// * `Err(TemplateError::NotFound)` - No plain template with that name.
    /// * `Err(TemplateError::MissingTranslation)` - A `t` call had no catalog entry.
    /// * `Err(TemplateError::RenderFailed)` - Any other template engine error.
    pub fn render_plain(
        &self,
        template_name: &str,
        lang: &str,
        ctx: &mut MailContext,
    ) -> Result<String, TemplateError> {
        ctx.set_lang(lang);
        self.render(template_name, &format!("{template_name}{PLAIN_SUFFIX}"), ctx)
    }

    /// Render the HTML body `template_name` for `lang`.
    ///
    /// The content template extends the shared layout; values are
    /// HTML-escaped. Errors are the same as for [`TemplateRenderer::render_plain`].
    pub fn render_html(
        &self,
        template_name: &str,
        lang: &str,
        ctx: &mut MailContext,
    ) -> Result<String, TemplateError> {
        ctx.set_lang(lang);
        self.render(template_name, &format!("{template_name}{HTML_SUFFIX}"), ctx)
    }

    fn render(
        &self,
        template_name: &str,
        full_name: &str,
        ctx: &MailContext,
    ) -> Result<String, TemplateError> {
        tracing::trace!(template_name = %full_name, lang = %ctx.lang(), "Starting template render");

        let env = self.bind_translate(ctx);
        let template = env.get_template(full_name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => TemplateError::NotFound {
                name: template_name.to_string(),
            },
            _ => render_error(e),
        })?;

        let rendered = template
            .render(Value::from_serialize(ctx.values()))
            .map_err(render_error)?;

        tracing::trace!(template_name = %full_name, len = rendered.len(), "Template rendered successfully");
        Ok(rendered.trim().to_string())
    }

    /// Clone of the compiled environment with `t` bound to `ctx`.
    fn bind_translate(&self, ctx: &MailContext) -> Environment<'static> {
        let mut env = self.env.clone();
        let resolver = self.resolver.clone();
        let ctx = Arc::new(ctx.clone());
        env.add_function("t", move |message_id: &str| -> Result<String, minijinja::Error> {
            resolver.translate(message_id, &ctx).map_err(|e| {
                minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string()).with_source(e)
            })
        });
        env
    }
}

/// Map an engine error, surfacing translation misses as their own variant.
fn render_error(err: minijinja::Error) -> TemplateError {
    let mut source = std::error::Error::source(&err);
    while let Some(inner) = source {
        if let Some(missing) = inner.downcast_ref::<TranslateError>() {
            return TemplateError::MissingTranslation(missing.clone());
        }
        source = inner.source();
    }
    TemplateError::RenderFailed {
        message: err.to_string(),
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("plain_templates", &self.plain_templates())
            .field("html_templates", &self.html_templates())
            .finish()
    }
}

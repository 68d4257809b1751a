//! Message resolution: override store first, locale catalog second.

use crate::catalog::LocaleCatalog;
use crate::context::MailContext;
use crate::error::TranslateError;
use crate::overrides::OverrideSource;
use std::sync::Arc;

/// Resolves message IDs to final, substituted strings.
///
/// Cheap to clone; the catalog and override store are shared read-only
/// across clones, so one resolver can serve concurrent renders.
#[derive(Clone)]
pub struct MessageResolver {
    catalog: Arc<LocaleCatalog>,
    overrides: Option<Arc<dyn OverrideSource>>,
}

impl MessageResolver {
    pub fn new(catalog: Arc<LocaleCatalog>, overrides: Option<Arc<dyn OverrideSource>>) -> Self {
        Self { catalog, overrides }
    }

    pub fn catalog(&self) -> &LocaleCatalog {
        &self.catalog
    }

    pub fn overrides(&self) -> Option<&dyn OverrideSource> {
        self.overrides.as_deref()
    }

    /// Resolve `message_id` for `lang`, substituting placeholders from `ctx`.
    ///
    /// An override that is found wins verbatim. Otherwise the catalog is
    /// consulted with language fallback.
    ///
    /// # Errors
    /// Returns `TranslateError::MissingTranslation` if the catalog has no
    /// entry at any fallback level.
    pub fn resolve(
        &self,
        lang: &str,
        message_id: &str,
        ctx: &MailContext,
    ) -> Result<String, TranslateError> {
        if let Some(store) = &self.overrides
            && let Some(text) = store.message(lang, message_id, ctx)
        {
            tracing::debug!(lang = %lang, message_id = %message_id, source = "override", "Message resolved");
            metrics::counter!("authmail_override_hits_total").increment(1);
            return Ok(text);
        }

        match self.catalog.localize(lang, message_id, ctx) {
            Ok(text) => {
                tracing::debug!(lang = %lang, message_id = %message_id, source = "catalog", "Message resolved");
                metrics::counter!("authmail_catalog_lookups_total").increment(1);
                Ok(text)
            }
            Err(e) => {
                tracing::warn!(lang = %lang, message_id = %message_id, "Missing translation");
                metrics::counter!("authmail_missing_translations_total").increment(1);
                Err(e)
            }
        }
    }

    /// Resolve `message_id` using the language carried by `ctx`.
    ///
    /// # Errors
    /// Same as [`MessageResolver::resolve`].
    pub fn translate(&self, message_id: &str, ctx: &MailContext) -> Result<String, TranslateError> {
        self.resolve(ctx.lang(), message_id, ctx)
    }
}

impl std::fmt::Debug for MessageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageResolver")
            .field("languages", &self.catalog.languages())
            .field("has_overrides", &self.overrides.is_some())
            .finish()
    }
}

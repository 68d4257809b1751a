//! Per-language branding overrides injected into the render context.

use crate::context::{MailContext, SERVICE_NAME_KEY};
use crate::overrides::OverrideSource;

/// Context key for the product name shown in the email header.
pub const PRODUCT_NAME_KEY: &str = "MailProductName";
/// Context key for the footer attribution line.
pub const FOOTER_SENT_BY_KEY: &str = "MailFooterSentBy";
/// Context key for the copyright line.
pub const COPYRIGHT_KEY: &str = "MailCopyright";

/// Branding fields for one language. Empty means "not overridden".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Branding {
    pub product_name: String,
    pub footer_sent_by: String,
    pub copyright: String,
}

impl Branding {
    pub fn is_empty(&self) -> bool {
        self.product_name.is_empty() && self.footer_sent_by.is_empty() && self.copyright.is_empty()
    }
}

/// Write non-empty branding fields for `lang` into `ctx`.
///
/// The product name is written under both `MailProductName` and
/// `ServiceName` so subject and body strings using the generic service
/// placeholder show the configured product. Empty fields are left unset so
/// templates fall back to their catalog text. No-op without a store.
pub fn inject_branding(ctx: &mut MailContext, lang: &str, store: Option<&dyn OverrideSource>) {
    let Some(store) = store else {
        return;
    };

    let branding = store.branding(lang);
    if branding.is_empty() {
        return;
    }

    if !branding.product_name.trim().is_empty() {
        ctx.insert(PRODUCT_NAME_KEY, branding.product_name.clone());
        ctx.insert(SERVICE_NAME_KEY, branding.product_name);
    }
    if !branding.footer_sent_by.trim().is_empty() {
        ctx.insert(FOOTER_SENT_BY_KEY, branding.footer_sent_by);
    }
    if !branding.copyright.trim().is_empty() {
        ctx.insert(COPYRIGHT_KEY, branding.copyright);
    }

    tracing::trace!(lang = %lang, "Branding injected");
}

//! Outbound mail delivery over SMTP.
//!
//! # Testability
//!
//! The `Mailer` supports transport injection:
//! - Production: `SmtpTransport` wrapping `AsyncSmtpTransport<Tokio1Executor>`
//! - Testing: any `EmailTransport` implementation recording messages
//!
//! Delivery is a single attempt; retries and queueing are left to the caller.

use crate::composer::{ComposedEmail, EmailComposer};
use crate::config::{EmailDeliveryConfig, TlsMode, resolve_env_vars};
use crate::context::MailContext;
use crate::error::{ComposeError, ConfigError, SendError};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

/// Async email transport abstraction.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send an email message, returning a description of the failure.
    async fn send_email(&self, message: Message) -> Result<(), String>;
}

/// SMTP transport implementing `EmailTransport`.
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(transport: AsyncSmtpTransport<Tokio1Executor>) -> Self {
        Self { inner: transport }
    }

    /// Build the SMTP transport from delivery settings.
    ///
    /// Credentials support `${VAR}` environment substitution.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidDelivery` for unresolvable credentials,
    /// a username without password (or the reverse), or TLS setup failures.
    pub fn from_config(config: &EmailDeliveryConfig) -> Result<Self, ConfigError> {
        let smtp = &config.smtp;

        let username = smtp
            .username
            .as_deref()
            .map(resolve_env_vars)
            .transpose()
            .map_err(|e| ConfigError::InvalidDelivery(format!("smtp.username: {}", e)))?;
        let password = smtp
            .password
            .as_ref()
            .map(|p| resolve_env_vars(p.expose()))
            .transpose()
            .map_err(|e| ConfigError::InvalidDelivery(format!("smtp.password: {}", e)))?;

        let builder = match smtp.tls {
            TlsMode::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host).port(smtp.port)
            }
            TlsMode::Starttls | TlsMode::Tls => {
                let mut tls_builder = TlsParameters::builder(smtp.host.clone());
                if !smtp.tls_verify {
                    tls_builder = tls_builder.dangerous_accept_invalid_certs(true);
                }
                let params = tls_builder
                    .build()
                    .map_err(|e| ConfigError::InvalidDelivery(format!("TLS configuration error: {}", e)))?;
                let tls = if smtp.tls == TlsMode::Tls {
                    Tls::Wrapper(params)
                } else {
                    Tls::Required(params)
                };
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
                    .port(smtp.port)
                    .tls(tls)
            }
        };

        let builder = match (username, password) {
            (Some(u), Some(p)) => builder.credentials(Credentials::new(u, p)),
            (Some(_), None) => {
                return Err(ConfigError::InvalidDelivery(
                    "smtp.password required when smtp.username is set".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::InvalidDelivery(
                    "smtp.username required when smtp.password is set".to_string(),
                ));
            }
            (None, None) => builder,
        };

        Ok(Self::new(builder.build()))
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send_email(&self, message: Message) -> Result<(), String> {
        self.inner
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Composes emails and hands them to the transport.
pub struct Mailer {
    composer: EmailComposer,
    transport: Arc<dyn EmailTransport>,
    from: Mailbox,
}

impl Mailer {
    pub fn new(composer: EmailComposer, transport: Arc<dyn EmailTransport>, from: Mailbox) -> Self {
        Self {
            composer,
            transport,
            from,
        }
    }

    /// Create a mailer sending through SMTP as configured.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidDelivery` for an invalid sender address
    /// or SMTP settings.
    pub fn from_config(composer: EmailComposer, config: &EmailDeliveryConfig) -> Result<Self, ConfigError> {
        let from = sender_mailbox(config)?;
        let transport = SmtpTransport::from_config(config)?;
        Ok(Self::new(composer, Arc::new(transport), from))
    }

    pub fn composer(&self) -> &EmailComposer {
        &self.composer
    }

    /// Build a `multipart/alternative` message: plain text first, HTML second.
    ///
    /// # Errors
    /// Returns `ComposeError::Build` if lettre rejects the message.
    pub fn build_message(&self, to: &Mailbox, email: &ComposedEmail) -> Result<Message, ComposeError> {
        Message::builder()
            .from(self.from.clone())
            .to(to.clone())
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.body_plain.clone(),
                email.body_html.clone(),
            ))
            .map_err(|e| ComposeError::Build(e.to_string()))
    }

    /// Render `template` for `lang` and send it to `to`.
    ///
    /// # Errors
    /// Returns `SendError::Compose` if the address or any part fails to
    /// render, `SendError::Transport` if the transport rejects the message.
    pub async fn send(
        &self,
        to: &str,
        lang: &str,
        template: &str,
        ctx: &mut MailContext,
    ) -> Result<(), SendError> {
        let recipient: Mailbox = to.parse().map_err(|e: lettre::address::AddressError| {
            ComposeError::InvalidAddress {
                address: to.to_string(),
                message: e.to_string(),
            }
        })?;

        let email = self.composer.compose(lang, template, ctx)?;
        let message = self.build_message(&recipient, &email)?;

        match self.transport.send_email(message).await {
            Ok(()) => {
                tracing::info!(template = %template, lang = %ctx.lang(), "Email sent");
                metrics::counter!("authmail_emails_sent_total", "template" => template.to_string())
                    .increment(1);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(template = %template, error = %e, "Failed to send email");
                metrics::counter!("authmail_emails_failed_total", "template" => template.to_string())
                    .increment(1);
                Err(SendError::Transport(e))
            }
        }
    }
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("from", &self.from.to_string())
            .field("composer", &self.composer)
            .finish()
    }
}

/// Sender mailbox from `from_address` / `from_name`.
///
/// # Errors
/// Returns `ConfigError::InvalidDelivery` if `from_address` is not an address.
pub fn sender_mailbox(config: &EmailDeliveryConfig) -> Result<Mailbox, ConfigError> {
    let address: Address = config.from_address.parse().map_err(|e| {
        ConfigError::InvalidDelivery(format!(
            "invalid from_address '{}': {}",
            config.from_address, e
        ))
    })?;
    let name = config
        .from_name
        .as_ref()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    Ok(Mailbox::new(name, address))
}

//! Integration tests for composing and sending through an injected transport.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use authmail::error::{ComposeError, SendError, TemplateError};
use authmail::{
    ComposerSettings, EmailTransport, MailContext, MailTemplateOverrides, Mailer, build_composer,
};
use lettre::Message;
use lettre::message::Mailbox;

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<Message>>,
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    async fn send_email(&self, message: Message) -> Result<(), String> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

fn make_mailer(transport: Arc<RecordingTransport>) -> Mailer {
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");
    let overrides = MailTemplateOverrides::load_in(&fixtures, "mail_template.yaml").unwrap();
    let composer = build_composer(
        ComposerSettings {
            service_name: "Hanko".to_string(),
            default_mail_locale: "en".to_string(),
        },
        overrides,
    )
    .unwrap();
    let from: Mailbox = "Acme <noreply@example.com>".parse().unwrap();
    Mailer::new(composer, transport, from)
}

#[tokio::test]
async fn send_branded_login_email() {
    let transport = Arc::new(RecordingTransport::default());
    let mailer = make_mailer(transport.clone());
    let mut ctx = MailContext::new("")
        .with("Code", "987654")
        .with("TTL", 15)
        .with("Name", "Ann");

    mailer
        .send("ann@example.com", "en-US", "login", &mut ctx)
        .await
        .unwrap();

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);

    let message = &sent[0];
    let recipients: Vec<String> = message
        .envelope()
        .to()
        .iter()
        .map(|a| a.to_string())
        .collect();
    assert_eq!(recipients, vec!["ann@example.com"]);

    let formatted = String::from_utf8_lossy(&message.formatted()).to_string();
    assert!(formatted.contains("Subject: Your Acme ID sign-in code is 987654"), "{formatted}");
    assert!(formatted.contains("multipart/alternative"));
    assert!(formatted.contains("text/plain"));
    assert!(formatted.contains("text/html"));
}

#[tokio::test]
async fn send_unknown_template_is_not_handed_to_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let mailer = make_mailer(transport.clone());
    let mut ctx = MailContext::new("en").with("Code", "1");

    let err = mailer
        .send("ann@example.com", "en", "magic_link", &mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::Compose(ComposeError::Subject(_))));
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[test]
fn renderer_reports_unknown_body_template() {
    let mailer = make_mailer(Arc::new(RecordingTransport::default()));
    let mut ctx = MailContext::new("en");

    let err = mailer
        .composer()
        .render_body_plain("en", "magic_link", &mut ctx)
        .unwrap_err();
    match err {
        TemplateError::NotFound { name } => assert_eq!(name, "magic_link"),
        e => panic!("Expected NotFound, got {:?}", e),
    }
}

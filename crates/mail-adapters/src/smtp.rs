//! SMTP relay with authentication. Port 465 speaks implicit TLS, any other
//! port upgrades with STARTTLS.

use async_trait::async_trait;
use domains::{AppError, ContactMessage, Mailer, Result};
use lettre::message::{header::ContentType, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::OutgoingEmail;

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    Implicit,
    StartTls,
}

impl TlsMode {
    pub fn for_port(port: u16) -> Self {
        if port == 465 {
            Self::Implicit
        } else {
            Self::StartTls
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from: String,
    pub to: String,
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
}

impl SmtpMailer {
    /// Builds the transport without connecting; the first send dials out.
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let builder = match TlsMode::for_port(config.port) {
            TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host),
            TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host),
        }
        .map_err(|e| AppError::Configuration(format!("invalid SMTP host '{}': {e}", config.host)))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ))
            .build();

        Ok(Self { transport, config })
    }
}

fn mailbox(raw: &str, role: &str) -> Result<Mailbox> {
    raw.trim()
        .parse()
        .map_err(|e| AppError::InvalidInput(format!("invalid {role} address '{raw}': {e}")))
}

/// Turns the shared layout into an RFC 5322 message.
pub fn build_message(email: &OutgoingEmail) -> Result<Message> {
    let mut builder = Message::builder()
        .from(mailbox(&email.from, "sender")?)
        .reply_to(mailbox(&email.reply_to, "reply-to")?)
        .subject(email.subject.clone())
        .header(ContentType::TEXT_PLAIN);
    for to in &email.to {
        builder = builder.to(mailbox(to, "recipient")?);
    }
    builder
        .body(email.text.clone())
        .map_err(|e| AppError::Delivery(format!("could not build message: {e}")))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &ContactMessage) -> Result<()> {
        let email = OutgoingEmail::contact(message, &self.config.from, &self.config.to);
        let message = build_message(&email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Delivery(format!("smtp send failed: {e}")))?;

        info!(to = %self.config.to, host = %self.config.host, "contact email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactMessage {
        ContactMessage {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            message: "Is room 12 free?".into(),
        }
    }

    #[test]
    fn port_465_uses_implicit_tls() {
        assert_eq!(TlsMode::for_port(465), TlsMode::Implicit);
        assert_eq!(TlsMode::for_port(DEFAULT_SMTP_PORT), TlsMode::StartTls);
        assert_eq!(TlsMode::for_port(25), TlsMode::StartTls);
    }

    #[test]
    fn message_carries_the_contact_layout() {
        let email = OutgoingEmail::contact(&contact(), "Site Contact <office@dorm.example>", "office@dorm.example");
        let message = build_message(&email).unwrap();

        let recipients: Vec<String> = message.envelope().to().iter().map(|a| a.to_string()).collect();
        assert_eq!(recipients, vec!["office@dorm.example".to_string()]);

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: New contact form submission"));
        assert!(raw.contains("Reply-To: ana@example.com"));
        assert!(raw.contains("Name: Ana"));
    }

    #[test]
    fn malformed_reply_to_is_invalid_input() {
        let mut message = contact();
        message.email = "not an address".into();
        let email = OutgoingEmail::contact(&message, "office@dorm.example", "office@dorm.example");
        assert!(matches!(build_message(&email), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn transport_builds_without_connecting() {
        let config = SmtpConfig {
            host: DEFAULT_SMTP_HOST.into(),
            port: 465,
            username: "office@dorm.example".into(),
            password: SecretString::from("app-password".to_string()),
            from: "Site Contact <office@dorm.example>".into(),
            to: "office@dorm.example".into(),
        };
        assert!(SmtpMailer::new(config).is_ok());
    }
}

//! # mail-adapters
//!
//! Outbound email providers for the contact form. The message layout is
//! shared; the transport is chosen by cargo feature.

use domains::ContactMessage;
use serde::Serialize;

#[cfg(feature = "mail-resend")]
pub mod resend;

#[cfg(feature = "mail-smtp")]
pub mod smtp;

#[cfg(feature = "mail-resend")]
pub use resend::{ResendConfig, ResendMailer};
#[cfg(feature = "mail-smtp")]
pub use smtp::{SmtpConfig, SmtpMailer};

pub const CONTACT_SUBJECT: &str = "New contact form submission";
pub const DEFAULT_FROM: &str = "Site Contact <onboarding@resend.dev>";

/// A provider-neutral outgoing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: String,
    pub subject: String,
    pub text: String,
}

impl OutgoingEmail {
    /// Lays out a contact form submission. The submitter becomes the reply-to
    /// so the site owner can answer directly.
    pub fn contact(message: &ContactMessage, from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: vec![to.to_string()],
            reply_to: message.email.trim().to_string(),
            subject: CONTACT_SUBJECT.to_string(),
            text: format!(
                "Name: {}\nEmail: {}\nMessage: {}",
                message.name.trim(),
                message.email.trim(),
                message.message
            ),
        }
    }
}

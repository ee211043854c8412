//! Resend email API (`POST /emails`).

use async_trait::async_trait;
use domains::{AppError, ContactMessage, Mailer, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::OutgoingEmail;

pub const RESEND_API_BASE: &str = "https://api.resend.com";

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: SecretString,
    pub from: String,
    pub to: String,
}

pub struct ResendMailer {
    http: reqwest::Client,
    config: ResendConfig,
    api_base: String,
}

impl ResendMailer {
    pub fn new(config: ResendConfig) -> Self {
        Self::with_api_base(config, RESEND_API_BASE)
    }

    pub fn with_api_base(config: ResendConfig, api_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.api_base)
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &ContactMessage) -> Result<()> {
        let email = OutgoingEmail::contact(message, &self.config.from, &self.config.to);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&email)
            .send()
            .await
            .map_err(AppError::delivery)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Delivery(format!("resend returned {status}: {body}")));
        }

        info!(to = %self.config.to, "contact email sent");
        Ok(())
    }
}

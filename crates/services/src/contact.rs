//! Contact form relay.

use std::sync::Arc;

use domains::{AppError, ContactMessage, Mailer, Result};
use tracing::{error, info};

pub struct ContactService {
    mailer: Option<Arc<dyn Mailer>>,
}

impl ContactService {
    /// `None` when no provider is configured; every send then fails with
    /// a configuration error.
    pub fn new(mailer: Option<Arc<dyn Mailer>>) -> Self {
        Self { mailer }
    }

    pub async fn send(&self, message: ContactMessage) -> Result<()> {
        message.validate()?;

        let mailer = self
            .mailer
            .as_ref()
            .ok_or_else(|| AppError::Configuration("mail provider is not configured".into()))?;

        mailer.send(&message).await.inspect_err(|err| {
            error!(error = %err, "contact mail failed");
        })?;
        info!("contact mail relayed");
        Ok(())
    }
}

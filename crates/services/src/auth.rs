//! Admin login, logout and request authorization.

use std::sync::Arc;

use domains::{AppError, CredentialVerifier, Result};
use tracing::{info, warn};

use crate::rate_limit::LoginRateLimiter;
use crate::session::{SessionStatus, SessionStore};

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ").filter(|token| !token.is_empty())
}

pub struct AdminAuth {
    credentials: Arc<dyn CredentialVerifier>,
    sessions: SessionStore,
    limiter: LoginRateLimiter,
}

impl AdminAuth {
    pub fn new(
        credentials: Arc<dyn CredentialVerifier>,
        sessions: SessionStore,
        limiter: LoginRateLimiter,
    ) -> Self {
        Self {
            credentials,
            sessions,
            limiter,
        }
    }

    /// Rate limit first, credentials second: a throttled client is rejected
    /// even with the right password.
    pub fn login(&self, client: &str, username: &str, password: &str) -> Result<String> {
        if !self.limiter.check(client) {
            warn!(client, "login throttled");
            return Err(AppError::RateLimited(
                "too many login attempts, try again later".into(),
            ));
        }

        if !self.credentials.verify(username.trim(), password.trim()) {
            warn!(client, "login rejected");
            return Err(AppError::Unauthorized("invalid username or password".into()));
        }

        let token = self.sessions.issue()?;
        info!(client, "admin logged in");
        Ok(token)
    }

    pub fn logout(&self, authorization: Option<&str>) {
        if let Some(token) = bearer_token(authorization) {
            self.sessions.revoke(token);
        }
    }

    /// The admin guard. Expired sessions are evicted by the validation itself.
    pub fn authorize(&self, authorization: Option<&str>) -> Result<()> {
        let token = bearer_token(authorization)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

        match self.sessions.validate(token) {
            SessionStatus::Valid => Ok(()),
            SessionStatus::Expired => Err(AppError::SessionExpired),
            SessionStatus::Unknown => Err(AppError::Unauthorized("unknown session".into())),
        }
    }
}

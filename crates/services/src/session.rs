//! In-memory admin session store.
//!
//! Sessions expire lazily: nothing sweeps the map, an aged-out entry is
//! evicted the first time it is validated. Validation does not refresh the
//! session clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use domains::{Clock, Result, Session, TokenSource};

pub fn session_ttl() -> Duration {
    Duration::hours(12)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Valid,
    Expired,
    Unknown,
}

/// A session issued at `created_at` is live while its age is at most `ttl`.
pub fn session_is_live(created_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - created_at <= ttl
}

pub struct SessionStore {
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenSource>,
    ttl: Duration,
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new(clock: Arc<dyn Clock>, tokens: Arc<dyn TokenSource>, ttl: Duration) -> Self {
        Self {
            clock,
            tokens,
            ttl,
            sessions: DashMap::new(),
        }
    }

    pub fn with_defaults(clock: Arc<dyn Clock>, tokens: Arc<dyn TokenSource>) -> Self {
        Self::new(clock, tokens, session_ttl())
    }

    pub fn issue(&self) -> Result<String> {
        let token = self.tokens.generate()?;
        let session = Session {
            created_at: self.clock.now(),
        };
        self.sessions.insert(token.clone(), session);
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> SessionStatus {
        let now = self.clock.now();
        // The read guard must be released before evicting.
        let status = match self.sessions.get(token) {
            None => SessionStatus::Unknown,
            Some(session) if session_is_live(session.created_at, now, self.ttl) => SessionStatus::Valid,
            Some(_) => SessionStatus::Expired,
        };
        if status == SessionStatus::Expired {
            self.sessions.remove(token);
        }
        status
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.remove(token);
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

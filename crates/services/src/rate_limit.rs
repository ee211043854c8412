//! Per-client login throttle.
//!
//! Fixed window per client: the first attempt opens a window, at most
//! `max_attempts` are allowed inside it, and the window resets the first time
//! an attempt is seen after it closed. In-memory and best-effort only; the
//! client key comes from a spoofable forwarding header.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use domains::Clock;

pub const MAX_LOGIN_ATTEMPTS: u32 = 10;

pub fn login_window() -> Duration {
    Duration::minutes(10)
}

#[derive(Debug, Clone, Copy)]
struct AttemptCounter {
    count: u32,
    reset_at: DateTime<Utc>,
}

pub struct LoginRateLimiter {
    clock: Arc<dyn Clock>,
    window: Duration,
    max_attempts: u32,
    counters: DashMap<String, AttemptCounter>,
}

impl LoginRateLimiter {
    pub fn new(clock: Arc<dyn Clock>, window: Duration, max_attempts: u32) -> Self {
        Self {
            clock,
            window,
            max_attempts,
            counters: DashMap::new(),
        }
    }

    /// 10 attempts per 10 minutes.
    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, login_window(), MAX_LOGIN_ATTEMPTS)
    }

    /// Records an attempt from `client` and reports whether it may proceed.
    /// Saturates at the limit: rejected attempts are not counted.
    pub fn check(&self, client: &str) -> bool {
        let now = self.clock.now();
        let fresh = AttemptCounter {
            count: 1,
            reset_at: now + self.window,
        };

        match self.counters.entry(client.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                true
            }
            Entry::Occupied(mut slot) => {
                let counter = slot.get_mut();
                if now > counter.reset_at {
                    *counter = fresh;
                    return true;
                }
                if counter.count >= self.max_attempts {
                    return false;
                }
                counter.count += 1;
                true
            }
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.counters.len()
    }
}

//! # services
//!
//! Application logic of the dorm site, written against the ports in
//! `domains` only. Adapters are injected by the binary.

pub mod announcements;
pub mod auth;
pub mod clock;
pub mod contact;
mod content;
pub mod events;
pub mod rate_limit;
pub mod session;

pub use announcements::AnnouncementService;
pub use auth::{bearer_token, AdminAuth};
pub use clock::{ManualClock, SystemClock};
pub use contact::ContactService;
pub use content::MAX_IMAGES;
pub use events::EventService;
pub use rate_limit::LoginRateLimiter;
pub use session::{SessionStatus, SessionStore};

use std::sync::Arc;

use services::{AdminAuth, AnnouncementService, ContactService, EventService};

/// Shared across all request handlers. Cloning is cheap.
#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<AdminAuth>,
    pub events: Arc<EventService>,
    pub announcements: Arc<AnnouncementService>,
    pub contact: Arc<ContactService>,
}

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub unread: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub broadcast: bool,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::notification::Notification> for NotificationResponse {
    fn from(n: crate::models::notification::Notification) -> Self {
        Self {
            id: n.id,
            title: n.title,
            message: n.message,
            is_read: n.is_read,
            broadcast: n.user_id.is_none(),
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

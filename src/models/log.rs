use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct ActivityLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub level: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

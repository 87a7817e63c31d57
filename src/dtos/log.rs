use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

pub const DEFAULT_LOG_LIMIT: i64 = 100;
pub const MAX_LOG_LIMIT: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub level: Option<String>,
    pub entity_type: Option<String>,
    pub limit: Option<i64>,
}

impl LogQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
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

impl From<crate::models::log::ActivityLog> for LogResponse {
    fn from(log: crate::models::log::ActivityLog) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            user_email: log.user_email,
            level: log.level,
            action: log.action,
            entity_type: log.entity_type,
            entity_id: log.entity_id,
            message: log.message,
            created_at: log.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(LogQuery::default().limit(), DEFAULT_LOG_LIMIT);
        assert_eq!(LogQuery { limit: Some(10_000), ..Default::default() }.limit(), MAX_LOG_LIMIT);
        assert_eq!(LogQuery { limit: Some(0), ..Default::default() }.limit(), 1);
    }
}

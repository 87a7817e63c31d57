// src/activity.rs
// Server side writers for the append-only activity log and user notifications.
use sqlx::PgExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(LogLevel::Info),
            "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry<'a> {
    pub user_id: Option<i64>,
    pub level: LogLevel,
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: Option<i64>,
    pub message: String,
}

impl<'a> LogEntry<'a> {
    pub fn info(user_id: i64, action: &'a str, entity_type: &'a str, entity_id: i64, message: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            level: LogLevel::Info,
            action,
            entity_type,
            entity_id: Some(entity_id),
            message: message.into(),
        }
    }
}

pub async fn record<'e, E>(executor: E, entry: LogEntry<'_>) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    tracing::debug!(action = entry.action, entity = entry.entity_type, id = ?entry.entity_id, "activity");
    sqlx::query(
        "INSERT INTO activity_logs (user_id, level, action, entity_type, entity_id, message)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(entry.user_id)
    .bind(entry.level.as_str())
    .bind(entry.action)
    .bind(entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.message)
    .execute(executor)
    .await?;
    Ok(())
}

/// `user_id = None` broadcasts to every user.
pub async fn notify<'e, E>(executor: E, user_id: Option<i64>, title: &str, message: &str) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query("INSERT INTO notifications (user_id, title, message) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(title)
        .bind(message)
        .execute(executor)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("debug"), None);
        assert_eq!(LogLevel::Error.as_str(), "error");
    }

    #[test]
    fn test_info_entry() {
        let e = LogEntry::info(3, "create", "category", 9, "Created category Tea");
        assert_eq!(e.user_id, Some(3));
        assert_eq!(e.entity_id, Some(9));
        assert_eq!(e.level, LogLevel::Info);
    }
}

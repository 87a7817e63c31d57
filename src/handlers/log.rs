use axum::{
    extract::{Query, State},
    Json,
};
use sqlx::{Postgres, QueryBuilder};
use tracing::instrument;

use crate::activity::LogLevel;
use crate::dtos::log::{LogQuery, LogResponse};
use crate::error::AppError;
use crate::models::log::ActivityLog;
use crate::state::AppState;

// GET /logs?level=&entity_type=&limit=
#[instrument(skip(state))]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<LogResponse>>, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT l.id, l.user_id, u.email AS user_email, l.level, l.action, l.entity_type,
                l.entity_id, l.message, l.created_at
         FROM activity_logs l
         LEFT JOIN users u ON u.id = l.user_id
         WHERE TRUE",
    );

    if let Some(level) = query.level.as_deref() {
        let level = LogLevel::parse(level)
            .ok_or_else(|| AppError::validation(format!("Unknown log level '{level}'")))?;
        builder.push(" AND l.level = ").push_bind(level.as_str());
    }
    if let Some(entity_type) = query.entity_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        builder.push(" AND l.entity_type = ").push_bind(entity_type.to_string());
    }
    builder
        .push(" ORDER BY l.created_at DESC, l.id DESC LIMIT ")
        .push_bind(query.limit());

    let logs = builder.build_query_as::<ActivityLog>().fetch_all(&state.db_pool).await?;
    Ok(Json(logs.into_iter().map(LogResponse::from).collect()))
}

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use crate::dtos::notification::{MarkReadResponse, NotificationQuery, NotificationResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::notification::Notification;
use crate::state::AppState;

// Read state is per reader: `is_read` is whether this user has a row in notification_reads.
fn visible_to(builder: &mut QueryBuilder<'_, Postgres>, user_id: i64) {
    builder
        .push(
            "SELECT n.id, n.user_id, n.title, n.message, (r.user_id IS NOT NULL) AS is_read, n.created_at
             FROM notifications n
             LEFT JOIN notification_reads r ON r.notification_id = n.id AND r.user_id = ",
        )
        .push_bind(user_id)
        .push(" WHERE (n.user_id IS NULL OR n.user_id = ")
        .push_bind(user_id)
        .push(")");
}

pub(crate) async fn unread_count(db_pool: &PgPool, user_id: i64) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*)::BIGINT
         FROM notifications n
         WHERE (n.user_id IS NULL OR n.user_id = $1)
           AND NOT EXISTS (
               SELECT 1 FROM notification_reads r
               WHERE r.notification_id = n.id AND r.user_id = $1
           )",
    )
    .bind(user_id)
    .fetch_one(db_pool)
    .await?;
    Ok(count)
}

// GET /notifications?unread=
#[instrument(skip(db_pool, auth))]
pub async fn list_notifications(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("");
    visible_to(&mut builder, auth.user_id);
    if query.unread == Some(true) {
        builder.push(" AND r.user_id IS NULL");
    }
    builder.push(" ORDER BY n.created_at DESC, n.id DESC");

    let rows = builder.build_query_as::<Notification>().fetch_all(&db_pool).await?;
    Ok(Json(rows.into_iter().map(NotificationResponse::from).collect()))
}

// PATCH /notifications/{id}/read
#[instrument(skip(db_pool, auth))]
pub async fn mark_read(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<NotificationResponse>, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("");
    visible_to(&mut builder, auth.user_id);
    builder.push(" AND n.id = ").push_bind(id);

    let mut row = builder
        .build_query_as::<Notification>()
        .fetch_optional(&db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Notification not found"))?;

    sqlx::query(
        "INSERT INTO notification_reads (notification_id, user_id) VALUES ($1, $2)
         ON CONFLICT DO NOTHING",
    )
    .bind(id)
    .bind(auth.user_id)
    .execute(&db_pool)
    .await?;

    row.is_read = true;
    Ok(Json(row.into()))
}

// POST /notifications/read-all
#[instrument(skip(db_pool, auth))]
pub async fn mark_all_read(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let result = sqlx::query(
        "INSERT INTO notification_reads (notification_id, user_id)
         SELECT n.id, $1 FROM notifications n
         WHERE n.user_id IS NULL OR n.user_id = $1
         ON CONFLICT DO NOTHING",
    )
    .bind(auth.user_id)
    .execute(&db_pool)
    .await?;

    Ok(Json(MarkReadResponse { updated: result.rows_affected() }))
}

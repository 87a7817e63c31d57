use axum::{
    extract::{Path, State},
    Extension, Json,
};
use http::StatusCode;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::activity::{self, LogEntry};
use crate::auth::jwt::{sign_token, TOKEN_TTL_HOURS};
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::config::Config;
use crate::dtos::common::required_text;
use crate::dtos::user::{normalize_email, CreateUserRequest, LoginRequest, LoginResponse, UpdateUserRequest, UserResponse};
use crate::error::{map_constraint, AppError};
use crate::middleware::auth::{AuthContext, ADMIN_ROLE};
use crate::models::user::User;
use crate::state::AppState;

const SELECT_USER: &str = "SELECT u.id, u.first_name, u.last_name, u.email, u.password_hash,
        u.role_id, r.name AS role_name, u.is_active, u.created_at
     FROM users u
     JOIN roles r ON r.id = u.role_id";

const DUPLICATE_EMAIL: &str = "Email already registered";
const UNKNOWN_ROLE: &str = "Role does not exist";

async fn fetch_user(db_pool: &PgPool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE u.id = $1"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

fn email_or_err(raw: &str) -> Result<String, AppError> {
    normalize_email(raw).ok_or_else(|| AppError::validation("A valid email is required"))
}

// POST /auth/login
pub async fn login_user(
    State(AppState { db_pool, config }): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = email_or_err(&payload.email)?;
    if payload.password.is_empty() {
        return Err(AppError::validation("Password required"));
    }

    let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE u.email = $1"))
        .bind(&email)
        .fetch_optional(&db_pool)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_active {
        return Err(AppError::forbidden("User inactive"));
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = user.id, "Failed login attempt");
        return Err(AppError::Unauthorized);
    }

    let token = sign_token(user.id, &user.role_name, &user.email, &config.jwt_secret)?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: (TOKEN_TTL_HOURS * 60 * 60) as usize,
        user: user.into(),
    }))
}

// GET /auth/me
pub async fn get_me(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(fetch_user(&db_pool, auth.user_id).await?.into()))
}

// GET /users
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = sqlx::query_as::<_, User>(&format!("{SELECT_USER} ORDER BY u.last_name, u.first_name"))
        .fetch_all(&state.db_pool)
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

// GET /users/{id}
#[instrument(skip(state))]
pub async fn get_user(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(fetch_user(&state.db_pool, id).await?.into()))
}

// POST /users
#[instrument(skip(db_pool, auth, payload))]
pub async fn create_user(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    auth.require_admin("create users")?;

    let first_name = required_text(&payload.first_name, "First name")?;
    let last_name = required_text(&payload.last_name, "Last name")?;
    let email = email_or_err(&payload.email)?;
    validate_password(&payload.password)?;
    let password_hash = hash_password(&payload.password)?;

    let mut tx = db_pool.begin().await?;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (first_name, last_name, email, password_hash, role_id, is_active)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(&first_name)
    .bind(&last_name)
    .bind(&email)
    .bind(&password_hash)
    .bind(payload.role)
    .bind(payload.is_active)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_constraint(e, DUPLICATE_EMAIL, UNKNOWN_ROLE))?;

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "create", "user", id, format!("Created user {email}"))).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(fetch_user(&db_pool, id).await?.into())))
}

// PUT /users/{id}
#[instrument(skip(db_pool, auth, payload))]
pub async fn update_user(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth.require_admin("update users")?;

    let first_name = payload.first_name.as_deref().map(|n| required_text(n, "First name")).transpose()?;
    let last_name = payload.last_name.as_deref().map(|n| required_text(n, "Last name")).transpose()?;
    let email = payload.email.as_deref().map(email_or_err).transpose()?;
    let password_hash = match payload.password.as_deref() {
        Some(p) => {
            validate_password(p)?;
            Some(hash_password(p)?)
        }
        None => None,
    };
    if id == auth.user_id && payload.is_active == Some(false) {
        return Err(AppError::validation("You cannot deactivate your own account"));
    }

    let mut tx = db_pool.begin().await?;
    sqlx::query_scalar::<_, i64>(
        "UPDATE users SET
         first_name = COALESCE($1, first_name),
         last_name = COALESCE($2, last_name),
         email = COALESCE($3, email),
         password_hash = COALESCE($4, password_hash),
         role_id = COALESCE($5, role_id),
         is_active = COALESCE($6, is_active)
         WHERE id = $7 RETURNING id",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(password_hash)
    .bind(payload.role)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| map_constraint(e, DUPLICATE_EMAIL, UNKNOWN_ROLE))?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "update", "user", id, "Updated user")).await?;
    tx.commit().await?;

    Ok(Json(fetch_user(&db_pool, id).await?.into()))
}

// DELETE /users/{id}
#[instrument(skip(db_pool, auth))]
pub async fn delete_user(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_admin("delete users")?;
    if id == auth.user_id {
        return Err(AppError::validation("You cannot delete your own account"));
    }

    let mut tx = db_pool.begin().await?;
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *tx).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("User not found"));
    }

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "delete", "user", id, "Deleted user")).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates the first admin from `ADMIN_EMAIL`/`ADMIN_PASSWORD` on an empty users table.
pub async fn seed_admin(db_pool: &PgPool, config: &Config) -> Result<(), AppError> {
    let (Some(raw_email), Some(password)) = (config.admin_email.as_deref(), config.admin_password.as_deref()) else {
        return Ok(());
    };

    let has_users = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users)")
        .fetch_one(db_pool)
        .await?;
    if has_users {
        return Ok(());
    }

    let email = email_or_err(raw_email)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    sqlx::query(
        "INSERT INTO users (first_name, last_name, email, password_hash, role_id)
         SELECT 'Admin', '', $1, $2, id FROM roles WHERE name = $3",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(ADMIN_ROLE)
    .execute(db_pool)
    .await?;

    info!(%email, "Seeded admin user");
    Ok(())
}

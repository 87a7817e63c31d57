use axum::{response::{Response, IntoResponse}};
use axum::extract::State;
use axum::middleware::Next;
use http::{header::AUTHORIZATION, Request, StatusCode};
use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::state::AppState;
use serde::Serialize;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: String,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    pub fn require_admin(&self, action: &str) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("Only admins can {action}")))
        }
    }
}

/// Current state of the token's user. Role and activity are read per request so that
/// deactivation, demotion and deletion take effect before the token expires.
#[derive(Debug, sqlx::FromRow)]
struct Account {
    role: String,
    is_active: bool,
}

#[derive(Serialize)]
struct ErrorBody { error: String, code: &'static str }

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_header = match req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => return unauthorized("Missing Authorization header"),
    };

    let token = match bearer_token(auth_header) {
        Some(t) => t,
        None => return unauthorized("Invalid Authorization format"),
    };

    let claims = match verify_token(token, &state.config.jwt_secret) {
        Ok(c) => c,
        Err(e) => return unauthorized(&e.to_string()),
    };

    let account = sqlx::query_as::<_, Account>(
        "SELECT r.name AS role, u.is_active
         FROM users u
         JOIN roles r ON r.id = u.role_id
         WHERE u.id = $1",
    )
    .bind(claims.sub)
    .fetch_optional(&state.db_pool)
    .await;

    let ctx = match account {
        Ok(account) => match authorize(claims.sub, account) {
            Ok(ctx) => ctx,
            Err(res) => return res,
        },
        Err(e) => return AppError::db(e).into_response(),
    };

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

fn authorize(user_id: i64, account: Option<Account>) -> Result<AuthContext, Response> {
    match account {
        None => Err(unauthorized("User no longer exists")),
        Some(a) if !a.is_active => Err(reject(StatusCode::FORBIDDEN, "forbidden", "User inactive")),
        Some(a) => Ok(AuthContext { user_id, role: a.role }),
    }
}

/// Expects "Bearer <token>".
fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn unauthorized(msg: &str) -> Response {
    reject(StatusCode::UNAUTHORIZED, "unauthorized", msg)
}

fn reject(status: StatusCode, code: &'static str, msg: &str) -> Response {
    let body = axum::Json(ErrorBody { error: msg.to_string(), code });
    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(role: &str, is_active: bool) -> Option<Account> {
        Some(Account { role: role.into(), is_active })
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_require_admin() {
        let admin = AuthContext { user_id: 1, role: "admin".into() };
        let staff = AuthContext { user_id: 2, role: "staff".into() };
        assert!(admin.require_admin("delete users").is_ok());
        let err = staff.require_admin("delete users").unwrap_err();
        assert_eq!(err.to_string(), "Only admins can delete users");
    }

    #[test]
    fn test_authorize_uses_current_role() {
        // token was issued while the user was still an admin
        let ctx = authorize(4, account("staff", true)).unwrap();
        assert_eq!(ctx.user_id, 4);
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_authorize_rejects_inactive_and_deleted_users() {
        let res = authorize(4, account("admin", false)).unwrap_err();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let res = authorize(4, None).unwrap_err();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

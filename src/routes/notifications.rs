use axum::{Router, routing::{get, patch, post}, middleware};
use crate::state::AppState;
use crate::handlers::notification::{list_notifications, mark_read, mark_all_read};
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}/read", patch(mark_read))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

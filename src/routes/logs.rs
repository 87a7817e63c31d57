use axum::{Router, routing::get, middleware};
use crate::state::AppState;
use crate::handlers::log::list_logs;
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/logs", get(list_logs))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

use axum::{Router, routing::get, middleware};
use crate::state::AppState;
use crate::handlers::dashboard::get_summary;
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard/summary", get(get_summary))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

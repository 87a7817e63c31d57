use axum::{Router, routing::{get, put}, middleware};
use crate::state::AppState;
use crate::handlers::role::{list_roles, create_role, update_role};
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route("/roles/{id}", put(update_role))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

use axum::{Router, routing::{get, post}, middleware};
use crate::state::AppState;
use crate::handlers::pricing;
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    // no PUT: calculations are immutable once stored
    Router::new()
        .route("/pricing", get(pricing::list_pricing).post(pricing::create_pricing))
        .route("/pricing/preview", post(pricing::preview_pricing))
        .route("/pricing/{id}", get(pricing::get_pricing).delete(pricing::delete_pricing))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

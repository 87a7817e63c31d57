use axum::{Router, routing::{get, post}, middleware};
use crate::state::AppState;
use crate::handlers::shipping;
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/shippings", get(shipping::list_shippings).post(shipping::create_shipping))
        .route(
            "/shippings/{id}",
            get(shipping::get_shipping).put(shipping::update_shipping).delete(shipping::delete_shipping),
        )
        .route("/shippings/{id}/confirm-delivery", post(shipping::confirm_delivery))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

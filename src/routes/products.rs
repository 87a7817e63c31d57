use axum::{
    routing::{get, post, put},
    Router, middleware,
};
use crate::handlers::product::{
    get_products, get_product, create_product, update_product, delete_product
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/products", get(get_products))
        .route("/products/{id}", get(get_product));

    let protected = Router::new()
        .route("/products", post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .layer(middleware::from_fn_with_state(state, require_auth));

    open.merge(protected)
}

use axum::{Router, routing::{get, post, put}, middleware};
use crate::state::AppState;
use crate::handlers::category::{
    list_categories, get_category, create_category, update_category, delete_category,
};
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{id}", get(get_category));

    let protected = Router::new()
        .route("/categories", post(create_category))
        .route("/categories/{id}", put(update_category).delete(delete_category))
        .layer(middleware::from_fn_with_state(state, require_auth));

    open.merge(protected)
}

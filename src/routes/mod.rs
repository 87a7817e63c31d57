pub mod categories;
pub mod dashboard;
pub mod logs;
pub mod notifications;
pub mod pricing;
pub mod products;
pub mod roles;
pub mod shippings;
pub mod users;

use axum::Router;
use crate::state::AppState;

/// Every protected router re-reads the caller's account through `state`.
pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(categories::routes(state.clone()))
        .merge(products::routes(state.clone()))
        .merge(shippings::routes(state.clone()))
        .merge(pricing::routes(state.clone()))
        .merge(users::routes(state.clone()))
        .merge(roles::routes(state.clone()))
        .merge(logs::routes(state.clone()))
        .merge(notifications::routes(state.clone()))
        .merge(dashboard::routes(state))
}

use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use catalog_cell::router::catalog_routes;
use directory_cell::router::directory_routes;
use scheduling_cell::router::scheduling_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Sourire booking API is running!" }))
        .nest("/planning", scheduling_routes(state.clone()))
        .nest("/annuaire", directory_routes(state.clone()))
        .nest("/catalogue", catalog_routes(state))
}

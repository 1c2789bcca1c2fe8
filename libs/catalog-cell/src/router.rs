use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::session_middleware;

use crate::handlers;
use crate::services::CatalogState;

pub fn catalog_routes(config: Arc<AppConfig>) -> Router {
    let state = Arc::new(CatalogState::new(config.clone()));

    // Reading the catalog is public; writing requires a dentist session.
    let public_routes = Router::new()
        .route("/services-medicaux", get(handlers::list_services))
        .route("/services-medicaux/devis", post(handlers::devis))
        .route("/publications", get(handlers::list_publications));

    let protected_routes = Router::new()
        .route("/services-medicaux", post(handlers::create_service))
        .route("/publications", post(handlers::create_publication))
        .layer(middleware::from_fn_with_state(config, session_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

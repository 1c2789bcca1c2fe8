use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::session_middleware;

use crate::handlers;
use crate::services::DirectoryState;

pub fn directory_routes(config: Arc<AppConfig>) -> Router {
    let state = Arc::new(DirectoryState::new(config.clone()));

    let protected_routes = Router::new()
        .route("/dentistes", get(handlers::list_dentistes))
        .route("/dentistes/{id}", get(handlers::get_dentiste))
        .route("/patients/{id}", get(handlers::get_patient))
        .route("/tableau-de-bord", get(handlers::tableau_de_bord))
        .layer(middleware::from_fn_with_state(config, session_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

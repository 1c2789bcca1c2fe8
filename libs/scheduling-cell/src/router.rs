use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::session_middleware;

use crate::handlers;
use crate::services::SchedulingState;

pub fn scheduling_routes(config: Arc<AppConfig>) -> Router {
    let state = Arc::new(SchedulingState::new(config.clone()));

    // Every scheduling operation runs under a validated session.
    let protected_routes = Router::new()
        .route("/disponibilites", get(handlers::get_disponibilites))
        // Booking drafts
        .route("/brouillons", post(handlers::create_brouillon))
        .route("/brouillons/{id}", get(handlers::get_brouillon))
        .route("/brouillons/{id}", delete(handlers::delete_brouillon))
        .route("/brouillons/{id}/dentiste", put(handlers::set_dentiste))
        .route("/brouillons/{id}/date", put(handlers::set_date))
        .route("/brouillons/{id}/creneau", put(handlers::select_creneau))
        .route("/brouillons/{id}/services", put(handlers::set_services))
        .route("/brouillons/{id}/notes", put(handlers::set_notes))
        .route("/brouillons/{id}/confirmer", post(handlers::confirmer_brouillon))
        // Appointment lifecycle
        .route("/rendezvous/{id}/confirmer", post(handlers::confirmer_rendezvous))
        .route("/rendezvous/{id}/terminer", post(handlers::terminer_rendezvous))
        .route("/rendezvous/{id}/annuler", post(handlers::annuler_rendezvous))
        .route("/rendezvous/{id}/statut", put(handlers::set_statut_rendezvous))
        .layer(middleware::from_fn_with_state(config, session_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

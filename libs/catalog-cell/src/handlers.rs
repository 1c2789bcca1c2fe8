use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};

use shared_models::error::AppError;
use shared_models::session::SessionContext;

use crate::models::{
    CreatePublicationRequest, CreateServiceRequest, DevisRequest, DevisResponse, Publication,
    ServiceMedical,
};
use crate::services::CatalogState;

#[axum::debug_handler]
pub async fn list_services(
    State(state): State<Arc<CatalogState>>,
) -> Result<Json<Vec<ServiceMedical>>, AppError> {
    let services = state
        .catalog
        .list_services()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    Ok(Json(services))
}

#[axum::debug_handler]
pub async fn create_service(
    State(state): State<Arc<CatalogState>>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<ServiceMedical>, AppError> {
    require_dentiste(&session)?;

    if request.nom.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Le nom du service est requis".to_string(),
        ));
    }

    let service = state
        .catalog
        .create_service(request)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    Ok(Json(service))
}

#[axum::debug_handler]
pub async fn list_publications(
    State(state): State<Arc<CatalogState>>,
) -> Result<Json<Vec<Publication>>, AppError> {
    let publications = state
        .catalog
        .list_publications()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    Ok(Json(publications))
}

#[axum::debug_handler]
pub async fn create_publication(
    State(state): State<Arc<CatalogState>>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<CreatePublicationRequest>,
) -> Result<Json<Publication>, AppError> {
    require_dentiste(&session)?;

    if request.titre.trim().is_empty() || request.contenu.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Titre et contenu sont requis".to_string(),
        ));
    }

    let publication = state
        .catalog
        .create_publication(request)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    Ok(Json(publication))
}

#[axum::debug_handler]
pub async fn devis(
    State(state): State<Arc<CatalogState>>,
    Json(request): Json<DevisRequest>,
) -> Result<Json<DevisResponse>, AppError> {
    let quote = state
        .catalog
        .quote(&request.services)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    Ok(Json(quote))
}

fn require_dentiste(session: &SessionContext) -> Result<(), AppError> {
    if session.subject.is_dentiste() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Réservé aux dentistes".to_string()))
    }
}

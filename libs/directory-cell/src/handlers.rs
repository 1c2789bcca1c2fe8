use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use shared_models::error::AppError;
use shared_models::session::SessionContext;

use crate::models::{Dentiste, Patient};
use crate::services::DirectoryState;

#[derive(Debug, Deserialize)]
pub struct DentisteSearchQuery {
    pub q: Option<String>,
}

#[axum::debug_handler]
pub async fn list_dentistes(
    State(state): State<Arc<DirectoryState>>,
    Extension(_session): Extension<SessionContext>,
    Query(params): Query<DentisteSearchQuery>,
) -> Result<Json<Vec<Dentiste>>, AppError> {
    let dentistes = state
        .directory
        .list_dentistes(params.q.as_deref())
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    Ok(Json(dentistes))
}

#[axum::debug_handler]
pub async fn get_dentiste(
    State(state): State<Arc<DirectoryState>>,
    Extension(_session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> Result<Json<Dentiste>, AppError> {
    let dentiste = state
        .directory
        .get_dentiste(id)
        .await
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    Ok(Json(dentiste))
}

/// Patients may read only their own record; dentists may read any.
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<DirectoryState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> Result<Json<Patient>, AppError> {
    let allowed = session.subject.is_dentiste() || session.subject.patient_id() == Some(id);
    if !allowed {
        return Err(AppError::Forbidden(
            "Ce dossier appartient à un autre patient".to_string(),
        ));
    }

    let patient = state
        .directory
        .get_patient(id)
        .await
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    Ok(Json(patient))
}

/// Role-aware dashboard: dentists get their appointment book with patient
/// records and stat tiles, patients get their appointments and the latest
/// publications.
#[axum::debug_handler]
pub async fn tableau_de_bord(
    State(state): State<Arc<DirectoryState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Value>, AppError> {
    if let Some(dentiste_id) = session.subject.dentiste_id() {
        let dashboard = state
            .dashboard
            .dentiste_dashboard(dentiste_id)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        return Ok(Json(serde_json::to_value(dashboard).map_err(|e| {
            AppError::Internal(e.to_string())
        })?));
    }

    if let Some(patient_id) = session.subject.patient_id() {
        let dashboard = state
            .dashboard
            .patient_dashboard(patient_id)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        return Ok(Json(serde_json::to_value(dashboard).map_err(|e| {
            AppError::Internal(e.to_string())
        })?));
    }

    Err(AppError::Forbidden("Session sans rôle reconnu".to_string()))
}

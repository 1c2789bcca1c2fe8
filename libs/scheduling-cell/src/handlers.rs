use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::session::SessionContext;

use crate::models::{AppointmentStatus, BookingDraft, BookingError, DayAvailability};
use crate::services::SchedulingState;

// ==============================================================================
// QUERY & BODY STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct DisponibilitesQuery {
    #[serde(rename = "dentisteId")]
    pub dentiste_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SetDentisteRequest {
    #[serde(rename = "dentisteId")]
    pub dentiste_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetDateRequest {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SelectSlotRequest {
    #[serde(rename = "heureRv")]
    pub heure: String,
}

#[derive(Debug, Deserialize)]
pub struct SetServicesRequest {
    pub services: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetNotesRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatutRequest {
    #[serde(rename = "statutRv")]
    pub statut: AppointmentStatus,
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

/// Day availability for a dentist, independent of any draft. Holds from
/// in-progress drafts are overlaid so two patients browsing at once see
/// each other's picks.
#[axum::debug_handler]
pub async fn get_disponibilites(
    State(state): State<Arc<SchedulingState>>,
    Extension(_session): Extension<SessionContext>,
    Query(params): Query<DisponibilitesQuery>,
) -> Result<Json<DayAvailability>, AppError> {
    let mut day = state
        .availability
        .day_availability(params.dentiste_id, params.date)
        .await;

    if let (Some(dentiste_id), Some(date)) = (params.dentiste_id, params.date) {
        let held = state.holds.held_times(dentiste_id, date, None);
        crate::services::slots::apply_held(&mut day.slots, &held);
    }

    Ok(Json(day))
}

// ==============================================================================
// BOOKING DRAFTS (patient only)
// ==============================================================================

#[axum::debug_handler]
pub async fn create_brouillon(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<BookingDraft>, AppError> {
    let patient_id = require_patient(&session)?;
    Ok(Json(state.drafts.create(patient_id)))
}

#[axum::debug_handler]
pub async fn get_brouillon(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDraft>, AppError> {
    let patient_id = require_patient(&session)?;
    let draft = state.drafts.get(id, patient_id).map_err(map_booking_error)?;
    Ok(Json(draft))
}

#[axum::debug_handler]
pub async fn delete_brouillon(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient_id = require_patient(&session)?;
    state
        .drafts
        .abandon(id, patient_id)
        .map_err(map_booking_error)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn set_dentiste(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetDentisteRequest>,
) -> Result<Json<BookingDraft>, AppError> {
    let patient_id = require_patient(&session)?;
    let draft = state
        .drafts
        .set_dentiste(id, patient_id, request.dentiste_id)
        .await
        .map_err(map_booking_error)?;
    Ok(Json(draft))
}

#[axum::debug_handler]
pub async fn set_date(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetDateRequest>,
) -> Result<Json<BookingDraft>, AppError> {
    let patient_id = require_patient(&session)?;
    let draft = state
        .drafts
        .set_date(id, patient_id, request.date)
        .await
        .map_err(map_booking_error)?;
    Ok(Json(draft))
}

#[axum::debug_handler]
pub async fn select_creneau(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectSlotRequest>,
) -> Result<Json<BookingDraft>, AppError> {
    let patient_id = require_patient(&session)?;
    let draft = state
        .drafts
        .select_slot(id, patient_id, &request.heure)
        .map_err(map_booking_error)?;
    Ok(Json(draft))
}

#[axum::debug_handler]
pub async fn set_services(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetServicesRequest>,
) -> Result<Json<BookingDraft>, AppError> {
    let patient_id = require_patient(&session)?;
    let draft = state
        .drafts
        .set_services(id, patient_id, request.services)
        .map_err(map_booking_error)?;
    Ok(Json(draft))
}

#[axum::debug_handler]
pub async fn set_notes(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetNotesRequest>,
) -> Result<Json<BookingDraft>, AppError> {
    let patient_id = require_patient(&session)?;
    let draft = state
        .drafts
        .set_notes(id, patient_id, request.notes)
        .map_err(map_booking_error)?;
    Ok(Json(draft))
}

/// Submit the draft. Validation misses and backend rejections both come
/// back as 200 with the draft carrying its errors; the caller reads
/// `stage` and the error fields to decide what to show.
#[axum::debug_handler]
pub async fn confirmer_brouillon(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDraft>, AppError> {
    let patient_id = require_patient(&session)?;
    let draft = state
        .drafts
        .submit(id, patient_id)
        .await
        .map_err(map_booking_error)?;
    Ok(Json(draft))
}

// ==============================================================================
// APPOINTMENT LIFECYCLE (dentist only)
// ==============================================================================

#[axum::debug_handler]
pub async fn confirmer_rendezvous(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    transition(&state, &session, id, AppointmentStatus::Confirme).await
}

#[axum::debug_handler]
pub async fn terminer_rendezvous(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    transition(&state, &session, id, AppointmentStatus::Termine).await
}

#[axum::debug_handler]
pub async fn annuler_rendezvous(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    transition(&state, &session, id, AppointmentStatus::Annule).await
}

#[axum::debug_handler]
pub async fn set_statut_rendezvous(
    State(state): State<Arc<SchedulingState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
    Json(request): Json<SetStatutRequest>,
) -> Result<Json<Value>, AppError> {
    transition(&state, &session, id, request.statut).await
}

async fn transition(
    state: &SchedulingState,
    session: &SessionContext,
    rendezvous_id: i64,
    target: AppointmentStatus,
) -> Result<Json<Value>, AppError> {
    let dentiste_id = session
        .subject
        .dentiste_id()
        .ok_or_else(|| AppError::Forbidden("Réservé aux dentistes".to_string()))?;

    let updated = state
        .lifecycle
        .transition(dentiste_id, rendezvous_id, target)
        .await
        .map_err(map_booking_error)?;
    Ok(Json(updated))
}

// ==============================================================================
// HELPERS
// ==============================================================================

fn require_patient(session: &SessionContext) -> Result<i64, AppError> {
    session
        .subject
        .patient_id()
        .ok_or_else(|| AppError::Forbidden("Réservé aux patients".to_string()))
}

fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::DraftNotFound => AppError::NotFound("Brouillon introuvable".to_string()),
        BookingError::NotOwner => {
            AppError::Forbidden("Ce brouillon appartient à un autre patient".to_string())
        }
        BookingError::AppointmentNotFound => {
            AppError::NotFound("Rendez-vous introuvable".to_string())
        }
        BookingError::IllegalTransition { from, to } => AppError::BadRequest(format!(
            "Transition de statut invalide: {} vers {}",
            from, to
        )),
        BookingError::Backend(e) => AppError::Upstream(e.to_string()),
    }
}

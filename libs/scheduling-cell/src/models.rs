use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::services::slots;

// ==============================================================================
// APPOINTMENT STATUS
// ==============================================================================

/// Closed set of appointment statuses. The wire strings are the French
/// labels the clinic backend stores; adding a variant forces every match
/// below to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(rename = "Planifié")]
    Planifie,
    #[serde(rename = "Confirmé")]
    Confirme,
    #[serde(rename = "En cours")]
    EnCours,
    #[serde(rename = "Terminé")]
    Termine,
    #[serde(rename = "Annulé")]
    Annule,
}

impl AppointmentStatus {
    pub fn wire_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Planifie => "Planifié",
            AppointmentStatus::Confirme => "Confirmé",
            AppointmentStatus::EnCours => "En cours",
            AppointmentStatus::Termine => "Terminé",
            AppointmentStatus::Annule => "Annulé",
        }
    }

    /// Whether an appointment in this status blocks its time slot.
    /// Cancelled and completed appointments never do.
    pub fn occupies_slot(&self) -> bool {
        match self {
            AppointmentStatus::Planifie => true,
            AppointmentStatus::Confirme => true,
            AppointmentStatus::EnCours => true,
            AppointmentStatus::Termine => false,
            AppointmentStatus::Annule => false,
        }
    }

    pub fn badge(&self) -> StatusBadge {
        match self {
            AppointmentStatus::Planifie => StatusBadge::Warning,
            AppointmentStatus::Confirme => StatusBadge::Success,
            AppointmentStatus::EnCours => StatusBadge::Primary,
            AppointmentStatus::Termine => StatusBadge::Info,
            AppointmentStatus::Annule => StatusBadge::Danger,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_str())
    }
}

/// Display class for status badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBadge {
    Success,
    Warning,
    Primary,
    Info,
    Danger,
}

// ==============================================================================
// SLOTS & AVAILABILITY
// ==============================================================================

/// A 15-minute bookable window within business hours.
///
/// `available` and `is_occupied` are distinct on purpose: a slot held by
/// another in-progress draft is unavailable without being occupied by a
/// stored appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub time: String,
    pub available: bool,
    pub is_occupied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityStats {
    pub available: usize,
    pub occupied: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailability {
    pub slots: Vec<TimeSlot>,
    pub stats: AvailabilityStats,
}

// ==============================================================================
// EXTERNAL APPOINTMENT RECORD
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRef {
    #[serde(rename = "idP")]
    pub id: i64,
    #[serde(rename = "nomP", skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(rename = "prenomP", skip_serializing_if = "Option::is_none")]
    pub prenom: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DentisteRef {
    #[serde(rename = "idD")]
    pub id: i64,
    #[serde(rename = "nomD", skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(rename = "prenomD", skip_serializing_if = "Option::is_none")]
    pub prenom: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRef {
    #[serde(rename = "numSM")]
    pub id: i64,
    #[serde(rename = "nomSM", skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
}

/// Appointment as the clinic backend returns it. Read-only to this cell;
/// only date, time, dentist and status feed the availability calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rendezvous {
    #[serde(rename = "idRv", default)]
    pub id: Option<i64>,
    #[serde(rename = "dateRv", default)]
    pub date: Option<String>,
    #[serde(rename = "heureRv", default)]
    pub heure: Option<String>,
    #[serde(rename = "statutRv", default)]
    pub statut: Option<AppointmentStatus>,
    #[serde(rename = "detailsRv", default)]
    pub details: Option<String>,
    #[serde(rename = "idP", default)]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub patient: Option<PatientRef>,
    #[serde(default)]
    pub dentiste: Option<DentisteRef>,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
}

impl Rendezvous {
    /// `dateRv` stripped to its calendar-day part; the backend sometimes
    /// returns a full timestamp.
    pub fn date_key(&self) -> Option<&str> {
        self.date
            .as_deref()
            .map(|raw| raw.split('T').next().unwrap_or(raw))
    }

    pub fn normalized_time(&self) -> Option<String> {
        self.heure.as_deref().and_then(slots::normalize_time)
    }

    /// Patient id, whether it comes flattened or nested on the wire.
    pub fn patient_key(&self) -> Option<i64> {
        self.patient_id.or_else(|| self.patient.as_ref().map(|p| p.id))
    }
}

// ==============================================================================
// BOOKING DRAFT
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftStage {
    Idle,
    DentistSelected,
    DateSelected,
    SlotSelected,
    ServicesSelected,
    Submitting,
    Success,
    Failed,
}

/// In-progress, unsaved booking state for one patient. Nothing here is
/// persisted; abandoning a draft has no server-side effect to undo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub id: Uuid,
    pub patient_id: i64,
    pub dentiste_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub heure: Option<String>,
    pub service_ids: Vec<i64>,
    pub notes: Option<String>,
    pub slots: Vec<TimeSlot>,
    pub stats: AvailabilityStats,
    pub field_errors: HashMap<String, String>,
    pub form_error: Option<String>,
    pub success_message: Option<String>,
    pub stage: DraftStage,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Draft not found")]
    DraftNotFound,

    #[error("Draft does not belong to this session")]
    NotOwner,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_wire_strings() {
        for status in [
            AppointmentStatus::Planifie,
            AppointmentStatus::Confirme,
            AppointmentStatus::EnCours,
            AppointmentStatus::Termine,
            AppointmentStatus::Annule,
        ] {
            let encoded = serde_json::to_string(&status).unwrap();
            assert_eq!(encoded, format!("\"{}\"", status.wire_str()));
            let decoded: AppointmentStatus = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, status);
        }
    }

    #[test]
    fn cancelled_and_completed_do_not_occupy() {
        assert!(AppointmentStatus::Planifie.occupies_slot());
        assert!(AppointmentStatus::Confirme.occupies_slot());
        assert!(AppointmentStatus::EnCours.occupies_slot());
        assert!(!AppointmentStatus::Termine.occupies_slot());
        assert!(!AppointmentStatus::Annule.occupies_slot());
    }

    #[test]
    fn date_key_strips_timestamp_part() {
        let rdv: Rendezvous =
            serde_json::from_value(serde_json::json!({ "dateRv": "2024-06-01T00:00:00" }))
                .unwrap();
        assert_eq!(rdv.date_key(), Some("2024-06-01"));
    }

    #[test]
    fn patient_key_prefers_flattened_id() {
        let rdv: Rendezvous = serde_json::from_value(serde_json::json!({
            "idP": 9,
            "patient": { "idP": 4 }
        }))
        .unwrap();
        assert_eq!(rdv.patient_key(), Some(9));

        let nested: Rendezvous =
            serde_json::from_value(serde_json::json!({ "patient": { "idP": 4 } })).unwrap();
        assert_eq!(nested.patient_key(), Some(4));
    }
}

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_gateway::ClinicClient;

use crate::models::{AppointmentStatus, BookingDraft, BookingError, DraftStage};
use crate::services::availability::AvailabilityService;
use crate::services::holds::{HoldStore, SlotKey};
use crate::services::slots;

// Field-level messages, worded as the booking form shows them.
const MSG_SLOT_LOST: &str = "Le créneau sélectionné n'est plus disponible";
const MSG_SLOT_UNAVAILABLE: &str =
    "Ce créneau n'est pas disponible. Veuillez en choisir un autre.";
const MSG_PICK_DENTIST_AND_DATE: &str = "Sélectionnez d'abord un dentiste et une date";
const MSG_DATE_REQUIRED: &str = "La date est requise";
const MSG_TIME_REQUIRED: &str = "L'heure est requise";
const MSG_DENTIST_REQUIRED: &str = "Veuillez sélectionner un dentiste";
const MSG_SERVICES_REQUIRED: &str = "Veuillez sélectionner au moins un service médical";
const MSG_BOOKED: &str = "Rendez-vous créé avec succès !";

/// Owns every in-progress booking draft and drives the form state machine:
/// Idle → DentistSelected → DateSelected → SlotSelected → ServicesSelected
/// → Submitting → Success | Failed.
pub struct DraftStore {
    drafts: RwLock<HashMap<Uuid, BookingDraft>>,
    availability: AvailabilityService,
    holds: Arc<HoldStore>,
    gateway: ClinicClient,
}

impl DraftStore {
    pub fn new(gateway: ClinicClient, holds: Arc<HoldStore>) -> Self {
        Self {
            drafts: RwLock::new(HashMap::new()),
            availability: AvailabilityService::new(gateway.clone()),
            holds,
            gateway,
        }
    }

    pub fn create(&self, patient_id: i64) -> BookingDraft {
        let template = slots::daily_template();
        let stats = slots::stats_of(&template);

        let draft = BookingDraft {
            id: Uuid::new_v4(),
            patient_id,
            dentiste_id: None,
            date: None,
            heure: None,
            service_ids: Vec::new(),
            notes: None,
            slots: template,
            stats,
            field_errors: HashMap::new(),
            form_error: None,
            success_message: None,
            stage: DraftStage::Idle,
        };

        let mut map = self.lock_write();
        map.insert(draft.id, draft.clone());
        debug!("Created booking draft {} for patient {}", draft.id, patient_id);
        draft
    }

    pub fn get(&self, id: Uuid, patient_id: i64) -> Result<BookingDraft, BookingError> {
        let map = self.drafts.read().unwrap_or_else(|e| e.into_inner());
        let draft = map.get(&id).ok_or(BookingError::DraftNotFound)?;
        if draft.patient_id != patient_id {
            return Err(BookingError::NotOwner);
        }
        Ok(draft.clone())
    }

    /// Drop a draft. No reservation exists server-side, so abandoning only
    /// needs to free the local hold.
    pub fn abandon(&self, id: Uuid, patient_id: i64) -> Result<(), BookingError> {
        let mut map = self.lock_write();
        match map.get(&id) {
            None => return Err(BookingError::DraftNotFound),
            Some(draft) if draft.patient_id != patient_id => return Err(BookingError::NotOwner),
            Some(_) => {}
        }
        map.remove(&id);
        drop(map);
        self.holds.release_owner(id);
        debug!("Abandoned booking draft {}", id);
        Ok(())
    }

    pub async fn set_dentiste(
        &self,
        id: Uuid,
        patient_id: i64,
        dentiste_id: Option<i64>,
    ) -> Result<BookingDraft, BookingError> {
        {
            let mut map = self.lock_write();
            let draft = Self::owned_mut(&mut map, id, patient_id)?;
            if draft.dentiste_id != dentiste_id {
                draft.dentiste_id = dentiste_id;
                // Clearing the dentist also discards the chosen time.
                if dentiste_id.is_none() {
                    draft.heure = None;
                }
            }
            draft.field_errors.remove("dentiste");
            draft.success_message = None;
            draft.form_error = None;
        }
        self.recompute(id).await
    }

    pub async fn set_date(
        &self,
        id: Uuid,
        patient_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<BookingDraft, BookingError> {
        {
            let mut map = self.lock_write();
            let draft = Self::owned_mut(&mut map, id, patient_id)?;
            draft.date = date;
            // Clearing the date discards the chosen time, as for the dentist.
            if date.is_none() {
                draft.heure = None;
            }
            draft.field_errors.remove("dateRv");
            draft.success_message = None;
            draft.form_error = None;
        }
        self.recompute(id).await
    }

    /// Pick a slot. Occupied or held slots are rejected locally with a
    /// field message; no backend call is made. A successful pick holds the
    /// slot against other drafts.
    pub fn select_slot(
        &self,
        id: Uuid,
        patient_id: i64,
        heure_raw: &str,
    ) -> Result<BookingDraft, BookingError> {
        let mut map = self.lock_write();
        let draft = Self::owned_mut(&mut map, id, patient_id)?;

        let Some(heure) = slots::normalize_time(heure_raw) else {
            draft
                .field_errors
                .insert("heureRv".to_string(), MSG_SLOT_UNAVAILABLE.to_string());
            return Ok(draft.clone());
        };

        let (Some(dentiste_id), Some(date)) = (draft.dentiste_id, draft.date) else {
            draft
                .field_errors
                .insert("heureRv".to_string(), MSG_PICK_DENTIST_AND_DATE.to_string());
            return Ok(draft.clone());
        };

        let selectable = draft
            .slots
            .iter()
            .find(|slot| slot.time == heure)
            .map(|slot| slot.available && !slot.is_occupied)
            .unwrap_or(false);

        if !selectable {
            draft
                .field_errors
                .insert("heureRv".to_string(), MSG_SLOT_UNAVAILABLE.to_string());
            return Ok(draft.clone());
        }

        let key = SlotKey {
            dentiste_id,
            date,
            heure: heure.clone(),
        };
        if !self.holds.acquire(key, draft.id) {
            // Another draft got there between recomputation and now. The
            // previous selection and its hold stay untouched.
            if let Some(slot) = draft.slots.iter_mut().find(|slot| slot.time == heure) {
                slot.available = false;
            }
            draft
                .field_errors
                .insert("heureRv".to_string(), MSG_SLOT_UNAVAILABLE.to_string());
            return Ok(draft.clone());
        }

        // New slot secured; only now let go of the previous one.
        if let Some(previous) = draft.heure.take() {
            if previous != heure {
                let previous_key = SlotKey {
                    dentiste_id,
                    date,
                    heure: previous,
                };
                self.holds.release(&previous_key, draft.id);
            }
        }

        draft.heure = Some(heure);
        draft.field_errors.remove("heureRv");
        draft.success_message = None;
        draft.stage = derived_stage(draft);
        Ok(draft.clone())
    }

    pub fn set_services(
        &self,
        id: Uuid,
        patient_id: i64,
        service_ids: Vec<i64>,
    ) -> Result<BookingDraft, BookingError> {
        let mut map = self.lock_write();
        let draft = Self::owned_mut(&mut map, id, patient_id)?;
        draft.service_ids = service_ids;
        draft.field_errors.remove("services");
        draft.success_message = None;
        draft.stage = derived_stage(draft);
        Ok(draft.clone())
    }

    pub fn set_notes(
        &self,
        id: Uuid,
        patient_id: i64,
        notes: Option<String>,
    ) -> Result<BookingDraft, BookingError> {
        let mut map = self.lock_write();
        let draft = Self::owned_mut(&mut map, id, patient_id)?;
        draft.notes = notes;
        Ok(draft.clone())
    }

    /// Re-derive the slot set from the backend for the draft's current
    /// (dentist, date). With either unset the template is restored without
    /// a fetch. A chosen time that has become occupied is cleared with a
    /// field message so a vanished slot cannot be submitted.
    pub async fn recompute(&self, id: Uuid) -> Result<BookingDraft, BookingError> {
        let snapshot = {
            let map = self.drafts.read().unwrap_or_else(|e| e.into_inner());
            let draft = map.get(&id).ok_or(BookingError::DraftNotFound)?;
            (draft.dentiste_id, draft.date)
        };

        let (Some(dentiste_id), Some(date)) = snapshot else {
            let mut map = self.lock_write();
            let draft = map.get_mut(&id).ok_or(BookingError::DraftNotFound)?;
            draft.slots = slots::daily_template();
            draft.stats = slots::stats_of(&draft.slots);
            self.holds.release_owner(draft.id);
            draft.stage = derived_stage(draft);
            return Ok(draft.clone());
        };

        let occupied = self.availability.occupied_times(dentiste_id, date).await;

        let mut map = self.lock_write();
        let draft = map.get_mut(&id).ok_or(BookingError::DraftNotFound)?;

        // The selection may have moved on while the fetch was in flight;
        // a response for a superseded (dentist, date) must not be applied.
        if draft.dentiste_id != Some(dentiste_id) || draft.date != Some(date) {
            debug!("Discarding stale availability response for draft {}", id);
            return Ok(draft.clone());
        }

        let mut day = slots::daily_template();
        slots::apply_occupied(&mut day, &occupied);
        let stats = slots::stats_of(&day);
        let held = self.holds.held_times(dentiste_id, date, Some(draft.id));
        slots::apply_held(&mut day, &held);
        draft.slots = day;
        draft.stats = stats;

        if let Some(heure) = draft.heure.clone() {
            if occupied.contains(&heure) || held.contains(&heure) {
                draft.heure = None;
                self.holds.release_owner(draft.id);
                draft
                    .field_errors
                    .insert("heureRv".to_string(), MSG_SLOT_LOST.to_string());
            } else {
                // Selection survived; refresh the hold under the new key.
                let key = SlotKey {
                    dentiste_id,
                    date,
                    heure,
                };
                self.holds.release_owner(draft.id);
                self.holds.acquire(key, draft.id);
            }
        }

        draft.stage = derived_stage(draft);
        Ok(draft.clone())
    }

    /// Validate and submit the draft to the backend. Success clears all
    /// draft state back toward Idle; failure preserves every field so the
    /// patient can retry without re-entering anything.
    pub async fn submit(&self, id: Uuid, patient_id: i64) -> Result<BookingDraft, BookingError> {
        let payload = {
            let mut map = self.lock_write();
            let draft = Self::owned_mut(&mut map, id, patient_id)?;

            let mut errors: HashMap<String, String> = HashMap::new();
            if draft.date.is_none() {
                errors.insert("dateRv".to_string(), MSG_DATE_REQUIRED.to_string());
            }
            if draft.heure.is_none() {
                errors.insert("heureRv".to_string(), MSG_TIME_REQUIRED.to_string());
            }
            if draft.dentiste_id.is_none() {
                errors.insert("dentiste".to_string(), MSG_DENTIST_REQUIRED.to_string());
            }
            if draft.service_ids.is_empty() {
                errors.insert("services".to_string(), MSG_SERVICES_REQUIRED.to_string());
            }
            if let Some(heure) = &draft.heure {
                let occupied = draft
                    .slots
                    .iter()
                    .any(|slot| &slot.time == heure && slot.is_occupied);
                if occupied {
                    errors.insert("heureRv".to_string(), MSG_SLOT_LOST.to_string());
                }
            }

            if !errors.is_empty() {
                draft.field_errors = errors;
                return Ok(draft.clone());
            }

            draft.field_errors.clear();
            draft.form_error = None;
            draft.success_message = None;
            draft.stage = DraftStage::Submitting;

            json!({
                "dateRv": draft.date.map(|d| d.format("%Y-%m-%d").to_string()),
                "heureRv": draft.heure,
                "detailsRv": draft.notes.clone().unwrap_or_default(),
                "statutRv": AppointmentStatus::Planifie.wire_str(),
                "patient": { "idP": draft.patient_id },
                "dentiste": { "idD": draft.dentiste_id },
                "services": draft
                    .service_ids
                    .iter()
                    .map(|num| json!({ "numSM": num }))
                    .collect::<Vec<_>>(),
            })
        };

        let result: Result<Value, anyhow::Error> = self
            .gateway
            .request(Method::POST, "/rendezvous/", Some(payload))
            .await;

        let mut map = self.lock_write();
        let draft = Self::owned_mut(&mut map, id, patient_id)?;

        match result {
            Ok(_) => {
                info!("Booking submitted for patient {} (draft {})", patient_id, id);
                self.holds.release_owner(draft.id);
                draft.dentiste_id = None;
                draft.date = None;
                draft.heure = None;
                draft.service_ids.clear();
                draft.notes = None;
                draft.slots = slots::daily_template();
                draft.stats = slots::stats_of(&draft.slots);
                draft.field_errors.clear();
                draft.form_error = None;
                draft.success_message = Some(MSG_BOOKED.to_string());
                draft.stage = DraftStage::Success;
            }
            Err(e) => {
                warn!("Booking submission failed for draft {}: {}", id, e);
                draft.stage = DraftStage::Failed;
                draft.form_error = Some(e.to_string());
            }
        }

        Ok(draft.clone())
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, BookingDraft>> {
        self.drafts.write().unwrap_or_else(|e| e.into_inner())
    }

    fn owned_mut<'a>(
        map: &'a mut HashMap<Uuid, BookingDraft>,
        id: Uuid,
        patient_id: i64,
    ) -> Result<&'a mut BookingDraft, BookingError> {
        let draft = map.get_mut(&id).ok_or(BookingError::DraftNotFound)?;
        if draft.patient_id != patient_id {
            return Err(BookingError::NotOwner);
        }
        Ok(draft)
    }
}

fn derived_stage(draft: &BookingDraft) -> DraftStage {
    match (draft.dentiste_id, draft.date) {
        (Some(_), Some(_)) => {
            if draft.heure.is_some() {
                if draft.service_ids.is_empty() {
                    DraftStage::SlotSelected
                } else {
                    DraftStage::ServicesSelected
                }
            } else {
                DraftStage::DateSelected
            }
        }
        (Some(_), None) => DraftStage::DentistSelected,
        _ => DraftStage::Idle,
    }
}

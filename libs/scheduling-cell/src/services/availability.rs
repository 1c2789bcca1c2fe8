use std::collections::HashSet;

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use shared_gateway::ClinicClient;

use crate::models::{DayAvailability, Rendezvous};
use crate::services::slots;

/// Computes the bookable slots of one dentist's day by reconciling the
/// fixed slot template against the appointments stored in the backend.
pub struct AvailabilityService {
    gateway: ClinicClient,
}

impl AvailabilityService {
    pub fn new(gateway: ClinicClient) -> Self {
        Self { gateway }
    }

    /// The set of `HH:MM` times already taken for the dentist on `date`.
    ///
    /// Any fetch or decode failure degrades to "no occupied times known":
    /// the booking flow must never hard-fail because availability could
    /// not be checked, and the backend still rejects true conflicts at
    /// submission time.
    pub async fn occupied_times(&self, dentiste_id: i64, date: NaiveDate) -> HashSet<String> {
        debug!("Loading occupied slots for dentiste {} on {}", dentiste_id, date);

        let path = format!("/rendezvous/dentiste/{}", dentiste_id);
        let raw: Vec<Value> = match self.gateway.request(Method::GET, &path, None).await {
            Ok(list) => list,
            Err(e) => {
                warn!("Availability lookup failed, treating all slots as free: {}", e);
                return HashSet::new();
            }
        };

        let date_key = date.format("%Y-%m-%d").to_string();

        raw.into_iter()
            .filter_map(|value| match serde_json::from_value::<Rendezvous>(value) {
                Ok(rdv) => Some(rdv),
                Err(e) => {
                    warn!("Skipping undecodable rendezvous: {}", e);
                    None
                }
            })
            .filter(|rdv| rdv.date_key() == Some(date_key.as_str()))
            // Missing status is treated as still planned, hence blocking.
            .filter(|rdv| rdv.statut.map_or(true, |statut| statut.occupies_slot()))
            .filter_map(|rdv| rdv.normalized_time())
            .collect()
    }

    /// Full day's slots for (dentist, date), occupied ones marked. With
    /// either input unset there is nothing to check: the untouched
    /// template comes back without a network call.
    pub async fn day_availability(
        &self,
        dentiste_id: Option<i64>,
        date: Option<NaiveDate>,
    ) -> DayAvailability {
        let mut slots = slots::daily_template();

        if let (Some(dentiste_id), Some(date)) = (dentiste_id, date) {
            let occupied = self.occupied_times(dentiste_id, date).await;
            slots::apply_occupied(&mut slots, &occupied);
        }

        let stats = slots::stats_of(&slots);
        DayAvailability { slots, stats }
    }
}

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_gateway::ClinicClient;

use crate::models::{AppointmentStatus, BookingError, Rendezvous};

/// Legal status moves. Terminé and Annulé are terminal.
pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::*;
    match (from, to) {
        (Planifie, Confirme) | (Planifie, Annule) => true,
        (Confirme, EnCours) | (Confirme, Termine) | (Confirme, Annule) => true,
        (EnCours, Termine) | (EnCours, Annule) => true,
        (Planifie, _) | (Confirme, _) | (EnCours, _) | (Termine, _) | (Annule, _) => false,
    }
}

/// Drives appointment status changes on behalf of a dentist. The current
/// status lives in the clinic backend, so every transition re-reads it
/// before deciding whether the move is legal.
pub struct LifecycleService {
    gateway: ClinicClient,
}

impl LifecycleService {
    pub fn new(gateway: ClinicClient) -> Self {
        Self { gateway }
    }

    pub async fn transition(
        &self,
        dentiste_id: i64,
        rendezvous_id: i64,
        target: AppointmentStatus,
    ) -> Result<Value, BookingError> {
        debug!(
            "Dentiste {} moving rendezvous {} to {}",
            dentiste_id, rendezvous_id, target
        );

        let path = format!("/rendezvous/dentiste/{}", dentiste_id);
        let list: Vec<Rendezvous> = self.gateway.request(Method::GET, &path, None).await?;

        let current = list
            .into_iter()
            .find(|rdv| rdv.id == Some(rendezvous_id))
            .ok_or(BookingError::AppointmentNotFound)?;

        // A record without a status has never moved past creation.
        let from = current.statut.unwrap_or(AppointmentStatus::Planifie);
        if !can_transition(from, target) {
            return Err(BookingError::IllegalTransition { from, to: target });
        }

        let updated = match target {
            AppointmentStatus::Confirme => {
                let path = format!("/rendezvous/{}/confirmer", rendezvous_id);
                self.gateway.request(Method::PUT, &path, None).await?
            }
            AppointmentStatus::Termine => {
                let path = format!("/rendezvous/{}/terminer", rendezvous_id);
                self.gateway.request(Method::PUT, &path, None).await?
            }
            AppointmentStatus::Annule => {
                let path = format!("/rendezvous/{}/annuler", rendezvous_id);
                self.gateway.request(Method::PUT, &path, None).await?
            }
            AppointmentStatus::EnCours | AppointmentStatus::Planifie => {
                let path = format!("/rendezvous/{}/statut", rendezvous_id);
                let body = json!({ "statutRv": target.wire_str() });
                self.gateway.request(Method::PUT, &path, Some(body)).await?
            }
        };

        info!(
            "Rendezvous {} moved from {} to {}",
            rendezvous_id, from, target
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn planned_can_be_confirmed_or_cancelled_only() {
        assert!(can_transition(Planifie, Confirme));
        assert!(can_transition(Planifie, Annule));
        assert!(!can_transition(Planifie, EnCours));
        assert!(!can_transition(Planifie, Termine));
        assert!(!can_transition(Planifie, Planifie));
    }

    #[test]
    fn confirmed_moves_forward_or_cancels() {
        assert!(can_transition(Confirme, EnCours));
        assert!(can_transition(Confirme, Termine));
        assert!(can_transition(Confirme, Annule));
        assert!(!can_transition(Confirme, Planifie));
    }

    #[test]
    fn in_progress_finishes_or_cancels() {
        assert!(can_transition(EnCours, Termine));
        assert!(can_transition(EnCours, Annule));
        assert!(!can_transition(EnCours, Confirme));
    }

    #[test]
    fn terminal_statuses_never_move() {
        for target in [Planifie, Confirme, EnCours, Termine, Annule] {
            assert!(!can_transition(Termine, target));
            assert!(!can_transition(Annule, target));
        }
    }
}

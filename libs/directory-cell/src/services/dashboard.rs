use std::collections::HashMap;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use scheduling_cell::models::Rendezvous;
use shared_gateway::ClinicClient;

use crate::models::{DashboardEntry, DashboardStats, DentisteDashboard, Patient, PatientDashboard};

const RECENT_PUBLICATIONS: usize = 3;

/// Aggregates the role-specific dashboard views out of several backend
/// reads. Nothing here is cached; each request rebuilds the view.
pub struct DashboardService {
    gateway: ClinicClient,
}

impl DashboardService {
    pub fn new(gateway: ClinicClient) -> Self {
        Self { gateway }
    }

    /// A dentist's appointments joined with patient records, plus stat
    /// tiles. Patients are loaded in one bulk read; ids the bulk read
    /// missed are fetched individually, in parallel.
    pub async fn dentiste_dashboard(&self, dentiste_id: i64) -> Result<DentisteDashboard> {
        debug!("Building dashboard for dentiste {}", dentiste_id);

        let path = format!("/rendezvous/dentiste/{}", dentiste_id);
        let rendezvous: Vec<Rendezvous> = self.gateway.request(Method::GET, &path, None).await?;

        let mut patients: HashMap<i64, Patient> = match self
            .gateway
            .request::<Vec<Patient>>(Method::GET, "/patients/", None)
            .await
        {
            Ok(list) => list.into_iter().map(|p| (p.id, p)).collect(),
            Err(e) => {
                warn!("Bulk patient load failed, filling per appointment: {}", e);
                HashMap::new()
            }
        };

        let missing: Vec<i64> = {
            let mut ids: Vec<i64> = rendezvous
                .iter()
                .filter_map(|rdv| rdv.patient_key())
                .filter(|id| !patients.contains_key(id))
                .collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };

        let fetched = join_all(missing.iter().map(|id| {
            let path = format!("/patients/{}", id);
            async move {
                self.gateway
                    .request::<Patient>(Method::GET, &path, None)
                    .await
            }
        }))
        .await;

        for (id, result) in missing.into_iter().zip(fetched) {
            match result {
                Ok(patient) => {
                    patients.insert(patient.id, patient);
                }
                Err(e) => warn!("Patient {} lookup failed: {}", id, e),
            }
        }

        let stats = compute_stats(&rendezvous, Utc::now().date_naive());
        let entries = rendezvous
            .into_iter()
            .map(|rdv| DashboardEntry {
                patient_record: rdv.patient_key().and_then(|id| patients.get(&id).cloned()),
                badge: rdv.statut.map(|s| s.badge()),
                rendezvous: rdv,
            })
            .collect();

        Ok(DentisteDashboard {
            rendezvous: entries,
            stats,
        })
    }

    /// A patient's appointments plus the most recent publications.
    pub async fn patient_dashboard(&self, patient_id: i64) -> Result<PatientDashboard> {
        debug!("Building dashboard for patient {}", patient_id);

        let path = format!("/rendezvous/patient/{}", patient_id);
        let rendezvous: Vec<Rendezvous> = self.gateway.request(Method::GET, &path, None).await?;

        let publications = match self
            .gateway
            .request::<Vec<Value>>(Method::GET, "/publications/", None)
            .await
        {
            Ok(mut list) => {
                // ISO dates order lexically; newest first.
                list.sort_by(|a, b| {
                    let da = a.get("datePublication").and_then(Value::as_str).unwrap_or("");
                    let db = b.get("datePublication").and_then(Value::as_str).unwrap_or("");
                    db.cmp(da)
                });
                list.truncate(RECENT_PUBLICATIONS);
                list
            }
            Err(e) => {
                warn!("Publications load failed, dashboard shows none: {}", e);
                Vec::new()
            }
        };

        Ok(PatientDashboard {
            rendezvous,
            publications,
        })
    }
}

/// Upcoming means a future (or today's) date with a status that still
/// occupies its slot.
fn compute_stats(rendezvous: &[Rendezvous], today: NaiveDate) -> DashboardStats {
    use scheduling_cell::models::AppointmentStatus;

    let mut stats = DashboardStats {
        total: rendezvous.len(),
        ..Default::default()
    };

    for rdv in rendezvous {
        match rdv.statut {
            Some(AppointmentStatus::Termine) => stats.completed += 1,
            Some(AppointmentStatus::Annule) => stats.cancelled += 1,
            _ => {}
        }

        let occupies = rdv.statut.map_or(true, |s| s.occupies_slot());
        let future = rdv
            .date_key()
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
            .is_some_and(|date| date >= today);
        if occupies && future {
            stats.upcoming += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rdv(date: &str, statut: Option<&str>) -> Rendezvous {
        let mut value = serde_json::json!({ "idRv": 1, "dateRv": date, "heureRv": "09:00" });
        if let Some(s) = statut {
            value["statutRv"] = Value::String(s.to_string());
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn stats_classify_by_status_and_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let list = vec![
            rdv("2024-06-02", Some("Planifié")),
            rdv("2024-06-01", Some("Confirmé")),
            rdv("2024-05-01", Some("Terminé")),
            rdv("2024-06-03", Some("Annulé")),
            rdv("2024-05-30", Some("Planifié")),
            // No status counts as planned.
            rdv("2024-07-01", None),
        ];

        let stats = compute_stats(&list, today);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.upcoming, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.cancelled, 1);
    }
}

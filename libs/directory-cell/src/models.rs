use serde::{Deserialize, Serialize};
use serde_json::Value;

use scheduling_cell::models::{Rendezvous, StatusBadge};

/// Dentist as the clinic backend stores it. `photoD` arrives as a bare
/// stored file name; the directory service rewrites it to an absolute URL
/// before the record leaves this cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dentiste {
    #[serde(rename = "idD")]
    pub id: i64,
    #[serde(rename = "nomD", default)]
    pub nom: Option<String>,
    #[serde(rename = "prenomD", default)]
    pub prenom: Option<String>,
    #[serde(rename = "emailD", default)]
    pub email: Option<String>,
    #[serde(rename = "specialiteD", default)]
    pub specialite: Option<String>,
    #[serde(rename = "telD", default)]
    pub tel: Option<String>,
    #[serde(rename = "photoD", default)]
    pub photo: Option<String>,
}

impl Dentiste {
    /// Concatenated display name; either part may be missing.
    pub fn display_name(&self) -> String {
        match (self.prenom.as_deref(), self.nom.as_deref()) {
            (Some(prenom), Some(nom)) => format!("{} {}", prenom, nom),
            (Some(prenom), None) => prenom.to_string(),
            (None, Some(nom)) => nom.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Case-insensitive substring match over name and specialty.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        [&self.nom, &self.prenom, &self.specialite]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    #[serde(rename = "idP")]
    pub id: i64,
    #[serde(rename = "nomP", default)]
    pub nom: Option<String>,
    #[serde(rename = "prenomP", default)]
    pub prenom: Option<String>,
    #[serde(rename = "emailP", default)]
    pub email: Option<String>,
    #[serde(rename = "telP", default)]
    pub tel: Option<String>,
    #[serde(rename = "photoP", default)]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub upcoming: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub total: usize,
}

/// One appointment row on the dentist dashboard, joined with its patient
/// record when one could be found.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEntry {
    #[serde(flatten)]
    pub rendezvous: Rendezvous,
    pub patient_record: Option<Patient>,
    pub badge: Option<StatusBadge>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DentisteDashboard {
    pub rendezvous: Vec<DashboardEntry>,
    pub stats: DashboardStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDashboard {
    pub rendezvous: Vec<Rendezvous>,
    pub publications: Vec<Value>,
}

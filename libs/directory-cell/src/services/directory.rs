use anyhow::Result;
use reqwest::Method;
use tracing::debug;

use shared_gateway::ClinicClient;

use crate::models::{Dentiste, Patient};

/// Read access to the clinic's people records: the dentist directory the
/// booking form picks from, and patient records for the dashboard.
pub struct DirectoryService {
    gateway: ClinicClient,
}

impl DirectoryService {
    pub fn new(gateway: ClinicClient) -> Self {
        Self { gateway }
    }

    /// All dentists, optionally filtered by a case-insensitive substring
    /// over nom, prénom and spécialité. Photos come back as absolute URLs.
    pub async fn list_dentistes(&self, query: Option<&str>) -> Result<Vec<Dentiste>> {
        debug!("Listing dentistes (query: {:?})", query);

        let mut dentistes: Vec<Dentiste> =
            self.gateway.request(Method::GET, "/dentistes/", None).await?;

        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            dentistes.retain(|d| d.matches(q));
        }

        for dentiste in &mut dentistes {
            self.resolve_dentiste_photo(dentiste);
        }
        Ok(dentistes)
    }

    pub async fn get_dentiste(&self, id: i64) -> Result<Dentiste> {
        let path = format!("/dentistes/{}", id);
        let mut dentiste: Dentiste = self.gateway.request(Method::GET, &path, None).await?;
        self.resolve_dentiste_photo(&mut dentiste);
        Ok(dentiste)
    }

    pub async fn get_patient(&self, id: i64) -> Result<Patient> {
        let path = format!("/patients/{}", id);
        let mut patient: Patient = self.gateway.request(Method::GET, &path, None).await?;
        self.resolve_patient_photo(&mut patient);
        Ok(patient)
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>> {
        let mut patients: Vec<Patient> =
            self.gateway.request(Method::GET, "/patients/", None).await?;
        for patient in &mut patients {
            self.resolve_patient_photo(patient);
        }
        Ok(patients)
    }

    fn resolve_dentiste_photo(&self, dentiste: &mut Dentiste) {
        if let Some(name) = dentiste.photo.take() {
            dentiste.photo = Some(self.resolve(&name));
        }
    }

    fn resolve_patient_photo(&self, patient: &mut Patient) {
        if let Some(name) = patient.photo.take() {
            patient.photo = Some(self.resolve(&name));
        }
    }

    fn resolve(&self, stored_name: &str) -> String {
        // The backend sometimes already returns a full URL.
        if stored_name.starts_with("http://") || stored_name.starts_with("https://") {
            stored_name.to_string()
        } else {
            self.gateway.public_file_url(stored_name)
        }
    }
}

use anyhow::Result;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_gateway::ClinicClient;

use crate::models::{
    CreatePublicationRequest, CreateServiceRequest, DevisResponse, Publication, ServiceMedical,
};

/// The clinic's public catalog: medical services the booking form offers
/// and the publications shown on the news feed.
pub struct CatalogService {
    gateway: ClinicClient,
}

impl CatalogService {
    pub fn new(gateway: ClinicClient) -> Self {
        Self { gateway }
    }

    pub async fn list_services(&self) -> Result<Vec<ServiceMedical>> {
        self.gateway
            .request(Method::GET, "/services-medicaux/", None)
            .await
    }

    pub async fn create_service(&self, request: CreateServiceRequest) -> Result<ServiceMedical> {
        debug!("Creating service medical: {}", request.nom);

        let body = json!({
            "nomSM": request.nom,
            "descriptionSM": request.description,
            "tarifSM": request.tarif,
            "dureeSM": request.duree,
        });
        self.gateway
            .request(Method::POST, "/services-medicaux/", Some(body))
            .await
    }

    /// Publications, newest first. Records without a date sort last.
    pub async fn list_publications(&self) -> Result<Vec<Publication>> {
        let mut publications: Vec<Publication> = self
            .gateway
            .request(Method::GET, "/publications/", None)
            .await?;

        publications.sort_by(|a, b| {
            let da = a.date.as_deref().unwrap_or("");
            let db = b.date.as_deref().unwrap_or("");
            db.cmp(da)
        });
        Ok(publications)
    }

    pub async fn create_publication(
        &self,
        request: CreatePublicationRequest,
    ) -> Result<Publication> {
        debug!("Creating publication: {}", request.titre);

        let body = json!({
            "titrePublication": request.titre,
            "contenuPublication": request.contenu,
        });
        self.gateway
            .request::<Value>(Method::POST, "/publications/", Some(body))
            .await
            .and_then(|value| Ok(serde_json::from_value(value)?))
    }

    /// Price a set of service ids. Unknown ids are dropped; services
    /// without a tariff contribute zero.
    pub async fn quote(&self, service_ids: &[i64]) -> Result<DevisResponse> {
        let all = self.list_services().await?;

        let services: Vec<ServiceMedical> = all
            .into_iter()
            .filter(|service| service_ids.contains(&service.id))
            .collect();
        let total = quote_total(&services);

        Ok(DevisResponse { services, total })
    }
}

pub fn quote_total(services: &[ServiceMedical]) -> f64 {
    services.iter().map(|s| s.tarif.unwrap_or(0.0)).sum()
}

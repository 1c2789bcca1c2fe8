use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceMedical {
    #[serde(rename = "numSM")]
    pub id: i64,
    #[serde(rename = "nomSM", default)]
    pub nom: Option<String>,
    #[serde(rename = "descriptionSM", default)]
    pub description: Option<String>,
    #[serde(rename = "tarifSM", default)]
    pub tarif: Option<f64>,
    #[serde(rename = "dureeSM", default)]
    pub duree: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    #[serde(rename = "idPublication")]
    pub id: i64,
    #[serde(rename = "titrePublication", default)]
    pub titre: Option<String>,
    #[serde(rename = "contenuPublication", default)]
    pub contenu: Option<String>,
    #[serde(rename = "datePublication", default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    #[serde(rename = "nomSM")]
    pub nom: String,
    #[serde(rename = "descriptionSM", default)]
    pub description: Option<String>,
    #[serde(rename = "tarifSM", default)]
    pub tarif: Option<f64>,
    #[serde(rename = "dureeSM", default)]
    pub duree: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePublicationRequest {
    #[serde(rename = "titrePublication")]
    pub titre: String,
    #[serde(rename = "contenuPublication")]
    pub contenu: String,
}

#[derive(Debug, Deserialize)]
pub struct DevisRequest {
    pub services: Vec<i64>,
}

/// Quote for a set of services: the matched records plus the summed
/// tariff. Services without a tariff price at zero.
#[derive(Debug, Serialize)]
pub struct DevisResponse {
    pub services: Vec<ServiceMedical>,
    pub total: f64,
}

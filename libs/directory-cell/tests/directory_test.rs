use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use directory_cell::handlers::{get_patient, list_dentistes, tableau_de_bord, DentisteSearchQuery};
use directory_cell::services::DirectoryState;
use shared_models::error::AppError;
use shared_utils::test_utils::{TestConfig, TestSession};

async fn state_with_backend(mock_server: &MockServer) -> Arc<DirectoryState> {
    let config = TestConfig::with_backend(&mock_server.uri()).to_arc();
    Arc::new(DirectoryState::new(config))
}

fn dentiste_json(id: i64, nom: &str, prenom: &str, specialite: &str) -> serde_json::Value {
    json!({
        "idD": id,
        "nomD": nom,
        "prenomD": prenom,
        "emailD": format!("{}@clinique.example", nom.to_lowercase()),
        "specialiteD": specialite
    })
}

#[tokio::test]
async fn dentist_search_filters_case_insensitively() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dentistes/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            dentiste_json(1, "Durand", "Alice", "Orthodontie"),
            dentiste_json(2, "Martin", "Bruno", "Chirurgie"),
        ])))
        .mount(&mock_server)
        .await;

    let state = state_with_backend(&mock_server).await;
    let session = TestSession::patient(1).to_context();

    let all = list_dentistes(
        State(state.clone()),
        Extension(session.clone()),
        Query(DentisteSearchQuery { q: None }),
    )
    .await
    .unwrap();
    assert_eq!(all.0.len(), 2);

    let filtered = list_dentistes(
        State(state),
        Extension(session),
        Query(DentisteSearchQuery {
            q: Some("ORTHO".to_string()),
        }),
    )
    .await
    .unwrap();
    assert_eq!(filtered.0.len(), 1);
    assert_eq!(filtered.0[0].nom.as_deref(), Some("Durand"));
}

#[tokio::test]
async fn dentist_photos_resolve_to_absolute_urls() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dentistes/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "idD": 1, "nomD": "Durand", "photoD": "durand.jpg" },
            { "idD": 2, "nomD": "Martin" },
        ])))
        .mount(&mock_server)
        .await;

    let state = state_with_backend(&mock_server).await;
    let dentistes = state.directory.list_dentistes(None).await.unwrap();

    let photo = dentistes[0].photo.as_deref().unwrap();
    assert!(photo.starts_with("http"));
    assert!(photo.ends_with("/uploads/patients/durand.jpg"));
    assert!(dentistes[1].photo.is_none());
}

#[tokio::test]
async fn patients_cannot_read_other_patients() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/patients/2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "idP": 2, "nomP": "Petit" })),
        )
        .mount(&mock_server)
        .await;

    let state = state_with_backend(&mock_server).await;

    let denied = get_patient(
        State(state.clone()),
        Extension(TestSession::patient(1).to_context()),
        Path(2),
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let own = get_patient(
        State(state.clone()),
        Extension(TestSession::patient(2).to_context()),
        Path(2),
    )
    .await
    .unwrap();
    assert_eq!(own.0.id, 2);

    let as_dentiste = get_patient(
        State(state),
        Extension(TestSession::dentiste(9).to_context()),
        Path(2),
    )
    .await
    .unwrap();
    assert_eq!(as_dentiste.0.id, 2);
}

#[tokio::test]
async fn dentist_dashboard_joins_patients_and_fills_gaps() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rendezvous/dentiste/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "idRv": 1, "dateRv": "2030-01-01", "heureRv": "09:00", "statutRv": "Planifié", "idP": 1 },
            { "idRv": 2, "dateRv": "2020-01-01", "heureRv": "10:00", "statutRv": "Terminé", "patient": { "idP": 2 } }
        ])))
        .mount(&mock_server)
        .await;
    // Bulk read only knows patient 1; patient 2 comes from the gap fill.
    Mock::given(method("GET"))
        .and(path("/patients/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "idP": 1, "nomP": "Roux" }])),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/patients/2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "idP": 2, "nomP": "Petit" })),
        )
        .mount(&mock_server)
        .await;

    let state = state_with_backend(&mock_server).await;
    let dashboard = state.dashboard.dentiste_dashboard(9).await.unwrap();

    assert_eq!(dashboard.rendezvous.len(), 2);
    assert_eq!(
        dashboard.rendezvous[0]
            .patient_record
            .as_ref()
            .and_then(|p| p.nom.as_deref()),
        Some("Roux")
    );
    assert_eq!(
        dashboard.rendezvous[1]
            .patient_record
            .as_ref()
            .and_then(|p| p.nom.as_deref()),
        Some("Petit")
    );
    assert_eq!(dashboard.stats.total, 2);
    assert_eq!(dashboard.stats.upcoming, 1);
    assert_eq!(dashboard.stats.completed, 1);
}

#[tokio::test]
async fn patient_dashboard_limits_publications_to_newest() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rendezvous/patient/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "idRv": 1, "dateRv": "2030-01-01", "heureRv": "09:00", "statutRv": "Planifié" }
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/publications/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "idPublication": 1, "titrePublication": "A", "datePublication": "2024-01-01" },
            { "idPublication": 2, "titrePublication": "B", "datePublication": "2024-03-01" },
            { "idPublication": 3, "titrePublication": "C", "datePublication": "2024-02-01" },
            { "idPublication": 4, "titrePublication": "D", "datePublication": "2024-04-01" }
        ])))
        .mount(&mock_server)
        .await;

    let state = state_with_backend(&mock_server).await;
    let response = tableau_de_bord(
        State(state),
        Extension(TestSession::patient(1).to_context()),
    )
    .await
    .unwrap();

    let publications = response.0["publications"].as_array().unwrap();
    assert_eq!(publications.len(), 3);
    assert_eq!(publications[0]["titrePublication"], "D");
    assert_eq!(publications[2]["titrePublication"], "B");
}

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::models::BookingError;
use scheduling_cell::services::SchedulingState;
use scheduling_cell::DraftStage;
use shared_utils::test_utils::TestConfig;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

async fn state_with_backend(mock_server: &MockServer) -> Arc<SchedulingState> {
    let config = TestConfig::with_backend(&mock_server.uri()).to_arc();
    Arc::new(SchedulingState::new(config))
}

async fn mount_empty_day(mock_server: &MockServer, dentiste_id: i64) {
    Mock::given(method("GET"))
        .and(path(format!("/rendezvous/dentiste/{}", dentiste_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn full_booking_flow_walks_the_stages_and_resets_on_success() {
    let mock_server = MockServer::start().await;
    mount_empty_day(&mock_server, 5).await;
    Mock::given(method("POST"))
        .and(path("/rendezvous/"))
        .and(body_partial_json(json!({
            "dateRv": "2024-06-01",
            "heureRv": "09:00",
            "statutRv": "Planifié",
            "patient": { "idP": 1 },
            "dentiste": { "idD": 5 },
            "services": [{ "numSM": 2 }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "idRv": 42 })))
        .mount(&mock_server)
        .await;

    let state = state_with_backend(&mock_server).await;

    let draft = state.drafts.create(1);
    assert_eq!(draft.stage, DraftStage::Idle);
    assert_eq!(draft.stats.available, 40);

    let draft = state.drafts.set_dentiste(draft.id, 1, Some(5)).await.unwrap();
    assert_eq!(draft.stage, DraftStage::DentistSelected);

    let draft = state.drafts.set_date(draft.id, 1, Some(date())).await.unwrap();
    assert_eq!(draft.stage, DraftStage::DateSelected);

    let draft = state.drafts.select_slot(draft.id, 1, "09:00").unwrap();
    assert_eq!(draft.stage, DraftStage::SlotSelected);
    assert_eq!(draft.heure.as_deref(), Some("09:00"));

    let draft = state.drafts.set_services(draft.id, 1, vec![2]).unwrap();
    assert_eq!(draft.stage, DraftStage::ServicesSelected);

    let draft = state.drafts.submit(draft.id, 1).await.unwrap();
    assert_eq!(draft.stage, DraftStage::Success);
    assert_eq!(
        draft.success_message.as_deref(),
        Some("Rendez-vous créé avec succès !")
    );
    assert!(draft.dentiste_id.is_none());
    assert!(draft.date.is_none());
    assert!(draft.heure.is_none());
    assert!(draft.service_ids.is_empty());
    assert!(draft.field_errors.is_empty());
    assert_eq!(draft.stats.available, 40);
}

#[tokio::test]
async fn submit_without_required_fields_reports_them_all_without_calling_the_backend() {
    let mock_server = MockServer::start().await;
    let state = state_with_backend(&mock_server).await;

    let draft = state.drafts.create(1);
    let draft = state.drafts.submit(draft.id, 1).await.unwrap();

    assert!(draft.field_errors.contains_key("dateRv"));
    assert!(draft.field_errors.contains_key("heureRv"));
    assert!(draft.field_errors.contains_key("dentiste"));
    assert!(draft.field_errors.contains_key("services"));
    assert_ne!(draft.stage, DraftStage::Submitting);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn backend_rejection_preserves_every_field_for_retry() {
    let mock_server = MockServer::start().await;
    mount_empty_day(&mock_server, 5).await;
    Mock::given(method("POST"))
        .and(path("/rendezvous/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let state = state_with_backend(&mock_server).await;

    let draft = state.drafts.create(1);
    state.drafts.set_dentiste(draft.id, 1, Some(5)).await.unwrap();
    state.drafts.set_date(draft.id, 1, Some(date())).await.unwrap();
    state.drafts.select_slot(draft.id, 1, "10:15").unwrap();
    state.drafts.set_services(draft.id, 1, vec![2, 3]).unwrap();
    state
        .drafts
        .set_notes(draft.id, 1, Some("Douleur molaire".to_string()))
        .unwrap();

    let failed = state.drafts.submit(draft.id, 1).await.unwrap();

    assert_eq!(failed.stage, DraftStage::Failed);
    assert!(failed.form_error.is_some());
    assert_eq!(failed.dentiste_id, Some(5));
    assert_eq!(failed.date, Some(date()));
    assert_eq!(failed.heure.as_deref(), Some("10:15"));
    assert_eq!(failed.service_ids, vec![2, 3]);
    assert_eq!(failed.notes.as_deref(), Some("Douleur molaire"));
}

#[tokio::test]
async fn selection_that_vanishes_is_cleared_with_a_message() {
    let mock_server = MockServer::start().await;
    mount_empty_day(&mock_server, 5).await;

    let state = state_with_backend(&mock_server).await;

    let draft = state.drafts.create(1);
    state.drafts.set_dentiste(draft.id, 1, Some(5)).await.unwrap();
    state.drafts.set_date(draft.id, 1, Some(date())).await.unwrap();
    let selected = state.drafts.select_slot(draft.id, 1, "09:00").unwrap();
    assert_eq!(selected.heure.as_deref(), Some("09:00"));

    // Someone else books 09:00 behind our back.
    mock_server.reset().await;
    Mock::given(method("GET"))
        .and(path("/rendezvous/dentiste/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "idRv": 7, "dateRv": "2024-06-01", "heureRv": "09:00", "statutRv": "Planifié" }
        ])))
        .mount(&mock_server)
        .await;

    let refreshed = state.drafts.recompute(draft.id).await.unwrap();

    assert!(refreshed.heure.is_none());
    assert_eq!(
        refreshed.field_errors.get("heureRv").map(String::as_str),
        Some("Le créneau sélectionné n'est plus disponible")
    );
    assert_eq!(refreshed.stage, DraftStage::DateSelected);
    let nine = refreshed.slots.iter().find(|s| s.time == "09:00").unwrap();
    assert!(nine.is_occupied);
}

#[tokio::test]
async fn occupied_or_unknown_slots_cannot_be_selected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rendezvous/dentiste/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "idRv": 7, "dateRv": "2024-06-01", "heureRv": "09:00", "statutRv": "Planifié" }
        ])))
        .mount(&mock_server)
        .await;

    let state = state_with_backend(&mock_server).await;

    let draft = state.drafts.create(1);
    state.drafts.set_dentiste(draft.id, 1, Some(5)).await.unwrap();
    state.drafts.set_date(draft.id, 1, Some(date())).await.unwrap();

    let rejected = state.drafts.select_slot(draft.id, 1, "09:00").unwrap();
    assert!(rejected.heure.is_none());
    assert_eq!(
        rejected.field_errors.get("heureRv").map(String::as_str),
        Some("Ce créneau n'est pas disponible. Veuillez en choisir un autre.")
    );

    // Off-grid time.
    let rejected = state.drafts.select_slot(draft.id, 1, "09:07").unwrap();
    assert!(rejected.heure.is_none());
    assert!(rejected.field_errors.contains_key("heureRv"));
}

#[tokio::test]
async fn slot_selection_requires_dentist_and_date_first() {
    let mock_server = MockServer::start().await;
    let state = state_with_backend(&mock_server).await;

    let draft = state.drafts.create(1);
    let rejected = state.drafts.select_slot(draft.id, 1, "09:00").unwrap();

    assert!(rejected.heure.is_none());
    assert_eq!(
        rejected.field_errors.get("heureRv").map(String::as_str),
        Some("Sélectionnez d'abord un dentiste et une date")
    );
}

#[tokio::test]
async fn a_held_slot_blocks_other_drafts_until_released() {
    let mock_server = MockServer::start().await;
    mount_empty_day(&mock_server, 5).await;

    let state = state_with_backend(&mock_server).await;

    let first = state.drafts.create(1);
    state.drafts.set_dentiste(first.id, 1, Some(5)).await.unwrap();
    state.drafts.set_date(first.id, 1, Some(date())).await.unwrap();
    state.drafts.select_slot(first.id, 1, "09:00").unwrap();

    let second = state.drafts.create(2);
    state.drafts.set_dentiste(second.id, 2, Some(5)).await.unwrap();
    let refreshed = state.drafts.set_date(second.id, 2, Some(date())).await.unwrap();

    // The other draft's pick shows as unavailable but not occupied.
    let nine = refreshed.slots.iter().find(|s| s.time == "09:00").unwrap();
    assert!(!nine.available && !nine.is_occupied);

    let rejected = state.drafts.select_slot(second.id, 2, "09:00").unwrap();
    assert!(rejected.heure.is_none());
    assert!(rejected.field_errors.contains_key("heureRv"));

    // Abandoning the first draft frees the slot.
    state.drafts.abandon(first.id, 1).unwrap();
    let refreshed = state.drafts.set_date(second.id, 2, Some(date())).await.unwrap();
    assert!(refreshed.slots.iter().find(|s| s.time == "09:00").unwrap().available);
    let taken = state.drafts.select_slot(second.id, 2, "09:00").unwrap();
    assert_eq!(taken.heure.as_deref(), Some("09:00"));
}

#[tokio::test]
async fn failed_reselection_keeps_the_current_hold() {
    let mock_server = MockServer::start().await;
    mount_empty_day(&mock_server, 5).await;

    let state = state_with_backend(&mock_server).await;

    // First draft holds 09:00, second holds 10:00.
    let first = state.drafts.create(1);
    state.drafts.set_dentiste(first.id, 1, Some(5)).await.unwrap();
    state.drafts.set_date(first.id, 1, Some(date())).await.unwrap();
    state.drafts.select_slot(first.id, 1, "09:00").unwrap();

    let second = state.drafts.create(2);
    state.drafts.set_dentiste(second.id, 2, Some(5)).await.unwrap();
    state.drafts.set_date(second.id, 2, Some(date())).await.unwrap();
    state.drafts.select_slot(second.id, 2, "10:00").unwrap();

    // The first draft's slot view predates the second selection, so the
    // local check passes and only the hold acquisition can refuse.
    let rejected = state.drafts.select_slot(first.id, 1, "10:00").unwrap();
    assert!(rejected.field_errors.contains_key("heureRv"));
    assert_eq!(rejected.heure.as_deref(), Some("09:00"));

    // 09:00 must still be held for the first draft: a third draft that
    // refreshes its slots sees it unavailable and cannot take it.
    let third = state.drafts.create(3);
    state.drafts.set_dentiste(third.id, 3, Some(5)).await.unwrap();
    let refreshed = state.drafts.set_date(third.id, 3, Some(date())).await.unwrap();
    let nine = refreshed.slots.iter().find(|s| s.time == "09:00").unwrap();
    assert!(!nine.available && !nine.is_occupied);

    let denied = state.drafts.select_slot(third.id, 3, "09:00").unwrap();
    assert!(denied.heure.is_none());
    assert!(denied.field_errors.contains_key("heureRv"));
}

#[tokio::test]
async fn delayed_response_for_a_superseded_dentist_is_discarded() {
    let mock_server = MockServer::start().await;
    // Dentist 5 answers slowly with 09:00 taken; dentist 6 answers at
    // once with a free day.
    Mock::given(method("GET"))
        .and(path("/rendezvous/dentiste/5"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    { "idRv": 7, "dateRv": "2024-06-01", "heureRv": "09:00", "statutRv": "Planifié" }
                ]))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;
    mount_empty_day(&mock_server, 6).await;

    let state = state_with_backend(&mock_server).await;

    let draft = state.drafts.create(1);
    state.drafts.set_dentiste(draft.id, 1, Some(5)).await.unwrap();

    // Kick off the slow dentist-5 recomputation, then switch dentists
    // while it is still in flight.
    let in_flight = {
        let state = state.clone();
        let id = draft.id;
        tokio::spawn(async move { state.drafts.set_date(id, 1, Some(date())).await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    state.drafts.set_dentiste(draft.id, 1, Some(6)).await.unwrap();

    let from_stale = in_flight.await.unwrap().unwrap();

    // The dentist-5 response must not have been applied anywhere.
    assert_eq!(from_stale.dentiste_id, Some(6));
    assert!(from_stale.slots.iter().find(|s| s.time == "09:00").unwrap().available);

    let current = state.drafts.get(draft.id, 1).unwrap();
    assert_eq!(current.dentiste_id, Some(6));
    assert!(current.slots.iter().all(|s| s.available));
    assert_eq!(current.stats.occupied, 0);
}

#[tokio::test]
async fn clearing_the_date_discards_the_chosen_time() {
    let mock_server = MockServer::start().await;
    mount_empty_day(&mock_server, 5).await;

    let state = state_with_backend(&mock_server).await;

    let draft = state.drafts.create(1);
    state.drafts.set_dentiste(draft.id, 1, Some(5)).await.unwrap();
    state.drafts.set_date(draft.id, 1, Some(date())).await.unwrap();
    state.drafts.select_slot(draft.id, 1, "09:00").unwrap();

    let cleared = state.drafts.set_date(draft.id, 1, None).await.unwrap();
    assert!(cleared.heure.is_none());
    assert_eq!(cleared.stage, DraftStage::DentistSelected);
    assert_eq!(cleared.stats.available, 40);
}

#[tokio::test]
async fn drafts_are_private_to_their_patient() {
    let mock_server = MockServer::start().await;
    let state = state_with_backend(&mock_server).await;

    let draft = state.drafts.create(1);

    assert_matches!(state.drafts.get(draft.id, 2), Err(BookingError::NotOwner));
    assert_matches!(state.drafts.abandon(draft.id, 2), Err(BookingError::NotOwner));
    assert_matches!(
        state.drafts.get(uuid::Uuid::new_v4(), 1),
        Err(BookingError::DraftNotFound)
    );
}

#[tokio::test]
async fn clearing_the_dentist_discards_the_chosen_time() {
    let mock_server = MockServer::start().await;
    mount_empty_day(&mock_server, 5).await;

    let state = state_with_backend(&mock_server).await;

    let draft = state.drafts.create(1);
    state.drafts.set_dentiste(draft.id, 1, Some(5)).await.unwrap();
    state.drafts.set_date(draft.id, 1, Some(date())).await.unwrap();
    state.drafts.select_slot(draft.id, 1, "09:00").unwrap();

    let cleared = state.drafts.set_dentiste(draft.id, 1, None).await.unwrap();
    assert!(cleared.heure.is_none());
    assert_eq!(cleared.stage, DraftStage::Idle);
    assert_eq!(cleared.stats.available, 40);
}

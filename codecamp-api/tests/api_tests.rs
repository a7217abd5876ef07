//! Integration tests for codecamp-api endpoints
//!
//! Each test drives the full router against its own in-memory database.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::NaiveDate;
use codecamp_api::repository::{
    CampRepository, Entity, RepositoryProvider, RepositoryResult, SqliteCampRepository, StageToken,
};
use codecamp_api::{build_router, seed, AppState};
use codecamp_common::db::init::init_schema;
use codecamp_common::{Camp, Speaker, Talk};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method

// =============================================================================
// Helpers
// =============================================================================

async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    init_schema(&pool).await.expect("Should create schema");
    pool
}

fn setup_app(db: SqlitePool) -> Router {
    build_router(AppState::new(db))
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn extract_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Should read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn camp_body(moniker: &str) -> Value {
    json!({
        "name": "Atlanta Code Camp",
        "moniker": moniker,
        "eventDate": "2024-10-18T00:00:00",
        "length": 1,
        "venue": "Atlanta Convention Center",
        "address1": "123 Main Street",
        "cityTown": "Atlanta",
        "stateProvince": "GA",
        "postalCode": "30303",
        "country": "USA"
    })
}

fn talk_body(title: &str, speaker_id: Option<i64>) -> Value {
    let mut body = json!({
        "title": title,
        "abstract": "An hour of live coding against a real database.",
        "level": 200
    });
    if let Some(id) = speaker_id {
        body["speaker"] = json!({ "speakerId": id });
    }
    body
}

async fn create_camp(app: &Router, moniker: &str) -> Response {
    send(app, json_request("POST", "/api/camps", &camp_body(moniker))).await
}

/// Speakers have no HTTP surface; insert them through the repository
async fn insert_speaker(pool: &SqlitePool, name: &str) -> i64 {
    let mut repo = pool.repository();
    let token = repo.add(
        Speaker {
            name: name.to_string(),
            ..Default::default()
        }
        .into(),
    );
    assert!(repo.save_changes().await.unwrap());
    repo.entry(token).unwrap().as_speaker().unwrap().speaker_id
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Misbehavior injected into an otherwise real repository
#[derive(Clone, Copy)]
enum Fault {
    /// Every commit reports that nothing was affected
    RejectCommits,
    /// Commits succeed but staged entities can no longer be looked up
    ForgetEntries,
}

struct FaultyRepository {
    inner: SqliteCampRepository,
    fault: Fault,
}

#[async_trait]
impl CampRepository for FaultyRepository {
    async fn get_all_camps(&self, include_talks: bool) -> RepositoryResult<Vec<Camp>> {
        self.inner.get_all_camps(include_talks).await
    }

    async fn get_camp(&self, moniker: &str) -> RepositoryResult<Option<Camp>> {
        self.inner.get_camp(moniker).await
    }

    async fn get_camps_by_event_date(
        &self,
        date: NaiveDate,
        include_talks: bool,
    ) -> RepositoryResult<Vec<Camp>> {
        self.inner.get_camps_by_event_date(date, include_talks).await
    }

    async fn get_talks_for_camp(
        &self,
        moniker: &str,
        include_speakers: bool,
    ) -> RepositoryResult<Vec<Talk>> {
        self.inner.get_talks_for_camp(moniker, include_speakers).await
    }

    async fn get_talk(
        &self,
        moniker: &str,
        talk_id: i64,
        include_speaker: bool,
    ) -> RepositoryResult<Option<Talk>> {
        self.inner.get_talk(moniker, talk_id, include_speaker).await
    }

    async fn get_speaker(&self, speaker_id: i64) -> RepositoryResult<Option<Speaker>> {
        self.inner.get_speaker(speaker_id).await
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.inner.ping().await
    }

    fn add(&mut self, entity: Entity) -> StageToken {
        self.inner.add(entity)
    }

    fn update(&mut self, entity: Entity) -> StageToken {
        self.inner.update(entity)
    }

    fn delete(&mut self, entity: Entity) -> StageToken {
        self.inner.delete(entity)
    }

    fn entry(&self, token: StageToken) -> Option<&Entity> {
        match self.fault {
            Fault::RejectCommits => self.inner.entry(token),
            Fault::ForgetEntries => None,
        }
    }

    async fn save_changes(&mut self) -> RepositoryResult<bool> {
        match self.fault {
            Fault::RejectCommits => Ok(false),
            Fault::ForgetEntries => self.inner.save_changes().await,
        }
    }
}

struct FaultyProvider {
    pool: SqlitePool,
    fault: Fault,
}

impl RepositoryProvider for FaultyProvider {
    fn repository(&self) -> Box<dyn CampRepository> {
        Box::new(FaultyRepository {
            inner: SqliteCampRepository::new(self.pool.clone()),
            fault: self.fault,
        })
    }
}

fn faulty_app(pool: &SqlitePool, fault: Fault) -> Router {
    build_router(AppState::with_provider(Arc::new(FaultyProvider {
        pool: pool.clone(),
        fault,
    })))
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(setup_test_db().await);

    let response = send(&app, test_request("GET", "/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "codecamp-api");
    assert!(body["version"].is_string());
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    pool.close().await;

    let response = send(&app, test_request("GET", "/health")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "unavailable");
}

// =============================================================================
// Camps
// =============================================================================

#[tokio::test]
async fn test_create_camp_then_get() {
    let app = setup_app(setup_test_db().await);

    let response = create_camp(&app, "ATL2024").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()[header::LOCATION].to_str().unwrap(),
        "/api/camps/ATL2024"
    );
    let created = extract_json(response).await;
    assert_eq!(created["moniker"], "ATL2024");

    let response = send(&app, test_request("GET", "/api/camps/ATL2024")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response).await;
    assert_eq!(body["moniker"], "ATL2024");
    assert_eq!(body["name"], "Atlanta Code Camp");
    assert_eq!(body["eventDate"], "2024-10-18T00:00:00");
    assert_eq!(body["venue"], "Atlanta Convention Center");
}

#[tokio::test]
async fn test_state_province_reports_city() {
    let app = setup_app(setup_test_db().await);
    create_camp(&app, "ATL2024").await;

    let body = extract_json(send(&app, test_request("GET", "/api/camps/ATL2024")).await).await;
    assert_eq!(body["cityTown"], "Atlanta");
    assert_eq!(body["stateProvince"], "Atlanta");
}

#[tokio::test]
async fn test_create_duplicate_moniker_rejected() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());

    assert_eq!(create_camp(&app, "ATL2024").await.status(), StatusCode::CREATED);

    let response = create_camp(&app, "ATL2024").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response).await;
    assert_eq!(body["error"]["message"], "Moniker in use");

    assert_eq!(count(&pool, "camps").await, 1);
}

#[tokio::test]
async fn test_create_duplicate_moniker_ignores_case() {
    let app = setup_app(setup_test_db().await);
    create_camp(&app, "ATL2024").await;

    let response = create_camp(&app, "atl2024").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_camp_invalid_model() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());

    let body = json!({ "name": "", "moniker": "", "length": 0 });
    let response = send(&app, json_request("POST", "/api/camps", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    let details = body["error"]["details"].as_array().unwrap();
    assert_eq!(details.len(), 3);
    assert!(details.contains(&json!("The Moniker field is required.")));

    assert_eq!(count(&pool, "camps").await, 0);
}

#[tokio::test]
async fn test_create_camp_unroutable_moniker() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());

    let response = create_camp(&app, "ATL\t2024").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["message"], "Could not use current moniker.");
    assert_eq!(count(&pool, "camps").await, 0);
}

#[tokio::test]
async fn test_location_is_percent_encoded() {
    let app = setup_app(setup_test_db().await);

    let response = create_camp(&app, "ATL 2024").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(location, "/api/camps/ATL%202024");

    let response = send(&app, test_request("GET", &location)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_unknown_camp() {
    let app = setup_app(setup_test_db().await);

    let response = send(&app, test_request("GET", "/api/camps/NOPE")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_camps_with_and_without_talks() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;
    let speaker_id = insert_speaker(&pool, "Shawn Wildermuth").await;
    send(
        &app,
        json_request(
            "POST",
            "/api/camps/ATL2024/talks",
            &talk_body("Async Rust", Some(speaker_id)),
        ),
    )
    .await;

    let plain = extract_json(send(&app, test_request("GET", "/api/camps")).await).await;
    assert_eq!(plain.as_array().unwrap().len(), 1);
    assert!(plain[0]["talks"].as_array().unwrap().is_empty());

    let with_talks = extract_json(
        send(&app, test_request("GET", "/api/camps?includeTalks=true")).await,
    )
    .await;
    let talks = with_talks[0]["talks"].as_array().unwrap();
    assert_eq!(talks.len(), 1);
    assert_eq!(talks[0]["title"], "Async Rust");
    assert_eq!(talks[0]["speaker"]["name"], "Shawn Wildermuth");
}

#[tokio::test]
async fn test_search_by_date() {
    let app = setup_app(setup_test_db().await);
    create_camp(&app, "ATL2024").await;

    let response = send(&app, test_request("GET", "/api/camps/search?date=2024-10-18")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["moniker"], "ATL2024");

    let response = send(
        &app,
        test_request("GET", "/api/camps/search?date=2024-10-18T09:30:00"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_by_date_without_match() {
    let app = setup_app(setup_test_db().await);
    create_camp(&app, "ATL2024").await;

    let response = send(&app, test_request("GET", "/api/camps/search?date=2019-01-01")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_by_invalid_date() {
    let app = setup_app(setup_test_db().await);

    let response = send(&app, test_request("GET", "/api/camps/search?date=soon")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_without_date_matches_nothing() {
    let app = setup_app(setup_test_db().await);
    create_camp(&app, "ATL2024").await;

    let response = send(&app, test_request("GET", "/api/camps/search")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_update_camp() {
    let app = setup_app(setup_test_db().await);
    create_camp(&app, "ATL2024").await;

    let mut body = camp_body("ATL2024");
    body["name"] = json!("Atlanta Code Camp 2024");
    body["length"] = json!(2);

    let response = send(&app, json_request("PUT", "/api/camps/ATL2024", &body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = extract_json(response).await;
    assert_eq!(updated["name"], "Atlanta Code Camp 2024");

    let fetched = extract_json(send(&app, test_request("GET", "/api/camps/ATL2024")).await).await;
    assert_eq!(fetched["name"], "Atlanta Code Camp 2024");
    assert_eq!(fetched["length"], 2);
}

#[tokio::test]
async fn test_update_camp_with_same_values_succeeds() {
    let app = setup_app(setup_test_db().await);
    create_camp(&app, "ATL2024").await;

    let response = send(
        &app,
        json_request("PUT", "/api/camps/ATL2024", &camp_body("ATL2024")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_unknown_camp() {
    let app = setup_app(setup_test_db().await);

    let response = send(&app, json_request("PUT", "/api/camps/NOPE", &camp_body("NOPE"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["message"], "Camp with NOPE does not exist.");
}

#[tokio::test]
async fn test_delete_camp_removes_talks() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;
    let speaker_id = insert_speaker(&pool, "Resa Wildermuth").await;
    send(
        &app,
        json_request(
            "POST",
            "/api/camps/ATL2024/talks",
            &talk_body("Sample Data", Some(speaker_id)),
        ),
    )
    .await;
    assert_eq!(count(&pool, "talks").await, 1);

    let response = send(&app, test_request("DELETE", "/api/camps/ATL2024")).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(count(&pool, "camps").await, 0);
    assert_eq!(count(&pool, "talks").await, 0);
    assert_eq!(count(&pool, "speakers").await, 1);

    let response = send(&app, test_request("GET", "/api/camps/ATL2024/talks")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_unknown_camp() {
    let app = setup_app(setup_test_db().await);

    let response = send(&app, test_request("DELETE", "/api/camps/NOPE")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["message"], "No camps exist with NOPE moniker.");
}

// =============================================================================
// Talks
// =============================================================================

#[tokio::test]
async fn test_create_talk_then_get() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;
    let speaker_id = insert_speaker(&pool, "Shawn Wildermuth").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/camps/ATL2024/talks",
            &talk_body("Async Rust", Some(speaker_id)),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();
    let created = extract_json(response).await;
    let talk_id = created["talkId"].as_i64().unwrap();
    assert!(talk_id > 0);
    assert_eq!(location, format!("/api/camps/ATL2024/talks/{}", talk_id));
    assert_eq!(created["speaker"]["speakerId"], speaker_id);

    let response = send(&app, test_request("GET", &location)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = extract_json(response).await;
    assert_eq!(fetched["title"], "Async Rust");
    assert_eq!(fetched["speaker"]["name"], "Shawn Wildermuth");
}

#[tokio::test]
async fn test_create_talk_unknown_camp() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    let speaker_id = insert_speaker(&pool, "Shawn Wildermuth").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/camps/NOPE/talks",
            &talk_body("Async Rust", Some(speaker_id)),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["message"], "Camp not found.");
    assert_eq!(count(&pool, "talks").await, 0);
}

#[tokio::test]
async fn test_create_talk_without_speaker() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;

    let response = send(
        &app,
        json_request("POST", "/api/camps/ATL2024/talks", &talk_body("Async Rust", None)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["message"], "SpeakerId is required");
    assert_eq!(count(&pool, "talks").await, 0);
}

#[tokio::test]
async fn test_create_talk_unknown_speaker() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/camps/ATL2024/talks",
            &talk_body("Async Rust", Some(999)),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["message"], "Speaker not found.");
    assert_eq!(count(&pool, "talks").await, 0);
}

#[tokio::test]
async fn test_create_talk_invalid_model() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;

    let body = json!({ "title": "Short", "abstract": "Too short", "level": 50 });
    let response = send(&app, json_request("POST", "/api/camps/ATL2024/talks", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response).await;
    let details = body["error"]["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
}

#[tokio::test]
async fn test_get_talks_for_camp_without_talks() {
    let app = setup_app(setup_test_db().await);
    create_camp(&app, "ATL2024").await;

    let response = send(&app, test_request("GET", "/api/camps/ATL2024/talks")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["message"], "No talks by that moniker.");
}

#[tokio::test]
async fn test_get_talks_ordered_by_title() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;
    let speaker_id = insert_speaker(&pool, "Shawn Wildermuth").await;

    for title in ["Zero-Cost Abstractions", "Async Rust"] {
        send(
            &app,
            json_request(
                "POST",
                "/api/camps/ATL2024/talks",
                &talk_body(title, Some(speaker_id)),
            ),
        )
        .await;
    }

    let response = send(&app, test_request("GET", "/api/camps/ATL2024/talks")).await;
    let body = extract_json(response).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|talk| talk["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Async Rust", "Zero-Cost Abstractions"]);
}

#[tokio::test]
async fn test_talk_from_other_camp_not_found() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;
    create_camp(&app, "NYC2024").await;
    let speaker_id = insert_speaker(&pool, "Shawn Wildermuth").await;

    let created = extract_json(
        send(
            &app,
            json_request(
                "POST",
                "/api/camps/ATL2024/talks",
                &talk_body("Async Rust", Some(speaker_id)),
            ),
        )
        .await,
    )
    .await;
    let uri = format!("/api/camps/NYC2024/talks/{}", created["talkId"]);

    let response = send(&app, test_request("GET", &uri)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_integer_talk_id_is_not_found() {
    let app = setup_app(setup_test_db().await);
    create_camp(&app, "ATL2024").await;

    let response = send(&app, test_request("GET", "/api/camps/ATL2024/talks/abc")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, test_request("DELETE", "/api/camps/ATL2024/talks/abc")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_talk_keeps_speaker_when_unresolvable() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;
    let speaker_id = insert_speaker(&pool, "Shawn Wildermuth").await;

    let created = extract_json(
        send(
            &app,
            json_request(
                "POST",
                "/api/camps/ATL2024/talks",
                &talk_body("Async Rust", Some(speaker_id)),
            ),
        )
        .await,
    )
    .await;
    let uri = format!("/api/camps/ATL2024/talks/{}", created["talkId"]);

    let mut body = talk_body("Async Rust in Practice", Some(999));
    body["level"] = json!(300);
    let response = send(&app, json_request("PUT", &uri, &body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = extract_json(send(&app, test_request("GET", &uri)).await).await;
    assert_eq!(fetched["title"], "Async Rust in Practice");
    assert_eq!(fetched["level"], 300);
    assert_eq!(fetched["speaker"]["speakerId"], speaker_id);
    assert_eq!(fetched["talkId"], created["talkId"]);
}

#[tokio::test]
async fn test_update_talk_replaces_speaker() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;
    let shawn = insert_speaker(&pool, "Shawn Wildermuth").await;
    let resa = insert_speaker(&pool, "Resa Wildermuth").await;

    let created = extract_json(
        send(
            &app,
            json_request(
                "POST",
                "/api/camps/ATL2024/talks",
                &talk_body("Async Rust", Some(shawn)),
            ),
        )
        .await,
    )
    .await;
    let uri = format!("/api/camps/ATL2024/talks/{}", created["talkId"]);

    let body = talk_body("Async Rust", Some(resa));
    let response = send(&app, json_request("PUT", &uri, &body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = extract_json(send(&app, test_request("GET", &uri)).await).await;
    assert_eq!(fetched["speaker"]["name"], "Resa Wildermuth");
}

#[tokio::test]
async fn test_update_unknown_talk() {
    let app = setup_app(setup_test_db().await);
    create_camp(&app, "ATL2024").await;

    let response = send(
        &app,
        json_request(
            "PUT",
            "/api/camps/ATL2024/talks/42",
            &talk_body("Async Rust", None),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_talk() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;
    let speaker_id = insert_speaker(&pool, "Shawn Wildermuth").await;

    let created = extract_json(
        send(
            &app,
            json_request(
                "POST",
                "/api/camps/ATL2024/talks",
                &talk_body("Async Rust", Some(speaker_id)),
            ),
        )
        .await,
    )
    .await;
    let uri = format!("/api/camps/ATL2024/talks/{}", created["talkId"]);

    let response = send(&app, test_request("DELETE", &uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(count(&pool, "talks").await, 0);

    let response = send(&app, test_request("DELETE", &uri)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response).await;
    assert_eq!(
        body["error"]["message"],
        format!(
            "No talks exist for moniker: ATL2024 and id: {}",
            created["talkId"]
        )
    );
}

// =============================================================================
// Failure translation
// =============================================================================

#[tokio::test]
async fn test_rejected_commit_is_bad_request() {
    let pool = setup_test_db().await;
    create_camp(&setup_app(pool.clone()), "ATL2024").await;

    let app = faulty_app(&pool, Fault::RejectCommits);

    let mut body = camp_body("ATL2024");
    body["name"] = json!("Renamed");
    let response = send(&app, json_request("PUT", "/api/camps/ATL2024", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "PERSISTENCE_REJECTED");

    let response = send(&app, test_request("DELETE", "/api/camps/ATL2024")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(count(&pool, "camps").await, 1);
}

#[tokio::test]
async fn test_storage_failure_is_generic_500() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    pool.close().await;

    let response = send(&app, test_request("GET", "/api/camps")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(body["error"]["message"], "Database Failure");
}

#[tokio::test]
async fn test_lost_talk_entry_is_server_error() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;
    let speaker_id = insert_speaker(&pool, "Shawn Wildermuth").await;

    let app = faulty_app(&pool, Fault::ForgetEntries);
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/camps/ATL2024/talks",
            &talk_body("Async Rust", Some(speaker_id)),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::LOCATION).is_none());

    let body = extract_json(response).await;
    assert_eq!(body["error"]["message"], "Database Failure");
}

#[tokio::test]
async fn test_seed_stops_when_commit_has_no_effect() {
    let pool = setup_test_db().await;
    let mut repo = FaultyRepository {
        inner: SqliteCampRepository::new(pool.clone()),
        fault: Fault::RejectCommits,
    };

    assert!(seed::seed_sample_data(&mut repo).await.is_err());
    assert_eq!(count(&pool, "talks").await, 0);
}

// =============================================================================
// Request decoding
// =============================================================================

#[tokio::test]
async fn test_wrong_typed_camp_body_is_validation_failure() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());

    let mut body = camp_body("ATL2024");
    body["length"] = json!("one");
    let response = send(&app, json_request("POST", "/api/camps", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "application/json"
    );

    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(count(&pool, "camps").await, 0);
}

#[tokio::test]
async fn test_malformed_json_is_validation_failure() {
    let app = setup_app(setup_test_db().await);
    create_camp(&app, "ATL2024").await;

    let request = Request::builder()
        .method("PUT")
        .uri("/api/camps/ATL2024")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\":"))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_wrong_typed_talk_body_is_validation_failure() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());
    create_camp(&app, "ATL2024").await;
    let speaker_id = insert_speaker(&pool, "Shawn Wildermuth").await;

    let mut body = talk_body("Async Rust", Some(speaker_id));
    body["level"] = json!("advanced");
    let response = send(&app, json_request("POST", "/api/camps/ATL2024/talks", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(count(&pool, "talks").await, 0);
}

#[tokio::test]
async fn test_bad_include_talks_flag_is_validation_failure() {
    let app = setup_app(setup_test_db().await);

    let response = send(&app, test_request("GET", "/api/camps?includeTalks=yes")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_event_date_with_utc_designator() {
    let app = setup_app(setup_test_db().await);

    for (moniker, event_date) in [
        ("ATL2024", "2024-03-01T00:00:00Z"),
        ("NYC2024", "2024-03-01T00:00:00.000+00:00"),
    ] {
        let mut body = camp_body(moniker);
        body["eventDate"] = json!(event_date);
        let response = send(&app, json_request("POST", "/api/camps", &body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let uri = format!("/api/camps/{}", moniker);
        let fetched = extract_json(send(&app, test_request("GET", &uri)).await).await;
        assert_eq!(fetched["eventDate"], "2024-03-01T00:00:00");
    }

    let response = send(&app, test_request("GET", "/api/camps/search?date=2024-03-01")).await;
    let found = extract_json(response).await;
    assert_eq!(found.as_array().unwrap().len(), 2);
}

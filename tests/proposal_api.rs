//! Integration tests for the proposal REST flow.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;

use fundbridge::auth::StaticTokenVerifier;
use fundbridge::server::{AppState, app_router};
use fundbridge::store::{Database, LibSqlBackend};

async fn start_server() -> (u16, Arc<LibSqlBackend>) {
    let backend = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let db: Arc<dyn Database> = backend.clone();
    let verifier = Arc::new(StaticTokenVerifier::with_tokens([
        ("tok-ada".to_string(), "user_ada".to_string()),
        ("tok-eve".to_string(), "user_eve".to_string()),
    ]));

    let app = app_router(AppState { db, verifier });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (port, backend)
}

fn proposal_body() -> Value {
    json!({
        "personalInfo": {
            "firstName": "Ada",
            "lastName": "Obi",
            "email": "ada@example.com"
        },
        "fundingGoals": {
            "amountRequested": "12500.00",
            "purpose": "Tuition Fees",
            "courseName": "Data Engineering",
            "institutionName": "State University"
        },
        "essayOrStatement": "Why I need funding.",
        "supportingDocuments": [
            {"documentType": "Admission Letter", "url": "https://docs/abc"}
        ]
    })
}

async fn submit(port: u16, body: Value) -> (u16, Value) {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/proposals"))
        .bearer_auth("tok-ada")
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn change_status(port: u16, id: &str, status: &str) -> (u16, Value) {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/proposals/{id}/status"))
        .bearer_auth("tok-ada")
        .json(&json!({"status": status}))
        .send()
        .await
        .unwrap();
    let code = resp.status().as_u16();
    (code, resp.json().await.unwrap())
}

#[tokio::test]
async fn submission_requires_identity() {
    let (port, _db) = start_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/proposals"))
        .json(&proposal_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn malformed_body_yields_400() {
    let (port, _db) = start_server().await;
    // Missing required fundingGoals fields.
    let (status, body) = submit(port, json!({"personalInfo": {"firstName": "X"}})).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn submission_starts_in_submitted_status() {
    let (port, _db) = start_server().await;
    let (status, body) = submit(port, proposal_body()).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "submitted");
    assert_eq!(body["data"]["fundingGoals"]["purpose"], "Tuition Fees");
    // No profile exists for this identity yet, so nothing to link.
    assert!(body["data"].get("profileId").is_none());
}

#[tokio::test]
async fn submission_links_existing_profile() {
    let (port, db) = start_server().await;
    let client = reqwest::Client::new();

    // Onboard first so a profile exists.
    client
        .post(format!("http://127.0.0.1:{port}/api/onboarding"))
        .bearer_auth("tok-ada")
        .json(&json!({"role": "student", "personalDetails": {"name": "Ada"}}))
        .send()
        .await
        .unwrap();

    let (status, body) = submit(port, proposal_body()).await;
    assert_eq!(status, 200);

    let profile = db.get_profile("user_ada").await.unwrap().unwrap();
    assert_eq!(
        body["data"]["profileId"].as_str().unwrap(),
        profile.id.to_string()
    );

    // And the listing endpoint returns it.
    let resp = client
        .get(format!("http://127.0.0.1:{port}/api/proposals"))
        .bearer_auth("tok-ada")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let listed: Value = resp.json().await.unwrap();
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn fetch_unknown_proposal_yields_404() {
    let (port, _db) = start_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .get(format!(
            "http://127.0.0.1:{port}/api/proposals/00000000-0000-0000-0000-000000000000"
        ))
        .bearer_auth("tok-ada")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn linked_proposal_is_hidden_from_other_identities() {
    let (port, _db) = start_server().await;
    let client = reqwest::Client::new();

    // Onboard so the submission gets linked to Ada's profile.
    client
        .post(format!("http://127.0.0.1:{port}/api/onboarding"))
        .bearer_auth("tok-ada")
        .json(&json!({"role": "student", "personalDetails": {"name": "Ada"}}))
        .send()
        .await
        .unwrap();
    let (_, body) = submit(port, proposal_body()).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Another identity cannot read it nor drive its lifecycle.
    let resp = client
        .get(format!("http://127.0.0.1:{port}/api/proposals/{id}"))
        .bearer_auth("tok-eve")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/proposals/{id}/status"))
        .bearer_auth("tok-eve")
        .json(&json!({"status": "under_review"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // The owner still can.
    let resp = client
        .get(format!("http://127.0.0.1:{port}/api/proposals/{id}"))
        .bearer_auth("tok-ada")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn status_follows_lifecycle() {
    let (port, _db) = start_server().await;
    let (_, body) = submit(port, proposal_body()).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // submitted → approved skips review and is rejected.
    let (status, _) = change_status(port, &id, "approved").await;
    assert_eq!(status, 400);

    let (status, body) = change_status(port, &id, "under_review").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "under_review");

    let (status, _) = change_status(port, &id, "approved").await;
    assert_eq!(status, 200);

    // Terminal: no further transitions.
    let (status, _) = change_status(port, &id, "withdrawn").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn unknown_status_value_yields_400() {
    let (port, _db) = start_server().await;
    let (_, body) = submit(port, proposal_body()).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = change_status(port, &id, "escalated").await;
    assert_eq!(status, 400);
}

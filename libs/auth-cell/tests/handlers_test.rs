use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_cell::router::auth_routes;
use shared_config::AppConfig;
use shared_database::memory::MemoryStore;
use shared_database::AppState;

fn test_app() -> Router {
    let config = AppConfig {
        data_api_url: String::new(),
        data_api_key: String::new(),
        data_source: "test".to_string(),
        database: "clinic_reservation".to_string(),
    };
    let state = Arc::new(AppState::with_store(config, Arc::new(MemoryStore::new())));
    auth_routes(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn signup_creates_doctor_and_patient_accounts() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/signup",
            json!({ "email": "doc@clinic.test", "password": "hunter22", "is_doctor": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["role"], json!("doctor"));

    let response = app
        .oneshot(post_json(
            "/signup",
            json!({ "email": "pat@clinic.test", "password": "hunter22" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["role"], json!("patient"));
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = test_app();

    let signup = post_json(
        "/signup",
        json!({ "email": "doc@clinic.test", "password": "hunter22", "is_doctor": true }),
    );
    let response = app.clone().oneshot(signup).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Same email, different role: still rejected.
    let response = app
        .oneshot(post_json(
            "/signup",
            json!({ "email": "doc@clinic.test", "password": "other" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_verifies_the_password_and_returns_the_role() {
    let app = test_app();

    app.clone()
        .oneshot(post_json(
            "/signup",
            json!({ "email": "pat@clinic.test", "password": "hunter22" }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/login",
            json!({ "email": "pat@clinic.test", "password": "hunter22" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], json!("patient"));

    let response = app
        .clone()
        .oneshot(post_json(
            "/login",
            json!({ "email": "pat@clinic.test", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(post_json(
            "/login",
            json!({ "email": "ghost@clinic.test", "password": "hunter22" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

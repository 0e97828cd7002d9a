//! Shared helpers for the REST API integration tests.
//!
//! Each test builds a full router over a fresh tempdir-backed SQLite
//! database and drives it in-process with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

use campusd::admissions::{CutoffRow, CutoffTable};
use campusd::auth::TokenSigner;
use campusd::config::ServerConfig;
use campusd::rest::build_router;
use campusd::storage::Storage;
use campusd::AppContext;

/// Build a router plus its context over a fresh database.
///
/// The tempdir is kept for the process lifetime so the SQLite file stays
/// valid while the test runs.
pub async fn test_app() -> (Router, Arc<AppContext>) {
    let data_dir = tempfile::tempdir().unwrap().keep();
    let config = Arc::new(ServerConfig::new(
        Some(0),
        Some(data_dir.clone()),
        Some("warn".to_string()),
        None,
        None,
    ));
    let storage = Arc::new(Storage::new(&data_dir).await.unwrap());
    let signer = Arc::new(TokenSigner::from_secret("test-secret", 1));

    let ctx = Arc::new(AppContext {
        config,
        storage,
        cutoffs: Arc::new(CutoffTable::from_rows(fixture_rows())),
        signer,
        started_at: std::time::Instant::now(),
    });
    (build_router(ctx.clone()), ctx)
}

/// A small but realistic slice of the cutoff reference data.
pub fn fixture_rows() -> Vec<CutoffRow> {
    let rows = [
        ("고려대학교", "컴퓨터학과", "서울", 2024u16, 92.5),
        ("고려대학교", "컴퓨터학과", "서울", 2023, 91.0),
        ("고려대학교", "기계공학부", "서울", 2024, 88.0),
        ("서울대학교", "의예과", "서울", 2024, 98.5),
        ("부산대학교", "기계공학부", "부산", 2024, 78.0),
        ("부산대학교", "컴퓨터공학과", "부산", 2024, 80.5),
    ];
    rows.into_iter()
        .map(|(u, d, r, year, cutoff)| CutoffRow {
            university: u.to_string(),
            department: d.to_string(),
            region: r.to_string(),
            year,
            cutoff,
        })
        .collect()
}

/// Send one request and return (status, parsed JSON body).
pub async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Register a user and return their bearer token.
pub async fn register(app: &Router, email: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "correct horse",
            "name": name,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

/// The stable error code from an error envelope.
pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or("")
}

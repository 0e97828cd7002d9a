//! Public admission-data routes: search, cutoff history, recommendations.

mod common;

use axum::http::StatusCode;
use common::{error_code, send, test_app};

#[tokio::test]
async fn search_matches_abbreviated_names() {
    let (app, _ctx) = test_app().await;

    // "고려대" should find "고려대학교" without auth
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/universities?q=%EA%B3%A0%EB%A0%A4%EB%8C%80",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names = body["universities"].as_array().unwrap();
    assert_eq!(names.len(), 1);
    assert_eq!(names[0], "고려대학교");
}

#[tokio::test]
async fn search_filters_by_region() {
    let (app, _ctx) = test_app().await;

    // "대학" matches every fixture university; region narrows to Busan
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/universities?q=%EB%8C%80%ED%95%99&region=%EB%B6%80%EC%82%B0",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names = body["universities"].as_array().unwrap();
    assert_eq!(names.len(), 1);
    assert_eq!(names[0], "부산대학교");
}

#[tokio::test]
async fn search_requires_a_query() {
    let (app, _ctx) = test_app().await;
    let (status, body) = send(&app, "GET", "/api/v1/universities?q=", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_ARGUMENT");
}

#[tokio::test]
async fn cutoff_history_is_fuzzy_on_department() {
    let (app, _ctx) = test_app().await;

    // "컴퓨터학부" vs stored "컴퓨터학과": suffix noise is stripped
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/universities/%EA%B3%A0%EB%A0%A4%EB%8C%80/cutoffs?department=%EC%BB%B4%ED%93%A8%ED%84%B0%ED%95%99%EB%B6%80",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["cutoffs"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // newest year first among equal-score matches
    assert_eq!(rows[0]["year"], 2024);
    assert_eq!(rows[0]["cutoff"], 92.5);
    assert_eq!(rows[1]["year"], 2023);
}

#[tokio::test]
async fn cutoffs_for_unknown_department_are_empty() {
    let (app, _ctx) = test_app().await;
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/universities/%EA%B3%A0%EB%A0%A4%EB%8C%80/cutoffs?department=law",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["cutoffs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn recommendations_are_closest_first_within_margin() {
    let (app, _ctx) = test_app().await;

    // fixture cutoffs: 78.0, 80.5, 88.0, 91.0, 92.5, 98.5
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/universities/recommend?score=80&margin=3",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0]["cutoff"], 80.5);
    assert_eq!(recs[1]["cutoff"], 78.0);
}

#[tokio::test]
async fn recommendation_score_must_be_sane() {
    let (app, _ctx) = test_app().await;
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/universities/recommend?score=-5",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_ARGUMENT");
}

// rest/routes/universities.rs — public admission cutoff lookups.
//
// These routes serve reference data loaded from the cutoff CSV at boot,
// so they sit outside the auth layer. An empty table is not an error:
// searches just come back empty.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::error::ApiError;
use crate::AppContext;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub region: Option<String>,
    pub limit: Option<usize>,
}

pub async fn search(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    if params.q.trim().is_empty() {
        return Err(ApiError::Invalid("q must not be empty".to_string()));
    }
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let names = ctx
        .cutoffs
        .search(&params.q, params.region.as_deref(), limit);
    Ok(Json(json!({ "universities": names })))
}

#[derive(Deserialize)]
pub struct CutoffsQuery {
    pub department: String,
}

/// Cutoff history for one university/department pair, best match first.
pub async fn cutoffs(
    State(ctx): State<Arc<AppContext>>,
    Path(name): Path<String>,
    Query(params): Query<CutoffsQuery>,
) -> Result<Json<Value>, ApiError> {
    if params.department.trim().is_empty() {
        return Err(ApiError::Invalid("department must not be empty".to_string()));
    }
    let rows = ctx.cutoffs.department_cutoffs(&name, &params.department);
    Ok(Json(json!({ "university": name, "cutoffs": rows })))
}

#[derive(Deserialize)]
pub struct RecommendQuery {
    pub score: f64,
    pub margin: Option<f64>,
    pub limit: Option<usize>,
}

pub async fn recommend(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<RecommendQuery>,
) -> Result<Json<Value>, ApiError> {
    if !params.score.is_finite() || params.score < 0.0 {
        return Err(ApiError::Invalid(
            "score must be a non-negative number".to_string(),
        ));
    }
    let margin = params.margin.unwrap_or(5.0);
    if !margin.is_finite() || margin < 0.0 {
        return Err(ApiError::Invalid(
            "margin must be a non-negative number".to_string(),
        ));
    }
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let rows = ctx.cutoffs.recommend(params.score, margin, limit);
    Ok(Json(json!({ "recommendations": rows })))
}

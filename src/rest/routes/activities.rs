// rest/routes/activities.rs — extracurricular activity records.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::auth::AuthUser;
use crate::rest::error::ApiError;
use crate::rest::validate;
use crate::AppContext;

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let rows = ctx.storage.list_activities(&caller.user_id).await?;
    Ok(Json(json!({ "activities": rows })))
}

#[derive(Deserialize)]
pub struct CreateActivityRequest {
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub occurred_on: String,
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
    Json(body): Json<CreateActivityRequest>,
) -> Result<Json<Value>, ApiError> {
    validate::non_empty(&body.title, "title")?;
    validate::non_empty(&body.category, "category")?;
    validate::date(&body.occurred_on, "occurred_on")?;

    let row = ctx
        .storage
        .create_activity(
            &caller.user_id,
            body.title.trim(),
            body.category.trim(),
            body.description.as_deref(),
            &body.occurred_on,
        )
        .await?;
    Ok(Json(json!({ "activity": row })))
}

pub async fn remove(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !ctx.storage.delete_activity(&caller.user_id, &id).await? {
        return Err(ApiError::NotFound("activity"));
    }
    Ok(Json(json!({ "deleted": true })))
}

// rest/routes/schedules.rs — weekly timetable entries.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Datelike;
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
    let rows = ctx.storage.list_schedules(&caller.user_id).await?;
    Ok(Json(json!({ "schedules": rows })))
}

/// Entries for the current local weekday (home-screen "today" strip).
pub async fn today(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let dow = chrono::Local::now().weekday().num_days_from_monday() as i64;
    let rows = ctx
        .storage
        .list_schedules_for_day(&caller.user_id, dow)
        .await?;
    Ok(Json(json!({ "day_of_week": dow, "schedules": rows })))
}

#[derive(Deserialize)]
pub struct CreateScheduleRequest {
    pub title: String,
    pub day_of_week: i64,
    pub starts_at: String,
    pub ends_at: String,
    pub location: Option<String>,
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
    Json(body): Json<CreateScheduleRequest>,
) -> Result<Json<Value>, ApiError> {
    validate::non_empty(&body.title, "title")?;
    validate::day_of_week(body.day_of_week)?;
    validate::time_range(&body.starts_at, &body.ends_at)?;

    let row = ctx
        .storage
        .create_schedule(
            &caller.user_id,
            body.title.trim(),
            body.day_of_week,
            &body.starts_at,
            &body.ends_at,
            body.location.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "schedule": row })))
}

pub async fn remove(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !ctx.storage.delete_schedule(&caller.user_id, &id).await? {
        return Err(ApiError::NotFound("schedule"));
    }
    Ok(Json(json!({ "deleted": true })))
}

// rest/routes/dashboard.rs — the home-screen aggregate.

use axum::{extract::State, Extension, Json};
use chrono::Datelike;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::auth::AuthUser;
use crate::rest::error::ApiError;
use crate::rest::routes::grades::compute_summary;
use crate::AppContext;

/// One round trip for the home screen: today's timetable, the latest
/// semester's GPA, and the unanswered-question badge count.
pub async fn dashboard(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let dow = chrono::Local::now().weekday().num_days_from_monday() as i64;
    let today = ctx
        .storage
        .list_schedules_for_day(&caller.user_id, dow)
        .await?;

    let grades = ctx.storage.list_grades(&caller.user_id, None).await?;
    let summary = compute_summary(&grades);
    let latest = summary.semesters.first();

    let unanswered = ctx.storage.count_unanswered(&caller.user_id).await?;

    Ok(Json(json!({
        "today": { "day_of_week": dow, "schedules": today },
        "gpa": {
            "cumulative": summary.cumulative_gpa,
            "latest_semester": latest.map(|s| s.semester.clone()),
            "latest_gpa": latest.and_then(|s| s.gpa),
            "total_credits": summary.total_credits,
        },
        "unanswered_questions": unanswered,
    })))
}

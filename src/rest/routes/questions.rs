// rest/routes/questions.rs — counseling questions and answers.
//
// Students post questions and read their own; counselors see the shared
// inbox (`/questions/all`, unanswered first) and post answers.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::auth::AuthUser;
use crate::rest::error::ApiError;
use crate::rest::validate;
use crate::AppContext;

pub async fn list_mine(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let rows = ctx.storage.list_questions(&caller.user_id).await?;
    Ok(Json(json!({ "questions": rows })))
}

#[derive(Deserialize)]
pub struct ListAllQuery {
    pub limit: Option<i64>,
}

pub async fn list_all(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
    Query(params): Query<ListAllQuery>,
) -> Result<Json<Value>, ApiError> {
    if !caller.is_counselor() {
        return Err(ApiError::Forbidden);
    }
    let limit = params.limit.unwrap_or(100).clamp(1, 500);
    let rows = ctx.storage.list_all_questions(limit).await?;
    Ok(Json(json!({ "questions": rows })))
}

#[derive(Deserialize)]
pub struct CreateQuestionRequest {
    pub title: String,
    pub body: String,
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
    Json(body): Json<CreateQuestionRequest>,
) -> Result<Json<Value>, ApiError> {
    validate::non_empty(&body.title, "title")?;
    validate::non_empty(&body.body, "body")?;

    let row = ctx
        .storage
        .create_question(&caller.user_id, body.title.trim(), &body.body)
        .await?;
    Ok(Json(json!({ "question": row })))
}

/// A question with its answers. Authors and counselors only — other
/// students get the same 404 as a nonexistent id.
pub async fn get_one(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let question = ctx
        .storage
        .get_question(&id)
        .await?
        .ok_or(ApiError::NotFound("question"))?;

    if question.user_id != caller.user_id && !caller.is_counselor() {
        return Err(ApiError::NotFound("question"));
    }

    let answers = ctx.storage.list_answers(&id).await?;
    Ok(Json(json!({ "question": question, "answers": answers })))
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub body: String,
}

pub async fn answer(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<AnswerRequest>,
) -> Result<Json<Value>, ApiError> {
    if !caller.is_counselor() {
        return Err(ApiError::Forbidden);
    }
    validate::non_empty(&body.body, "body")?;

    if ctx.storage.get_question(&id).await?.is_none() {
        return Err(ApiError::NotFound("question"));
    }

    let row = ctx
        .storage
        .create_answer(&id, &caller.user_id, &body.body)
        .await?;
    Ok(Json(json!({ "answer": row })))
}

// rest/routes/auth.rs — registration, login, current-user lookup.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::auth::AuthUser;
use crate::rest::error::ApiError;
use crate::rest::validate;
use crate::storage::UserRow;
use crate::AppContext;

/// Public view of a user row — everything except the password hash.
fn user_json(user: &UserRow) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "name": user.name,
        "department": user.department,
        "admission_year": user.admission_year,
        "role": user.role,
        "created_at": user.created_at,
    })
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub admission_year: i64,
}

pub async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    validate::non_empty(&body.name, "name")?;
    if !body.email.contains('@') {
        return Err(ApiError::Invalid("email must contain '@'".to_string()));
    }
    if body.password.len() < 8 {
        return Err(ApiError::Invalid(
            "password must be at least 8 characters".to_string(),
        ));
    }

    // Checked up front for a friendly message; the UNIQUE constraint still
    // backstops the race between check and insert.
    if ctx.storage.get_user_by_email(&body.email).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "an account for {} already exists",
            body.email.to_lowercase()
        )));
    }

    let hash = crate::auth::hash_password(&body.password)?;
    let user = ctx
        .storage
        .create_user(
            &body.email,
            &hash,
            body.name.trim(),
            body.department.trim(),
            body.admission_year,
        )
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE") {
                ApiError::Conflict("email is already registered".to_string())
            } else {
                ApiError::Internal(e)
            }
        })?;

    let token = ctx.signer.issue(&user.id, &user.role)?;
    Ok(Json(json!({ "user": user_json(&user), "token": token })))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = ctx
        .storage
        .get_user_by_email(&body.email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !crate::auth::verify_password(&body.password, &user.password_hash) {
        // Same response for unknown email and wrong password.
        return Err(ApiError::Unauthorized);
    }

    let token = ctx.signer.issue(&user.id, &user.role)?;
    Ok(Json(json!({ "user": user_json(&user), "token": token })))
}

pub async fn me(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let user = ctx
        .storage
        .get_user(&caller.user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(json!({ "user": user_json(&user) })))
}

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::{NewUser, Role, UserPublic};
use crate::routes::extract::{Json};
use crate::routes::AppState;
use crate::services::credentials;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<NewUser>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let user = credentials::register(&state.db, body, state.config.admin_email.as_deref())?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": UserPublic::from(user),
        })),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = credentials::authenticate(&state.db, &body.email, &body.password)?;
    let token = state.tokens.issue(&user.id, user.role)?;

    Ok(Json(LoginResponse {
        token,
        role: user.role,
    }))
}

/// Tokens are stateless, so there is nothing to revoke server-side.
pub async fn logout() -> Json<Value> {
    tracing::debug!("User logged out");
    Json(json!({ "message": "Logout successful" }))
}

use axum::extract::State;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::{UserPatch, UserPublic};
use crate::routes::extract::{Json, Path};
use crate::routes::AppState;
use crate::services::credentials;

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<UserPublic>>> {
    let users = credentials::list_users(&state.db)?;
    Ok(Json(users.into_iter().map(UserPublic::from).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserPublic>> {
    Ok(Json(credentials::get_user(&state.db, &id)?.into()))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UserPatch>,
) -> AppResult<Json<UserPublic>> {
    Ok(Json(credentials::update_user(&state.db, &id, body)?.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    credentials::delete_user(&state.db, &id)?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

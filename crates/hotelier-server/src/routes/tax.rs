use axum::extract::State;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::{TaxRate, TaxRateInput};
use crate::routes::extract::{Json, Path};
use crate::routes::AppState;
use crate::services::tax;

/// GET /admin/tax/all
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<TaxRate>>> {
    Ok(Json(tax::list_rates(&state.db)?))
}

/// PUT /admin/tax
pub async fn upsert(
    State(state): State<AppState>,
    Json(body): Json<TaxRateInput>,
) -> AppResult<Json<TaxRate>> {
    Ok(Json(tax::upsert_rate(&state.db, body)?))
}

/// DELETE /admin/tax/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    tax::delete_rate(&state.db, &id)?;
    Ok(Json(json!({ "message": "Tax rate deleted" })))
}

use axum::{extract::State, http::StatusCode, Extension};
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::error::AppResult;
use crate::models::{BookingDetails, BookingPatch, NewBooking};
use crate::routes::extract::{Json, Path};
use crate::routes::AppState;
use crate::services::bookings;

/// GET /booking/allBookings
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
) -> AppResult<Json<Vec<BookingDetails>>> {
    Ok(Json(bookings::list_bookings(&state.db, &caller)?))
}

/// GET /booking/user/{id}
pub async fn list_for_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<BookingDetails>>> {
    Ok(Json(bookings::list_user_bookings(&state.db, &caller, &user_id)?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Path(id): Path<String>,
) -> AppResult<Json<BookingDetails>> {
    Ok(Json(bookings::get_booking(&state.db, &caller, &id)?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Json(body): Json<NewBooking>,
) -> AppResult<(StatusCode, Json<BookingDetails>)> {
    let booking = bookings::create_booking(&state.db, &caller, body)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Path(id): Path<String>,
    Json(body): Json<BookingPatch>,
) -> AppResult<Json<Value>> {
    let booking = bookings::update_booking(&state.db, &caller, &id, body)?;
    Ok(Json(json!({
        "message": "Booking updated successfully.",
        "booking": booking,
    })))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    bookings::cancel_booking(&state.db, &caller, &id)?;
    Ok(Json(json!({ "message": "Booking cancelled successfully." })))
}

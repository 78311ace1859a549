use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{Hotel, HotelPatch, NewHotel, NewReview};
use crate::routes::extract::{Json, Path, Query};
use crate::routes::AppState;
use crate::services::hotels::{self, HotelSearch};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
}

/// Empty query values count as missing.
fn required(value: Option<String>, message: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}

fn search(state: &AppState, search: HotelSearch, empty: &str) -> AppResult<Json<Vec<Hotel>>> {
    let hotels = hotels::search_hotels(&state.db, &search)?;
    if hotels.is_empty() {
        return Err(AppError::NotFound(empty.to_string()));
    }
    Ok(Json(hotels))
}

/// GET /admin/hotel/all-hotels
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Hotel>>> {
    Ok(Json(hotels::list_hotels(&state.db)?))
}

pub async fn search_by_name(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Hotel>>> {
    let name = required(query.name, "Please provide a hotel name for the search.")?;
    search(
        &state,
        HotelSearch::Name(name),
        "No hotels found with the specified name.",
    )
}

pub async fn search_by_country(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Hotel>>> {
    let country = required(query.country, "Please provide a country name for the search.")?;
    search(
        &state,
        HotelSearch::Country(country),
        "No hotels found in the specified country.",
    )
}

pub async fn search_by_city(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Hotel>>> {
    let city = required(query.city, "Please provide a city name for the search.")?;
    search(
        &state,
        HotelSearch::City(city),
        "No hotels found in the specified city.",
    )
}

pub async fn search_by_province(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Hotel>>> {
    let province = required(query.province, "Please provide a province name for the search.")?;
    search(
        &state,
        HotelSearch::Province(province),
        "No hotels found in the specified province.",
    )
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Hotel>> {
    Ok(Json(hotels::get_hotel(&state.db, &id)?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewHotel>,
) -> AppResult<(StatusCode, Json<Hotel>)> {
    let hotel = hotels::create_hotel(&state.db, body)?;
    Ok((StatusCode::CREATED, Json(hotel)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<HotelPatch>,
) -> AppResult<Json<Hotel>> {
    Ok(Json(hotels::update_hotel(&state.db, &id, body)?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let deleted_rooms = hotels::delete_hotel(&state.db, &id)?;
    Ok(Json(json!({
        "message": "Deleted Hotel",
        "deletedRooms": deleted_rooms,
    })))
}

/// POST /admin/hotel/{id}/reviews
pub async fn add_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NewReview>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let review = hotels::add_review(&state.db, &id, body)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Review posted successfully.",
            "review": review,
        })),
    ))
}

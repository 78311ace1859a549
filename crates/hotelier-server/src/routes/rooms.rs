use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{NewRoom, Room, RoomFilter, RoomPatch};
use crate::routes::extract::{Json, Path, Query};
use crate::routes::AppState;
use crate::services::rooms;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameQuery {
    pub room_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub price: Option<String>,
}

fn found(rooms: Vec<Room>, empty: &str) -> AppResult<Json<Vec<Room>>> {
    if rooms.is_empty() {
        return Err(AppError::NotFound(empty.to_string()));
    }
    Ok(Json(rooms))
}

/// GET /admin/room/allRooms
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Room>>> {
    Ok(Json(rooms::list_rooms(&state.db)?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Room>> {
    Ok(Json(rooms::get_room(&state.db, &id)?))
}

/// GET /admin/room/byHotel/{id}
pub async fn by_hotel(
    State(state): State<AppState>,
    Path(hotel_id): Path<String>,
) -> AppResult<Json<Vec<Room>>> {
    found(
        rooms::rooms_for_hotel(&state.db, &hotel_id)?,
        "No rooms found for this hotel.",
    )
}

/// GET /admin/room/searchRoomByName?roomName=suite
pub async fn search_by_name(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> AppResult<Json<Vec<Room>>> {
    let name = query
        .room_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Please provide a room name for the search.".into()))?;
    let filter = RoomFilter {
        name_contains: Some(name),
        ..RoomFilter::default()
    };
    found(
        rooms::search_rooms(&state.db, &filter)?,
        "No rooms found with the specified name.",
    )
}

/// GET /admin/room/searchRoomByPrice?price=120
pub async fn search_by_price(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> AppResult<Json<Vec<Room>>> {
    let raw = query
        .price
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Please provide a price for the search.".into()))?;
    let price: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid price: {raw}")))?;
    let filter = RoomFilter {
        price: Some(price),
        ..RoomFilter::default()
    };
    found(
        rooms::search_rooms(&state.db, &filter)?,
        "No rooms found with the specified price.",
    )
}

/// GET /admin/room/searchRoomByAmenities?roomAmenities.Wifi=true
pub async fn search_by_amenities(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<Vec<Room>>> {
    let filter =
        RoomFilter::from_amenity_query(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    found(
        rooms::search_rooms(&state.db, &filter)?,
        "No rooms found with the specified amenities.",
    )
}

/// GET /admin/room/searchRoomByBedType?KingBed=true
pub async fn search_by_bed_type(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<Vec<Room>>> {
    let filter =
        RoomFilter::from_bed_type_query(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if filter.is_empty() {
        return Err(AppError::BadRequest("Invalid bed type provided.".into()));
    }
    found(
        rooms::search_rooms(&state.db, &filter)?,
        "No rooms found with the specified bed type.",
    )
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewRoom>,
) -> AppResult<(StatusCode, Json<Room>)> {
    let room = rooms::create_room(&state.db, body)?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RoomPatch>,
) -> AppResult<Json<Room>> {
    Ok(Json(rooms::update_room(&state.db, &id, body)?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    rooms::delete_room(&state.db, &id)?;
    Ok(Json(json!({ "message": "Deleted Room" })))
}

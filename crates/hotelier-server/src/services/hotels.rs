//! Hotels with their embedded reviews and room references.

use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{
    Hotel, HotelAddress, HotelAmenities, HotelDescription, HotelDetails, HotelPatch, NewHotel,
    NewReview, Patch, Review,
};
use crate::services::{credentials, rooms};

const HOTEL_COLUMNS: &str = "id, name, country, city, province, postal_code, rating, pool, gym, airport_shuttle, pets, images, description, airport_distance, downtown_distance, sea_distance, created_at, updated_at";

/// Which hotels a search should return.
#[derive(Debug, Clone, PartialEq)]
pub enum HotelSearch {
    /// Case-insensitive substring of the name.
    Name(String),
    Country(String),
    City(String),
    Province(String),
}

impl HotelSearch {
    fn predicate(&self) -> (&'static str, &str) {
        match self {
            HotelSearch::Name(name) => ("instr(fold_case(name), fold_case(?1)) > 0", name),
            HotelSearch::Country(country) => ("country = ?1", country),
            HotelSearch::City(city) => ("city = ?1", city),
            HotelSearch::Province(province) => ("province = ?1", province),
        }
    }
}

fn hotel_from_row(row: &Row<'_>) -> rusqlite::Result<Hotel> {
    Ok(Hotel {
        id: row.get(0)?,
        hotel_name: row.get(1)?,
        hotel_address: HotelAddress {
            country: row.get(2)?,
            city: row.get(3)?,
            province: row.get(4)?,
            postal_code: row.get(5)?,
        },
        hotel_rating: row.get(6)?,
        hotel_amenities: HotelAmenities {
            pool: row.get(7)?,
            gym: row.get(8)?,
            airport_shuttle: row.get(9)?,
            pets: row.get(10)?,
        },
        hotel_description: HotelDescription {
            images: db::json_column(row, 11)?,
            description: row.get(12)?,
        },
        hotel_reviews: Vec::new(),
        hotel_details: HotelDetails {
            airport_distance: row.get(13)?,
            downtown_distance: row.get(14)?,
            sea_distance: row.get(15)?,
        },
        rooms: Vec::new(),
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

/// Fills in the reviews and room references stored beside the hotel row.
fn hydrate(conn: &Connection, mut hotel: Hotel) -> rusqlite::Result<Hotel> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, rating, review_text, created_at FROM hotel_reviews
         WHERE hotel_id = ?1 ORDER BY created_at, rowid",
    )?;
    let reviews: Result<Vec<_>, _> = stmt
        .query_map(rusqlite::params![hotel.id], |row| {
            Ok(Review {
                id: row.get(0)?,
                user_id: row.get(1)?,
                rating: row.get(2)?,
                review_text: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect();
    hotel.hotel_reviews = reviews?;
    hotel.rooms = room_ids(conn, &hotel.id)?;
    Ok(hotel)
}

pub(crate) fn room_ids(conn: &Connection, hotel_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT room_id FROM hotel_rooms WHERE hotel_id = ?1 ORDER BY position")?;
    let ids: Result<Vec<String>, _> = stmt
        .query_map(rusqlite::params![hotel_id], |row| row.get(0))?
        .collect();
    ids
}

pub(crate) fn load_hotel(conn: &Connection, id: &str) -> rusqlite::Result<Option<Hotel>> {
    let hotel = conn
        .query_row(
            &format!("SELECT {HOTEL_COLUMNS} FROM hotels WHERE id = ?1"),
            rusqlite::params![id],
            hotel_from_row,
        )
        .optional()?;
    hotel.map(|h| hydrate(conn, h)).transpose()
}

pub(crate) fn hotel_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM hotels WHERE id = ?1)",
        rusqlite::params![id],
        |row| row.get(0),
    )
}

pub(crate) fn hotel_lists_room(
    conn: &Connection,
    hotel_id: &str,
    room_id: &str,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM hotel_rooms WHERE hotel_id = ?1 AND room_id = ?2)",
        rusqlite::params![hotel_id, room_id],
        |row| row.get(0),
    )
}

fn room_booked_at(conn: &Connection, hotel_id: &str, room_id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM bookings WHERE hotel_id = ?1 AND room_id = ?2)",
        rusqlite::params![hotel_id, room_id],
        |row| row.get(0),
    )
}

fn query_hotels(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<Hotel>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HOTEL_COLUMNS} FROM hotels {filter} ORDER BY created_at, name"
    ))?;
    let hotels: Result<Vec<_>, _> = stmt.query_map(params, hotel_from_row)?.collect();
    hotels?.into_iter().map(|h| hydrate(conn, h)).collect()
}

fn validate_rating(rating: Option<f64>) -> AppResult<()> {
    match rating {
        Some(r) if !(0.0..=5.0).contains(&r) => Err(AppError::BadRequest(
            "Rating must be between 0 and 5".into(),
        )),
        _ => Ok(()),
    }
}

fn validate_hotel(hotel: &Hotel) -> AppResult<()> {
    if hotel.hotel_name.trim().is_empty() {
        return Err(AppError::BadRequest("HotelName is required".into()));
    }
    validate_rating(hotel.hotel_rating)
}

/// Drops duplicate room ids, keeping first occurrences, and checks every room exists.
fn resolve_room_refs(conn: &Connection, ids: &[String]) -> AppResult<Vec<String>> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if unique.contains(id) {
            continue;
        }
        if !rooms::room_exists(conn, id)? {
            return Err(AppError::BadRequest(format!("Room {id} not found")));
        }
        unique.push(id.clone());
    }
    Ok(unique)
}

fn write_room_links(conn: &Connection, hotel_id: &str, room_ids: &[String]) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM hotel_rooms WHERE hotel_id = ?1",
        rusqlite::params![hotel_id],
    )?;
    for (position, room_id) in room_ids.iter().enumerate() {
        conn.execute(
            "INSERT INTO hotel_rooms (hotel_id, room_id, position) VALUES (?1, ?2, ?3)",
            rusqlite::params![hotel_id, room_id, position as i64],
        )?;
    }
    Ok(())
}

fn write_hotel(conn: &Connection, hotel: &Hotel) -> AppResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO hotels ({HOTEL_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name, country = excluded.country, city = excluded.city,
                province = excluded.province, postal_code = excluded.postal_code,
                rating = excluded.rating, pool = excluded.pool, gym = excluded.gym,
                airport_shuttle = excluded.airport_shuttle, pets = excluded.pets,
                images = excluded.images, description = excluded.description,
                airport_distance = excluded.airport_distance,
                downtown_distance = excluded.downtown_distance,
                sea_distance = excluded.sea_distance, updated_at = excluded.updated_at"
        ),
        rusqlite::params![
            hotel.id,
            hotel.hotel_name,
            hotel.hotel_address.country,
            hotel.hotel_address.city,
            hotel.hotel_address.province,
            hotel.hotel_address.postal_code,
            hotel.hotel_rating,
            hotel.hotel_amenities.pool,
            hotel.hotel_amenities.gym,
            hotel.hotel_amenities.airport_shuttle,
            hotel.hotel_amenities.pets,
            serde_json::to_string(&hotel.hotel_description.images)?,
            hotel.hotel_description.description,
            hotel.hotel_details.airport_distance,
            hotel.hotel_details.downtown_distance,
            hotel.hotel_details.sea_distance,
            hotel.created_at,
            hotel.updated_at
        ],
    )?;
    write_room_links(conn, &hotel.id, &hotel.rooms)?;
    Ok(())
}

pub fn list_hotels(pool: &DbPool) -> AppResult<Vec<Hotel>> {
    let conn = pool.get()?;
    Ok(query_hotels(&conn, "", [])?)
}

pub fn search_hotels(pool: &DbPool, search: &HotelSearch) -> AppResult<Vec<Hotel>> {
    let conn = pool.get()?;
    let (predicate, value) = search.predicate();
    Ok(query_hotels(
        &conn,
        &format!("WHERE {predicate}"),
        rusqlite::params![value],
    )?)
}

pub fn get_hotel(pool: &DbPool, id: &str) -> AppResult<Hotel> {
    let conn = pool.get()?;
    load_hotel(&conn, id)?.ok_or_else(|| AppError::NotFound("Cannot find hotel".into()))
}

pub fn create_hotel(pool: &DbPool, new_hotel: NewHotel) -> AppResult<Hotel> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    let now = db::now_timestamp();
    let hotel = Hotel {
        id: Uuid::new_v4().to_string(),
        hotel_name: new_hotel.hotel_name.trim().to_string(),
        hotel_address: new_hotel.hotel_address,
        hotel_rating: new_hotel.hotel_rating,
        hotel_amenities: new_hotel.hotel_amenities,
        hotel_description: new_hotel.hotel_description,
        hotel_reviews: Vec::new(),
        hotel_details: new_hotel.hotel_details,
        rooms: resolve_room_refs(&tx, &new_hotel.rooms)?,
        created_at: now.clone(),
        updated_at: now,
    };
    validate_hotel(&hotel)?;
    write_hotel(&tx, &hotel)?;
    tx.commit()?;

    tracing::info!(hotel_id = %hotel.id, name = %hotel.hotel_name, "Hotel created");
    Ok(hotel)
}

pub fn update_hotel(pool: &DbPool, id: &str, patch: HotelPatch) -> AppResult<Hotel> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    let mut hotel =
        load_hotel(&tx, id)?.ok_or_else(|| AppError::NotFound("Cannot find hotel".into()))?;
    let listed = hotel.rooms.clone();
    patch.apply_to(&mut hotel);
    hotel.rooms = resolve_room_refs(&tx, &hotel.rooms)?;
    for room_id in listed.iter().filter(|r| !hotel.rooms.contains(r)) {
        if room_booked_at(&tx, id, room_id)? {
            return Err(AppError::Conflict(format!(
                "Room {room_id} has bookings at this hotel and cannot be removed from it"
            )));
        }
    }
    hotel.updated_at = db::now_timestamp();
    validate_hotel(&hotel)?;

    write_hotel(&tx, &hotel)?;
    tx.commit()?;
    Ok(hotel)
}

/// Deletes a hotel with its reviews and room links. Rooms that no other hotel
/// lists are deleted too. Refused while bookings reference the hotel.
///
/// Returns the ids of the rooms removed alongside the hotel.
pub fn delete_hotel(pool: &DbPool, id: &str) -> AppResult<Vec<String>> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    if !hotel_exists(&tx, id)? {
        return Err(AppError::NotFound("Cannot find hotel".into()));
    }
    let booked: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM bookings WHERE hotel_id = ?1)",
        rusqlite::params![id],
        |row| row.get(0),
    )?;
    if booked {
        return Err(AppError::Conflict(
            "Hotel has bookings; cancel them before deleting the hotel".into(),
        ));
    }

    let linked = room_ids(&tx, id)?;
    tx.execute("DELETE FROM hotels WHERE id = ?1", rusqlite::params![id])?;

    let mut removed = Vec::new();
    for room_id in linked {
        let still_used: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM hotel_rooms WHERE room_id = ?1)
                 OR EXISTS(SELECT 1 FROM bookings WHERE room_id = ?1)",
            rusqlite::params![room_id],
            |row| row.get(0),
        )?;
        if !still_used {
            tx.execute("DELETE FROM rooms WHERE id = ?1", rusqlite::params![room_id])?;
            removed.push(room_id);
        }
    }
    tx.commit()?;

    tracing::info!(hotel_id = %id, rooms_removed = removed.len(), "Hotel deleted");
    Ok(removed)
}

/// Appends a review. Both the reviewer and the hotel must exist.
pub fn add_review(pool: &DbPool, hotel_id: &str, review: NewReview) -> AppResult<Review> {
    validate_rating(Some(review.rating))?;

    let conn = pool.get()?;
    if !credentials::user_exists(&conn, &review.user_id)? {
        return Err(AppError::NotFound("User not found.".into()));
    }
    if !hotel_exists(&conn, hotel_id)? {
        return Err(AppError::NotFound("Hotel not found.".into()));
    }

    let review = Review {
        id: Uuid::new_v4().to_string(),
        user_id: review.user_id,
        rating: review.rating,
        review_text: review.review_text,
        created_at: db::now_timestamp(),
    };
    conn.execute(
        "INSERT INTO hotel_reviews (id, hotel_id, user_id, rating, review_text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            review.id,
            hotel_id,
            review.user_id,
            review.rating,
            review.review_text,
            review.created_at
        ],
    )?;
    conn.execute(
        "UPDATE hotels SET updated_at = ?1 WHERE id = ?2",
        rusqlite::params![review.created_at, hotel_id],
    )?;
    Ok(review)
}

//! Rooms and their bookable options.

use std::collections::HashSet;

use rusqlite::{types::Value, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{
    BedType, NewRoom, Room, RoomAmenities, RoomFilter, RoomMeals, RoomOption, RoomOptionInput,
    RoomOptionSpec, RoomPatch,
};
use crate::services::hotels;

const OPTION_COLUMNS: &str = "id, name, square_feet, breakfast, dinner, breakfast_and_dinner, wifi, cable_tv, air_condition, free_cancellation, non_smoking, images, bed_count, vacant_count, price, guest_capacity, single_bed, twin_bed, queen_bed, king_bed";

fn option_from_row(row: &Row<'_>) -> rusqlite::Result<RoomOption> {
    Ok(RoomOption {
        id: row.get(0)?,
        spec: RoomOptionSpec {
            room_name: row.get(1)?,
            square_feet: row.get(2)?,
            room_meals: RoomMeals {
                breakfast: row.get(3)?,
                dinner: row.get(4)?,
                breakfast_and_dinner: row.get(5)?,
            },
            room_amenities: RoomAmenities {
                wifi: row.get(6)?,
                cable_tv: row.get(7)?,
                air_condition: row.get(8)?,
                free_cancellation: row.get(9)?,
                non_smoking: row.get(10)?,
            },
            room_images: db::json_column(row, 11)?,
            number_of_beds: row.get(12)?,
            num_of_empty_rooms: row.get(13)?,
            price: row.get(14)?,
            number_of_guests: row.get(15)?,
            bed_type: BedType {
                single_bed: row.get(16)?,
                twin_bed: row.get(17)?,
                queen_bed: row.get(18)?,
                king_bed: row.get(19)?,
            },
        },
    })
}

pub(crate) fn load_options(conn: &Connection, room_id: &str) -> rusqlite::Result<Vec<RoomOption>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {OPTION_COLUMNS} FROM room_options WHERE room_id = ?1 ORDER BY position"
    ))?;
    let options: Result<Vec<_>, _> = stmt
        .query_map(rusqlite::params![room_id], option_from_row)?
        .collect();
    options
}

pub(crate) fn load_room(conn: &Connection, id: &str) -> rusqlite::Result<Option<Room>> {
    let room = conn
        .query_row(
            "SELECT id, created_at, updated_at FROM rooms WHERE id = ?1",
            rusqlite::params![id],
            |row| {
                Ok(Room {
                    id: row.get(0)?,
                    room_options: Vec::new(),
                    created_at: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            },
        )
        .optional()?;
    match room {
        Some(mut room) => {
            room.room_options = load_options(conn, &room.id)?;
            Ok(Some(room))
        }
        None => Ok(None),
    }
}

/// One option of a room, or `None` if the option does not belong to that room.
pub(crate) fn load_option(
    conn: &Connection,
    room_id: &str,
    option_id: &str,
) -> rusqlite::Result<Option<RoomOption>> {
    conn.query_row(
        &format!("SELECT {OPTION_COLUMNS} FROM room_options WHERE room_id = ?1 AND id = ?2"),
        rusqlite::params![room_id, option_id],
        option_from_row,
    )
    .optional()
}

pub(crate) fn room_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM rooms WHERE id = ?1)",
        rusqlite::params![id],
        |row| row.get(0),
    )
}

fn load_rooms_where(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<Room>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM rooms {filter} ORDER BY created_at, id"
    ))?;
    let ids: Result<Vec<String>, _> = stmt.query_map(params, |row| row.get(0))?.collect();
    let mut rooms = Vec::new();
    for id in ids? {
        if let Some(room) = load_room(conn, &id)? {
            rooms.push(room);
        }
    }
    Ok(rooms)
}

fn validate_option(spec: &RoomOptionSpec) -> AppResult<()> {
    if !spec.price.is_finite() || spec.price < 0.0 {
        return Err(AppError::BadRequest(
            "Price must be a non-negative number".into(),
        ));
    }
    if matches!(spec.square_feet, Some(sq) if !sq.is_finite() || sq < 0.0) {
        return Err(AppError::BadRequest(
            "SquareFeet must be a non-negative number".into(),
        ));
    }
    Ok(())
}

fn write_option(
    conn: &Connection,
    room_id: &str,
    position: usize,
    option: &RoomOption,
) -> AppResult<()> {
    let spec = &option.spec;
    conn.execute(
        &format!(
            "INSERT INTO room_options (room_id, position, {OPTION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
             ON CONFLICT (id) DO UPDATE SET
                position = excluded.position, name = excluded.name,
                square_feet = excluded.square_feet, breakfast = excluded.breakfast,
                dinner = excluded.dinner, breakfast_and_dinner = excluded.breakfast_and_dinner,
                wifi = excluded.wifi, cable_tv = excluded.cable_tv,
                air_condition = excluded.air_condition,
                free_cancellation = excluded.free_cancellation,
                non_smoking = excluded.non_smoking, images = excluded.images,
                bed_count = excluded.bed_count, vacant_count = excluded.vacant_count,
                price = excluded.price, guest_capacity = excluded.guest_capacity,
                single_bed = excluded.single_bed, twin_bed = excluded.twin_bed,
                queen_bed = excluded.queen_bed, king_bed = excluded.king_bed"
        ),
        rusqlite::params![
            room_id,
            position as i64,
            option.id,
            spec.room_name,
            spec.square_feet,
            spec.room_meals.breakfast,
            spec.room_meals.dinner,
            spec.room_meals.breakfast_and_dinner,
            spec.room_amenities.wifi,
            spec.room_amenities.cable_tv,
            spec.room_amenities.air_condition,
            spec.room_amenities.free_cancellation,
            spec.room_amenities.non_smoking,
            serde_json::to_string(&spec.room_images)?,
            spec.number_of_beds,
            spec.num_of_empty_rooms,
            spec.price,
            spec.number_of_guests,
            spec.bed_type.single_bed,
            spec.bed_type.twin_bed,
            spec.bed_type.queen_bed,
            spec.bed_type.king_bed
        ],
    )?;
    Ok(())
}

pub fn list_rooms(pool: &DbPool) -> AppResult<Vec<Room>> {
    let conn = pool.get()?;
    Ok(load_rooms_where(&conn, "", [])?)
}

pub fn get_room(pool: &DbPool, id: &str) -> AppResult<Room> {
    let conn = pool.get()?;
    load_room(&conn, id)?.ok_or_else(|| AppError::NotFound("Room not found.".into()))
}

/// Rooms listed by a hotel, in the hotel's order.
pub fn rooms_for_hotel(pool: &DbPool, hotel_id: &str) -> AppResult<Vec<Room>> {
    let conn = pool.get()?;
    if !hotels::hotel_exists(&conn, hotel_id)? {
        return Err(AppError::NotFound("Hotel not found.".into()));
    }
    let mut rooms = Vec::new();
    for room_id in hotels::room_ids(&conn, hotel_id)? {
        if let Some(room) = load_room(&conn, &room_id)? {
            rooms.push(room);
        }
    }
    Ok(rooms)
}

/// Rooms with at least one option satisfying every predicate in `filter`.
pub fn search_rooms(pool: &DbPool, filter: &RoomFilter) -> AppResult<Vec<Room>> {
    if filter.is_empty() {
        return list_rooms(pool);
    }

    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();
    if let Some(name) = &filter.name_contains {
        clauses.push("instr(fold_case(name), fold_case(?)) > 0".into());
        params.push(Value::Text(name.clone()));
    }
    if let Some(price) = filter.price {
        clauses.push("price = ?".into());
        params.push(Value::Real(price));
    }
    for (flag, wanted) in &filter.flags {
        clauses.push(format!("{} = ?", flag.column()));
        params.push(Value::Integer(i64::from(*wanted)));
    }

    let conn = pool.get()?;
    Ok(load_rooms_where(
        &conn,
        &format!(
            "WHERE id IN (SELECT room_id FROM room_options WHERE {})",
            clauses.join(" AND ")
        ),
        rusqlite::params_from_iter(params),
    )?)
}

pub fn create_room(pool: &DbPool, new_room: NewRoom) -> AppResult<Room> {
    for input in &new_room.room_options {
        validate_option(&input.spec)?;
    }

    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    let now = db::now_timestamp();
    let room = Room {
        id: Uuid::new_v4().to_string(),
        room_options: new_room
            .room_options
            .into_iter()
            .map(|input| RoomOption {
                id: Uuid::new_v4().to_string(),
                spec: input.spec,
            })
            .collect(),
        created_at: now.clone(),
        updated_at: now,
    };

    tx.execute(
        "INSERT INTO rooms (id, created_at, updated_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![room.id, room.created_at, room.updated_at],
    )?;
    for (position, option) in room.room_options.iter().enumerate() {
        write_option(&tx, &room.id, position, option)?;
    }
    tx.commit()?;

    tracing::info!(room_id = %room.id, options = room.room_options.len(), "Room created");
    Ok(room)
}

/// Replaces the option list. Inputs with a known `_id` update that option,
/// inputs without one are added, and options left out are removed unless a
/// booking still references them.
pub fn update_room(pool: &DbPool, id: &str, patch: RoomPatch) -> AppResult<Room> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    let mut room = load_room(&tx, id)?.ok_or_else(|| AppError::NotFound("Room not found.".into()))?;

    if let Some(inputs) = patch.room_options {
        let existing: HashSet<String> = room.room_options.iter().map(|o| o.id.clone()).collect();
        let options = reconcile_options(&existing, inputs)?;

        let kept: HashSet<&str> = options.iter().map(|o| o.id.as_str()).collect();
        for removed in existing.iter().filter(|id| !kept.contains(id.as_str())) {
            let booked: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM bookings WHERE room_option_id = ?1)",
                rusqlite::params![removed],
                |row| row.get(0),
            )?;
            if booked {
                return Err(AppError::Conflict(format!(
                    "Room option {removed} has bookings and cannot be removed"
                )));
            }
            tx.execute(
                "DELETE FROM room_options WHERE id = ?1",
                rusqlite::params![removed],
            )?;
        }
        for (position, option) in options.iter().enumerate() {
            write_option(&tx, &room.id, position, option)?;
        }
        room.room_options = options;
    }

    room.updated_at = db::now_timestamp();
    tx.execute(
        "UPDATE rooms SET updated_at = ?1 WHERE id = ?2",
        rusqlite::params![room.updated_at, room.id],
    )?;
    tx.commit()?;
    Ok(room)
}

fn reconcile_options(
    existing: &HashSet<String>,
    inputs: Vec<RoomOptionInput>,
) -> AppResult<Vec<RoomOption>> {
    let mut seen = HashSet::new();
    let mut options = Vec::with_capacity(inputs.len());
    for input in inputs {
        validate_option(&input.spec)?;
        let id = match input.id {
            Some(id) if existing.contains(&id) => id,
            Some(id) => {
                return Err(AppError::BadRequest(format!(
                    "Room option {id} does not belong to this room"
                )))
            }
            None => Uuid::new_v4().to_string(),
        };
        if !seen.insert(id.clone()) {
            return Err(AppError::BadRequest(format!(
                "Room option {id} appears more than once"
            )));
        }
        options.push(RoomOption {
            id,
            spec: input.spec,
        });
    }
    Ok(options)
}

/// Refused while bookings reference the room; hotel links are dropped with it.
pub fn delete_room(pool: &DbPool, id: &str) -> AppResult<()> {
    let conn = pool.get()?;
    if !room_exists(&conn, id)? {
        return Err(AppError::NotFound("Room not found.".into()));
    }
    let booked: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM bookings WHERE room_id = ?1)",
        rusqlite::params![id],
        |row| row.get(0),
    )?;
    if booked {
        return Err(AppError::Conflict(
            "Room has bookings; cancel them before deleting the room".into(),
        ));
    }
    conn.execute("DELETE FROM rooms WHERE id = ?1", rusqlite::params![id])
        .map_err(|e| AppError::conflict_on_constraint(e, "Room is still referenced"))?;

    tracing::info!(room_id = %id, "Room deleted");
    Ok(())
}

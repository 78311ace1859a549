//! Reservations against room options, with availability and pricing checks.

use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use crate::auth::Identity;
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{
    Booking, BookingDetails, BookingPatch, NewBooking, Patch, RoomOption, UserPublic,
};
use crate::services::availability::{self, Stay};
use crate::services::{credentials, hotels, rooms, tax};

const BOOKING_COLUMNS: &str = "id, user_id, hotel_id, room_id, room_option_id, check_in, check_out, guests, total_price, created_at, updated_at";

fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        user: row.get(1)?,
        hotel: row.get(2)?,
        room: row.get(3)?,
        room_option: row.get(4)?,
        check_in_date: row.get(5)?,
        check_out_date: row.get(6)?,
        number_of_guests: row.get(7)?,
        total_price: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn find_booking(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        rusqlite::params![id],
        booking_from_row,
    )
    .optional()
}

fn query_bookings(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings {filter} ORDER BY check_in, created_at"
    ))?;
    let bookings: Result<Vec<_>, _> = stmt.query_map(params, booking_from_row)?.collect();
    bookings
}

fn populate(conn: &Connection, booking: Booking) -> AppResult<BookingDetails> {
    let dangling =
        |what: &str| AppError::Internal(format!("booking {} references a missing {what}", booking.id));
    let user = credentials::find_user(conn, &booking.user)?.ok_or_else(|| dangling("user"))?;
    let hotel = hotels::load_hotel(conn, &booking.hotel)?.ok_or_else(|| dangling("hotel"))?;
    let room = rooms::load_room(conn, &booking.room)?.ok_or_else(|| dangling("room"))?;

    Ok(BookingDetails {
        id: booking.id,
        user: UserPublic::from(user),
        hotel,
        room,
        room_option: booking.room_option,
        check_in_date: booking.check_in_date,
        check_out_date: booking.check_out_date,
        number_of_guests: booking.number_of_guests,
        total_price: booking.total_price,
        created_at: booking.created_at,
        updated_at: booking.updated_at,
    })
}

fn populate_all(conn: &Connection, bookings: Vec<Booking>) -> AppResult<Vec<BookingDetails>> {
    bookings.into_iter().map(|b| populate(conn, b)).collect()
}

/// The option a reservation targets. Without an explicit id the room must
/// have exactly one option.
fn resolve_option(
    conn: &Connection,
    room_id: &str,
    option_id: Option<&str>,
) -> AppResult<RoomOption> {
    match option_id {
        Some(option_id) => rooms::load_option(conn, room_id, option_id)?.ok_or_else(|| {
            AppError::BadRequest(format!(
                "Room option {option_id} does not belong to room {room_id}"
            ))
        }),
        None => {
            let mut options = rooms::load_options(conn, room_id)?;
            if options.len() == 1 {
                Ok(options.remove(0))
            } else {
                Err(AppError::BadRequest(
                    "RoomOption is required when the room has more than one option".into(),
                ))
            }
        }
    }
}

/// Stays already holding a unit of `option_id` during `window`.
fn booked_stays(
    conn: &Connection,
    option_id: &str,
    window: &Stay,
    exclude_booking: &str,
) -> rusqlite::Result<Vec<Stay>> {
    let mut stmt = conn.prepare(
        "SELECT check_in, check_out FROM bookings
         WHERE room_option_id = ?1 AND check_in < ?2 AND check_out > ?3
           AND id != ?4",
    )?;
    let stays: Result<Vec<_>, _> = stmt
        .query_map(
            rusqlite::params![option_id, window.check_out, window.check_in, exclude_booking],
            |row| {
                Ok(Stay {
                    check_in: row.get(0)?,
                    check_out: row.get(1)?,
                })
            },
        )?
        .collect();
    stays
}

/// Checks every reservation rule for `booking` and fills in its option and
/// total price. The booking itself is left out of the occupancy count.
fn reserve(conn: &Connection, booking: &mut Booking, option_id: Option<&str>) -> AppResult<()> {
    let stay = Stay::new(booking.check_in_date, booking.check_out_date)?;

    if !credentials::user_exists(conn, &booking.user)? {
        return Err(AppError::NotFound("User not found.".into()));
    }
    let hotel = hotels::load_hotel(conn, &booking.hotel)?
        .ok_or_else(|| AppError::NotFound("Hotel not found.".into()))?;
    if !rooms::room_exists(conn, &booking.room)? {
        return Err(AppError::NotFound("Room not found.".into()));
    }
    if !hotels::hotel_lists_room(conn, &hotel.id, &booking.room)? {
        return Err(AppError::BadRequest(format!(
            "Room {} is not offered by hotel {}",
            booking.room, hotel.id
        )));
    }

    let option = resolve_option(conn, &booking.room, option_id)?;
    let capacity = option.spec.number_of_guests;
    if booking.number_of_guests == 0 || booking.number_of_guests > capacity {
        return Err(AppError::BadRequest(format!(
            "NumberOfGuests must be between 1 and {capacity}"
        )));
    }

    let booked = booked_stays(conn, &option.id, &stay, &booking.id)?;
    if !availability::has_vacancy(&stay, &booked, option.spec.num_of_empty_rooms) {
        return Err(AppError::Conflict(
            "The selected room option is fully booked for those dates".into(),
        ));
    }

    let tax_rate = tax::rate_for(
        conn,
        &hotel.hotel_address.country,
        &hotel.hotel_address.province,
    )?;
    booking.room_option = option.id;
    booking.total_price = availability::total_price(&stay, option.spec.price, tax_rate);
    Ok(())
}

fn write_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT (id) DO UPDATE SET
                user_id = excluded.user_id, hotel_id = excluded.hotel_id,
                room_id = excluded.room_id, room_option_id = excluded.room_option_id,
                check_in = excluded.check_in, check_out = excluded.check_out,
                guests = excluded.guests, total_price = excluded.total_price,
                updated_at = excluded.updated_at"
        ),
        rusqlite::params![
            booking.id,
            booking.user,
            booking.hotel,
            booking.room,
            booking.room_option,
            booking.check_in_date,
            booking.check_out_date,
            booking.number_of_guests,
            booking.total_price,
            booking.created_at,
            booking.updated_at
        ],
    )?;
    Ok(())
}

/// Loads a booking the caller is allowed to see.
fn owned_booking(conn: &Connection, caller: &Identity, id: &str) -> AppResult<Booking> {
    let booking =
        find_booking(conn, id)?.ok_or_else(|| AppError::NotFound("Booking not found.".into()))?;
    caller.ensure_owner(&booking.user)?;
    Ok(booking)
}

pub fn create_booking(
    pool: &DbPool,
    caller: &Identity,
    new_booking: NewBooking,
) -> AppResult<BookingDetails> {
    let user = new_booking.user.unwrap_or_else(|| caller.user_id.clone());
    caller.ensure_owner(&user)?;

    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let now = db::now_timestamp();
    let mut booking = Booking {
        id: Uuid::new_v4().to_string(),
        user,
        hotel: new_booking.hotel,
        room: new_booking.room,
        room_option: String::new(),
        check_in_date: new_booking.check_in_date,
        check_out_date: new_booking.check_out_date,
        number_of_guests: new_booking.number_of_guests,
        total_price: 0.0,
        created_at: now.clone(),
        updated_at: now,
    };
    reserve(&tx, &mut booking, new_booking.room_option.as_deref())?;
    write_booking(&tx, &booking)?;
    let details = populate(&tx, booking)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %details.id,
        user_id = %details.user.id,
        total_price = details.total_price,
        "Booking created"
    );
    Ok(details)
}

/// Presence-based update. Changing anything the reservation depends on runs
/// the availability and pricing rules again.
pub fn update_booking(
    pool: &DbPool,
    caller: &Identity,
    id: &str,
    patch: BookingPatch,
) -> AppResult<BookingDetails> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut booking = owned_booking(&tx, caller, id)?;
    if let Some(user) = &patch.user {
        if user != &booking.user && !caller.is_admin() {
            return Err(AppError::Forbidden);
        }
    }

    let revalidate = patch.touches_reservation();
    // A new room without a new option falls back to that room's only option.
    let option_id = match (&patch.room, &patch.room_option) {
        (_, Some(option)) => Some(option.clone()),
        (Some(_), None) => None,
        (None, None) => Some(booking.room_option.clone()),
    };
    patch.apply_to(&mut booking);

    if revalidate {
        reserve(&tx, &mut booking, option_id.as_deref())?;
    } else if !credentials::user_exists(&tx, &booking.user)? {
        return Err(AppError::NotFound("User not found.".into()));
    }

    booking.updated_at = db::now_timestamp();
    write_booking(&tx, &booking)?;
    let details = populate(&tx, booking)?;
    tx.commit()?;
    Ok(details)
}

pub fn cancel_booking(pool: &DbPool, caller: &Identity, id: &str) -> AppResult<()> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    owned_booking(&tx, caller, id)?;
    tx.execute("DELETE FROM bookings WHERE id = ?1", rusqlite::params![id])?;
    tx.commit()?;

    tracing::info!(booking_id = %id, "Booking cancelled");
    Ok(())
}

pub fn get_booking(pool: &DbPool, caller: &Identity, id: &str) -> AppResult<BookingDetails> {
    let conn = pool.get()?;
    let booking = owned_booking(&conn, caller, id)?;
    populate(&conn, booking)
}

/// Every booking for admins; only the caller's own for everyone else.
pub fn list_bookings(pool: &DbPool, caller: &Identity) -> AppResult<Vec<BookingDetails>> {
    let conn = pool.get()?;
    let bookings = if caller.is_admin() {
        query_bookings(&conn, "", [])?
    } else {
        query_bookings(&conn, "WHERE user_id = ?1", rusqlite::params![caller.user_id])?
    };
    populate_all(&conn, bookings)
}

pub fn list_user_bookings(
    pool: &DbPool,
    caller: &Identity,
    user_id: &str,
) -> AppResult<Vec<BookingDetails>> {
    caller.ensure_owner(user_id)?;
    let conn = pool.get()?;
    let bookings = query_bookings(&conn, "WHERE user_id = ?1", rusqlite::params![user_id])?;
    populate_all(&conn, bookings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HotelPatch, NewRoom, Role, TaxRateInput};
    use crate::services::credentials::tests::signup;
    use crate::services::hotels::tests::new_hotel;
    use crate::services::rooms::tests::option;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    struct Fixture {
        pool: DbPool,
        guest: Identity,
        hotel_id: String,
        room_id: String,
        option_id: String,
    }

    fn identity(user_id: &str, role: Role) -> Identity {
        Identity {
            user_id: user_id.to_string(),
            role,
        }
    }

    /// One hotel in Ontario offering one room with a single option
    /// (100/night, one unit, two guests).
    fn fixture() -> Fixture {
        let pool = db::memory_pool();
        let user = signup(&pool, "alice");
        let room = rooms::create_room(
            &pool,
            NewRoom {
                room_options: vec![option("Standard", 100.0, 1, 2)],
            },
        )
        .unwrap();
        let hotel = hotels::create_hotel(&pool, new_hotel("Grand Palace", vec![room.id.clone()]))
            .unwrap();
        Fixture {
            guest: identity(&user.id, Role::User),
            hotel_id: hotel.id,
            option_id: room.room_options[0].id.clone(),
            room_id: room.id,
            pool,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    fn stay(f: &Fixture, check_in: u32, check_out: u32) -> NewBooking {
        NewBooking {
            user: None,
            hotel: f.hotel_id.clone(),
            room: f.room_id.clone(),
            room_option: None,
            check_in_date: day(check_in),
            check_out_date: day(check_out),
            number_of_guests: 2,
        }
    }

    #[test]
    fn test_last_unit_goes_to_exactly_one_booking() {
        let f = fixture();
        let first = create_booking(&f.pool, &f.guest, stay(&f, 10, 13));
        let second = create_booking(&f.pool, &f.guest, stay(&f, 12, 14));

        assert!(first.is_ok());
        assert!(matches!(second, Err(AppError::Conflict(_))));
        assert_eq!(list_bookings(&f.pool, &f.guest).unwrap().len(), 1);
    }

    #[test]
    fn test_back_to_back_stays_share_a_unit() {
        let f = fixture();
        create_booking(&f.pool, &f.guest, stay(&f, 10, 13)).unwrap();
        create_booking(&f.pool, &f.guest, stay(&f, 13, 15)).unwrap();
        create_booking(&f.pool, &f.guest, stay(&f, 5, 10)).unwrap();
        assert_eq!(list_bookings(&f.pool, &f.guest).unwrap().len(), 3);
    }

    #[test]
    fn test_price_includes_provincial_tax() {
        let f = fixture();
        tax::upsert_rate(
            &f.pool,
            TaxRateInput {
                country: "Canada".into(),
                province: "Ontario".into(),
                tax_rate: 0.13,
            },
        )
        .unwrap();

        let booking = create_booking(&f.pool, &f.guest, stay(&f, 1, 4)).unwrap();
        assert_eq!(booking.total_price, 339.0);
        assert_eq!(booking.room_option, f.option_id);
        assert_eq!(booking.user.username, "alice");
        assert_eq!(booking.hotel.id, f.hotel_id);
    }

    #[test]
    fn test_guest_count_and_date_order_are_validated() {
        let f = fixture();
        let mut crowded = stay(&f, 1, 3);
        crowded.number_of_guests = 3;
        assert!(matches!(
            create_booking(&f.pool, &f.guest, crowded),
            Err(AppError::BadRequest(_))
        ));

        let mut nobody = stay(&f, 1, 3);
        nobody.number_of_guests = 0;
        assert!(matches!(
            create_booking(&f.pool, &f.guest, nobody),
            Err(AppError::BadRequest(_))
        ));

        assert!(matches!(
            create_booking(&f.pool, &f.guest, stay(&f, 3, 3)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_room_must_belong_to_hotel() {
        let f = fixture();
        let stray = rooms::create_room(
            &f.pool,
            NewRoom {
                room_options: vec![option("Loft", 90.0, 1, 2)],
            },
        )
        .unwrap();
        let mut booking = stay(&f, 1, 3);
        booking.room = stray.id;
        assert!(matches!(
            create_booking(&f.pool, &f.guest, booking),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_cancel_then_get_is_not_found() {
        let f = fixture();
        let booking = create_booking(&f.pool, &f.guest, stay(&f, 1, 3)).unwrap();
        cancel_booking(&f.pool, &f.guest, &booking.id).unwrap();
        assert!(matches!(
            get_booking(&f.pool, &f.guest, &booking.id),
            Err(AppError::NotFound(_))
        ));
        // The freed unit can be booked again.
        create_booking(&f.pool, &f.guest, stay(&f, 1, 3)).unwrap();
    }

    #[test]
    fn test_hotel_keeps_listing_a_booked_room() {
        let f = fixture();
        let booking = create_booking(&f.pool, &f.guest, stay(&f, 1, 3)).unwrap();

        let unlist = HotelPatch {
            rooms: Some(vec![]),
            ..HotelPatch::default()
        };
        assert!(matches!(
            hotels::update_hotel(&f.pool, &f.hotel_id, unlist),
            Err(AppError::Conflict(_))
        ));

        let fewer_guests = BookingPatch {
            number_of_guests: Some(1),
            ..BookingPatch::default()
        };
        let updated = update_booking(&f.pool, &f.guest, &booking.id, fewer_guests).unwrap();
        assert_eq!(updated.number_of_guests, 1);

        cancel_booking(&f.pool, &f.guest, &booking.id).unwrap();
        let unlist = HotelPatch {
            rooms: Some(vec![]),
            ..HotelPatch::default()
        };
        let hotel = hotels::update_hotel(&f.pool, &f.hotel_id, unlist).unwrap();
        assert!(hotel.rooms.is_empty());
    }

    #[test]
    fn test_other_users_bookings_are_forbidden() {
        let f = fixture();
        let booking = create_booking(&f.pool, &f.guest, stay(&f, 1, 3)).unwrap();
        let bob = signup(&f.pool, "bob");
        let bob = identity(&bob.id, Role::User);

        assert!(matches!(
            get_booking(&f.pool, &bob, &booking.id),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            cancel_booking(&f.pool, &bob, &booking.id),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            list_user_bookings(&f.pool, &bob, &f.guest.user_id),
            Err(AppError::Forbidden)
        ));
        assert!(list_bookings(&f.pool, &bob).unwrap().is_empty());

        let mut on_behalf = stay(&f, 5, 6);
        on_behalf.user = Some(f.guest.user_id.clone());
        assert!(matches!(
            create_booking(&f.pool, &bob, on_behalf),
            Err(AppError::Forbidden)
        ));

        let admin = identity("any-admin", Role::Admin);
        assert_eq!(get_booking(&f.pool, &admin, &booking.id).unwrap().id, booking.id);
        assert_eq!(list_bookings(&f.pool, &admin).unwrap().len(), 1);
    }

    #[test]
    fn test_update_rechecks_availability_without_counting_itself() {
        let f = fixture();
        let booking = create_booking(&f.pool, &f.guest, stay(&f, 10, 12)).unwrap();
        let other = create_booking(&f.pool, &f.guest, stay(&f, 14, 16)).unwrap();

        let extended = update_booking(
            &f.pool,
            &f.guest,
            &booking.id,
            BookingPatch {
                check_out_date: Some(day(14)),
                ..BookingPatch::default()
            },
        )
        .unwrap();
        assert_eq!(extended.check_out_date, day(14));
        assert_eq!(extended.total_price, 400.0);

        let clash = update_booking(
            &f.pool,
            &f.guest,
            &other.id,
            BookingPatch {
                check_in_date: Some(day(13)),
                ..BookingPatch::default()
            },
        );
        assert!(matches!(clash, Err(AppError::Conflict(_))));
        assert_eq!(
            get_booking(&f.pool, &f.guest, &other.id).unwrap().check_in_date,
            day(14)
        );
    }

    #[test]
    fn test_only_admins_reassign_bookings() {
        let f = fixture();
        let booking = create_booking(&f.pool, &f.guest, stay(&f, 1, 3)).unwrap();
        let bob = signup(&f.pool, "bob");

        let reassign = || BookingPatch {
            user: Some(bob.id.clone()),
            ..BookingPatch::default()
        };
        assert!(matches!(
            update_booking(&f.pool, &f.guest, &booking.id, reassign()),
            Err(AppError::Forbidden)
        ));

        let admin = identity("any-admin", Role::Admin);
        let moved = update_booking(&f.pool, &admin, &booking.id, reassign()).unwrap();
        assert_eq!(moved.user.id, bob.id);
        assert_eq!(moved.total_price, booking.total_price);
    }
}

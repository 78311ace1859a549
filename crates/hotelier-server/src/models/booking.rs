use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{merge, Hotel, Patch, Room, UserPublic};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub hotel: String,
    pub room: String,
    pub room_option: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub number_of_guests: u32,
    pub total_price: f64,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// A booking with its references resolved to full documents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BookingDetails {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: UserPublic,
    pub hotel: Hotel,
    pub room: Room,
    pub room_option: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub number_of_guests: u32,
    pub total_price: f64,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// `TotalPrice` is derived server-side, so a client-supplied value is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewBooking {
    /// Defaults to the caller.
    #[serde(default)]
    pub user: Option<String>,
    pub hotel: String,
    pub room: String,
    /// May be omitted when the room has a single option.
    #[serde(default)]
    pub room_option: Option<String>,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub number_of_guests: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BookingPatch {
    pub user: Option<String>,
    pub hotel: Option<String>,
    pub room: Option<String>,
    pub room_option: Option<String>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
    pub number_of_guests: Option<u32>,
}

impl BookingPatch {
    /// Whether the patch changes anything the availability and pricing rules depend on.
    pub fn touches_reservation(&self) -> bool {
        self.hotel.is_some()
            || self.room.is_some()
            || self.room_option.is_some()
            || self.check_in_date.is_some()
            || self.check_out_date.is_some()
            || self.number_of_guests.is_some()
    }
}

impl Patch<Booking> for BookingPatch {
    fn apply_to(self, booking: &mut Booking) {
        merge(&mut booking.user, self.user);
        merge(&mut booking.hotel, self.hotel);
        merge(&mut booking.room, self.room);
        merge(&mut booking.room_option, self.room_option);
        merge(&mut booking.check_in_date, self.check_in_date);
        merge(&mut booking.check_out_date, self.check_out_date);
        merge(&mut booking.number_of_guests, self.number_of_guests);
    }
}

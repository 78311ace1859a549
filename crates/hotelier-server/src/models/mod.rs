mod booking;
mod hotel;
mod room;
mod tax;
mod user;

pub use booking::{Booking, BookingDetails, BookingPatch, NewBooking};
pub use hotel::{
    Hotel, HotelAddress, HotelAmenities, HotelDescription, HotelDetails, HotelPatch, NewHotel,
    NewReview, Review,
};
pub use room::{
    BedType, NewRoom, OptionFlag, Room, RoomAmenities, RoomFilter, RoomMeals, RoomOption,
    RoomOptionInput, RoomOptionSpec, RoomPatch,
};
pub use tax::{TaxRate, TaxRateInput};
pub use user::{NewUser, Role, User, UserPatch, UserPublic};

/// A partial update: every field is optional and only present fields are written.
pub trait Patch<T> {
    fn apply_to(self, target: &mut T);
}

/// Overwrites `slot` when the patch carries a value for it.
pub fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

pub mod availability;
pub mod bookings;
pub mod credentials;
pub mod hotels;
pub mod rooms;
pub mod tax;

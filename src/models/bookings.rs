use crate::schema::bookings;
use chrono::{NaiveDate, NaiveDateTime};

#[derive(Queryable)]
pub struct Booking {
    pub bid: u64,
    pub username: String,
    pub tid: u64,
    pub subject: String,
    pub date: NaiveDate,
    pub time: String,
    pub place: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "bookings"]
pub struct NewBooking {
    pub username: String,
    pub tid: u64,
    pub subject: String,
    pub date: NaiveDate,
    pub time: String,
    pub place: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

pub const BOOKING_STATUS_CONFIRMED: &str = "confirmed";
pub const BOOKING_STATUS_MODIFIED: &str = "modified";
pub const BOOKING_STATUS_PENDING: &str = "pending";
pub const BOOKING_STATUS_CANCELLED: &str = "cancelled";

/// Statuses that hold a seat and count toward slot occupancy.
pub fn active_statuses() -> Vec<&'static str> {
    vec![BOOKING_STATUS_CONFIRMED, BOOKING_STATUS_MODIFIED]
}

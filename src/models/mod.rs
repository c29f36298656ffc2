pub mod bookings;
pub mod notifications;
pub mod ratings;
pub mod teachers;
pub mod user_logins;
pub mod users;

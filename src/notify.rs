use anyhow::Context;
use chrono::Utc;
use diesel::prelude::*;
use diesel::MysqlConnection;

use crate::models::bookings::Booking;
use crate::models::notifications::NewNotification;

pub const TITLE_BOOKING_CONFIRMED: &str = "Booking confirmed";
pub const TITLE_BOOKING_CANCELLED: &str = "Booking cancelled";
pub const TITLE_BOOKING_MODIFIED: &str = "Booking schedule changed";

pub const EMAIL_SUBJECT_CANCELLED: &str = "Cancellation of Your Booking";
pub const EMAIL_SUBJECT_RESCHEDULED: &str = "Change in Your Booking Schedule";

/// Persists one in-app notification row. Reads are ordered newest-first by
/// `created_at`.
pub fn push_notification(
    conn: &MysqlConnection,
    username: &str,
    title: &str,
    message: &str,
) -> anyhow::Result<()> {
    use crate::schema::notifications;

    let data = NewNotification {
        username: username.to_string(),
        title: title.to_string(),
        message: message.to_string(),
        is_read: false,
        created_at: Utc::now().naive_utc(),
    };
    diesel::insert_into(notifications::table)
        .values(data)
        .execute(conn)
        .context("DB error")?;
    Ok(())
}

pub fn booking_confirmed_message(teacher_name: &str, booking: &Booking) -> String {
    format!(
        "Your booking with {} for {} on {} at {} ({}) has been confirmed.",
        teacher_name, booking.subject, booking.date, booking.time, booking.place
    )
}

pub fn booking_cancelled_message(teacher_name: &str, booking: &Booking) -> String {
    format!(
        "Your booking with {} for {} on {} at {} ({}) has been cancelled.",
        teacher_name, booking.subject, booking.date, booking.time, booking.place
    )
}

pub fn booking_modified_message(teacher_name: &str, booking: &Booking) -> String {
    format!(
        "The schedule of your booking with {} for {} on {} at {} ({}) has changed. \
         Please check the teacher's updated schedule.",
        teacher_name, booking.subject, booking.date, booking.time, booking.place
    )
}

pub fn cancellation_email(
    recipient_name: &str,
    teacher_name: &str,
    booking: &Booking,
    extra_message: &str,
) -> String {
    format!(
        "Dear {},\n\n\
         We regret to inform you that your booking with the teacher {} (Subject: {}) \
         scheduled for {} at {} ({}) has been cancelled.\n\n\
         Additional Message: {}\n\n\
         Please check the bookings page to schedule a new session if needed.\n\
         Thank you,\nEduBridge Team",
        recipient_name,
        teacher_name,
        booking.subject,
        booking.date,
        booking.time,
        booking.place,
        extra_message
    )
}

pub fn reschedule_email(
    recipient_name: &str,
    teacher_name: &str,
    booking: &Booking,
    new_date: &str,
    new_time: &str,
    new_place: &str,
    extra_message: Option<&str>,
) -> String {
    let extra = match extra_message {
        Some(message) => format!("Additional Message: {}\n\n", message),
        None => "".to_string(),
    };
    format!(
        "Dear {},\n\n\
         Your booking with the teacher {} (Subject: {}) has been rescheduled.\n\
         Old Schedule: {} at {} ({})\n\
         New Schedule: {} at {} ({})\n\n\
         {}\
         Please check your email and confirm the new booking or reschedule from the bookings page.\n\
         Thank you,\nEduBridge Team",
        recipient_name,
        teacher_name,
        booking.subject,
        booking.date,
        booking.time,
        booking.place,
        new_date,
        new_time,
        new_place,
        extra
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn booking() -> Booking {
        Booking {
            bid: 7,
            username: "mona".to_string(),
            tid: 3,
            subject: "Math".to_string(),
            date: NaiveDate::from_ymd(2025, 6, 1),
            time: "2:00 PM".to_string(),
            place: "Room A".to_string(),
            status: "pending".to_string(),
            created_at: NaiveDate::from_ymd(2025, 5, 1).and_hms(9, 0, 0),
        }
    }

    #[test]
    fn confirmation_names_every_slot_detail() {
        let message = booking_confirmed_message("Mr. Hassan", &booking());
        for part in &["Mr. Hassan", "Math", "2025-06-01", "2:00 PM", "Room A"] {
            assert!(message.contains(part), "missing {} in: {}", part, message);
        }
        assert!(message.contains("confirmed"));
    }

    #[test]
    fn reschedule_email_shows_old_and_new_slots() {
        let body = reschedule_email(
            "mona",
            "Mr. Hassan",
            &booking(),
            "2025-06-08",
            "4:00 PM",
            "Room B",
            Some("room maintenance"),
        );
        assert!(body.contains("Old Schedule: 2025-06-01 at 2:00 PM (Room A)"));
        assert!(body.contains("New Schedule: 2025-06-08 at 4:00 PM (Room B)"));
        assert!(body.contains("Additional Message: room maintenance"));
    }

    #[test]
    fn reschedule_email_without_extra_message() {
        let body = reschedule_email("mona", "Mr. Hassan", &booking(), "d", "t", "p", None);
        assert!(!body.contains("Additional Message"));
    }
}

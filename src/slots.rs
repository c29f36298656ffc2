use anyhow::Context;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::MysqlConnection;

use crate::models::bookings::{
    active_statuses, Booking, BOOKING_STATUS_CONFIRMED, BOOKING_STATUS_PENDING,
};
use crate::models::teachers::TeacherData;
use crate::{notify, schedule};

/// Identity of one bookable session instance.
#[derive(Clone)]
pub struct SlotKey {
    pub tid: u64,
    pub date: NaiveDate,
    pub time: String,
    pub place: String,
}

impl SlotKey {
    pub fn of_booking(booking: &Booking) -> Self {
        Self {
            tid: booking.tid,
            date: booking.date,
            time: booking.time.clone(),
            place: booking.place.clone(),
        }
    }
}

/// Seats currently held for one slot: bookings in a status that counts
/// toward capacity. Derived on demand, never stored.
pub fn occupancy(conn: &MysqlConnection, slot: &SlotKey) -> anyhow::Result<i64> {
    use crate::schema::bookings;

    bookings::table
        .filter(bookings::tid.eq(slot.tid))
        .filter(bookings::date.eq(slot.date))
        .filter(bookings::time.eq(&slot.time))
        .filter(bookings::place.eq(&slot.place))
        .filter(bookings::status.eq_any(active_statuses()))
        .count()
        .get_result::<i64>(conn)
        .context("DB error")
}

/// Confirmed while seats remain, pending otherwise. A non-positive
/// max-group-size is misconfiguration and reads as "always full".
pub fn initial_status(occupancy: i64, max_students_per_group: i32) -> &'static str {
    if max_students_per_group <= 0 || occupancy >= i64::from(max_students_per_group) {
        BOOKING_STATUS_PENDING
    } else {
        BOOKING_STATUS_CONFIRMED
    }
}

/// Status for a new booking request, from the slot's occupancy at this
/// moment. Runs inside the same transaction as the insert so two racing
/// requests cannot both read a stale count.
pub fn decide_initial_status(
    conn: &MysqlConnection,
    teacher: &TeacherData,
    slot: &SlotKey,
) -> anyhow::Result<&'static str> {
    if teacher.max_students_per_group <= 0 {
        log::warn!(
            "teacher {} has max_students_per_group = {}, new bookings stay pending",
            teacher.tid,
            teacher.max_students_per_group
        );
    }
    Ok(initial_status(
        occupancy(conn, slot)?,
        teacher.max_students_per_group,
    ))
}

fn oldest_pending(
    conn: &MysqlConnection,
    slot: &SlotKey,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    use crate::schema::bookings;

    bookings::table
        .filter(bookings::tid.eq(slot.tid))
        .filter(bookings::date.eq(slot.date))
        .filter(bookings::time.eq(&slot.time))
        .filter(bookings::place.eq(&slot.place))
        .filter(bookings::status.eq(BOOKING_STATUS_PENDING))
        .order(bookings::created_at.asc())
        .limit(limit)
        .get_results::<Booking>(conn)
        .context("DB error")
}

fn confirm(conn: &MysqlConnection, teacher: &TeacherData, booking: &Booking) -> anyhow::Result<()> {
    use crate::schema::bookings;

    diesel::update(bookings::table.filter(bookings::bid.eq(booking.bid)))
        .set(bookings::status.eq(BOOKING_STATUS_CONFIRMED))
        .execute(conn)
        .context("DB error")?;

    notify::push_notification(
        conn,
        &booking.username,
        notify::TITLE_BOOKING_CONFIRMED,
        &notify::booking_confirmed_message(&teacher.name, booking),
    )?;

    log::info!(
        "promoted booking {} for {} into slot {} {} ({})",
        booking.bid,
        booking.username,
        booking.date,
        booking.time,
        booking.place
    );
    Ok(())
}

/// One freed seat fills at most one: after a confirmed/modified booking is
/// cancelled, promote the oldest pending booking for the slot if capacity
/// now allows. Returns the promoted booking id, if any.
pub fn promote_after_cancel(
    conn: &MysqlConnection,
    teacher: &TeacherData,
    slot: &SlotKey,
) -> anyhow::Result<Option<u64>> {
    if occupancy(conn, slot)? >= i64::from(teacher.max_students_per_group) {
        return Ok(None);
    }
    match oldest_pending(conn, slot, 1)?.into_iter().next() {
        Some(booking) => {
            confirm(conn, teacher, &booking)?;
            Ok(Some(booking.bid))
        }
        None => Ok(None),
    }
}

/// Teacher-wide sweep after a capacity increase: for every slot key in the
/// schedule, promote up to the number of free seats, oldest first. The
/// caller has already established that capacity grew; `teacher` carries the
/// new max. Returns how many bookings were promoted.
pub fn promote_for_capacity_increase(
    conn: &MysqlConnection,
    teacher: &TeacherData,
) -> anyhow::Result<usize> {
    let schedule = schedule::decode_schedule(&teacher.schedule)?;
    let mut promoted = 0;
    for (date, time, place) in schedule::slots(&schedule) {
        let date =
            NaiveDate::parse_from_str(date, "%Y-%m-%d").context("stored schedule date is invalid")?;
        let slot = SlotKey {
            tid: teacher.tid,
            date,
            time: time.to_string(),
            place: place.to_string(),
        };
        let available = i64::from(teacher.max_students_per_group) - occupancy(conn, &slot)?;
        if available <= 0 {
            continue;
        }
        for booking in oldest_pending(conn, &slot, available)? {
            confirm(conn, teacher, &booking)?;
            promoted += 1;
        }
    }
    Ok(promoted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_status_follows_capacity() {
        assert_eq!(initial_status(0, 2), BOOKING_STATUS_CONFIRMED);
        assert_eq!(initial_status(1, 2), BOOKING_STATUS_CONFIRMED);
        assert_eq!(initial_status(2, 2), BOOKING_STATUS_PENDING);
        assert_eq!(initial_status(3, 2), BOOKING_STATUS_PENDING);
    }

    #[test]
    fn misconfigured_capacity_is_always_full() {
        assert_eq!(initial_status(0, 0), BOOKING_STATUS_PENDING);
        assert_eq!(initial_status(0, -3), BOOKING_STATUS_PENDING);
    }
}

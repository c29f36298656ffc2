use std::collections::BTreeMap;

use anyhow::Context;
use chrono::NaiveDate;

use crate::reject;

/// A teacher's bookable slots: date (`YYYY-MM-DD`) -> time label -> place.
/// The same three-level JSON object is the wire and storage contract.
pub type Schedule = BTreeMap<String, BTreeMap<String, String>>;

/// Decodes a stored schedule column. A row that fails here is corrupt
/// configuration, so this is an internal error, not a validation error.
pub fn decode_schedule(raw: &str) -> anyhow::Result<Schedule> {
    serde_json::from_str(raw).context("stored schedule is not valid JSON")
}

pub fn encode_schedule(schedule: &Schedule) -> anyhow::Result<String> {
    serde_json::to_string(schedule).context("failed to encode schedule")
}

/// Checks an admin-supplied schedule before it is stored: date keys must be
/// `YYYY-MM-DD`, time labels must parse with one of the accepted clock
/// formats (the cancellation guard parses them later), places must be
/// non-empty.
pub fn assert_schedule(schedule: &Schedule) -> anyhow::Result<()> {
    for (date, times) in schedule {
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            reject!("Invalid schedule date '{}'. Use 'YYYY-MM-DD'.", date);
        }
        for (time, place) in times {
            if crate::utils::parse_clock_time(time).is_err() {
                reject!(
                    "Invalid schedule time '{}'. Use 'HH:MM', 'HH:MM:SS', or 'HH:MM AM/PM'.",
                    time
                );
            }
            if place.trim().is_empty() {
                reject!("Schedule place for {} {} must not be empty.", date, time);
            }
        }
    }
    Ok(())
}

pub fn slot_place<'a>(schedule: &'a Schedule, date: &str, time: &str) -> Option<&'a str> {
    schedule
        .get(date)
        .and_then(|times| times.get(time))
        .map(String::as_str)
}

/// All (date, time, place) keys of a schedule, date-ordered.
pub fn slots(schedule: &Schedule) -> impl Iterator<Item = (&str, &str, &str)> {
    schedule.iter().flat_map(|(date, times)| {
        times
            .iter()
            .map(move |(time, place)| (date.as_str(), time.as_str(), place.as_str()))
    })
}

/// Whether a booking keyed by (date, time) is affected by a schedule edit:
/// the entry existed in the old schedule AND the new schedule dropped it or
/// moved it to a different place.
pub fn slot_changed(old: &Schedule, new: &Schedule, date: &str, time: &str) -> bool {
    match slot_place(old, date, time) {
        None => false,
        Some(old_place) => match slot_place(new, date, time) {
            None => true,
            Some(new_place) => new_place != old_place,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(entries: &[(&str, &str, &str)]) -> Schedule {
        let mut schedule = Schedule::new();
        for (date, time, place) in entries {
            schedule
                .entry(date.to_string())
                .or_insert_with(BTreeMap::new)
                .insert(time.to_string(), place.to_string());
        }
        schedule
    }

    #[test]
    fn decode_accepts_the_wire_shape() {
        let decoded =
            decode_schedule(r#"{"2025-06-01": {"2:00 PM": "Room A", "9:00 AM": "Room B"}}"#)
                .unwrap();
        assert_eq!(slot_place(&decoded, "2025-06-01", "2:00 PM"), Some("Room A"));
        assert_eq!(slot_place(&decoded, "2025-06-01", "9:00 AM"), Some("Room B"));
    }

    #[test]
    fn assert_schedule_rejects_bad_keys() {
        assert!(assert_schedule(&schedule(&[("2025-06-01", "2:00 PM", "Room A")])).is_ok());
        assert!(assert_schedule(&schedule(&[("June 1st", "2:00 PM", "Room A")])).is_err());
        assert!(assert_schedule(&schedule(&[("2025-06-01", "afternoon", "Room A")])).is_err());
        assert!(assert_schedule(&schedule(&[("2025-06-01", "2:00 PM", "  ")])).is_err());
    }

    #[test]
    fn slot_changed_detects_removal_and_moves() {
        let old = schedule(&[
            ("2025-06-01", "2:00 PM", "Room A"),
            ("2025-06-02", "9:00 AM", "Room B"),
        ]);
        // entry removed
        let new = schedule(&[("2025-06-02", "9:00 AM", "Room B")]);
        assert!(slot_changed(&old, &new, "2025-06-01", "2:00 PM"));
        assert!(!slot_changed(&old, &new, "2025-06-02", "9:00 AM"));

        // place moved
        let new = schedule(&[
            ("2025-06-01", "2:00 PM", "Room C"),
            ("2025-06-02", "9:00 AM", "Room B"),
        ]);
        assert!(slot_changed(&old, &new, "2025-06-01", "2:00 PM"));

        // never existed in the old schedule
        assert!(!slot_changed(&old, &new, "2025-06-03", "2:00 PM"));
    }

    #[test]
    fn slots_walks_every_entry() {
        let s = schedule(&[
            ("2025-06-02", "9:00 AM", "Room B"),
            ("2025-06-01", "2:00 PM", "Room A"),
            ("2025-06-01", "4:00 PM", "Room A"),
        ]);
        let keys: Vec<_> = slots(&s).collect();
        assert_eq!(
            keys,
            vec![
                ("2025-06-01", "2:00 PM", "Room A"),
                ("2025-06-01", "4:00 PM", "Room A"),
                ("2025-06-02", "9:00 AM", "Room B"),
            ]
        );
    }
}

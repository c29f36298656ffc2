#[macro_export]
macro_rules! post_funcs {
    ( $( ( $func_name:ident, $url:expr, $request:ty, $response:ty ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                #[post($url)]
                async fn $func_name(
                    pool: web::Data<DbPool>,
                    info: web::Json<$request>
                ) -> impl Responder {
                    match [<$func_name _impl>](pool, info).await {
                        Ok(response) => HttpResponse::Ok().json(response),
                        Err(err) => {
                            let (status, msg) = crate::protocol::classify(&err);
                            HttpResponse::build(status).json($response::err(msg))
                        }
                    }
                }
            }
        )+
    };
}

// Same wrapper for endpoints that also send email.
#[macro_export]
macro_rules! post_mailer_funcs {
    ( $( ( $func_name:ident, $url:expr, $request:ty, $response:ty ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                #[post($url)]
                async fn $func_name(
                    pool: web::Data<DbPool>,
                    mailer: web::Data<Mailer>,
                    info: web::Json<$request>
                ) -> impl Responder {
                    match [<$func_name _impl>](pool, mailer, info).await {
                        Ok(response) => HttpResponse::Ok().json(response),
                        Err(err) => {
                            let (status, msg) = crate::protocol::classify(&err);
                            HttpResponse::build(status).json($response::err(msg))
                        }
                    }
                }
            }
        )+
    };
}

use blake2::{Blake2b, Digest};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::reject;

pub const CANCEL_WINDOW_HOURS: i64 = 48;

/// Accepted stored-time formats, tried in order: "2:30 PM", "14:30",
/// "14:30:00".
const CLOCK_FMTS: [&str; 3] = ["%I:%M %p", "%H:%M", "%H:%M:%S"];

pub fn parse_clock_time(s: &str) -> anyhow::Result<NaiveTime> {
    let s = s.trim();
    for fmt in &CLOCK_FMTS {
        if let Ok(time) = NaiveTime::parse_from_str(s, fmt) {
            return Ok(time);
        }
    }
    reject!(
        "Invalid time format. Use 'HH:MM', 'HH:MM:SS', or 'HH:MM AM/PM' (e.g. '14:30', '14:30:00', '2:30 PM')."
    )
}

pub fn parse_date_str(s: &str) -> anyhow::Result<NaiveDate> {
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(date) => Ok(date),
        Err(_) => reject!("Invalid date format. Use 'YYYY-MM-DD' (e.g. '2025-05-19')."),
    }
}

/// Whether a booking starting at `date` + `time` may still be cancelled at
/// `now` (both in server-local time). Unparseable times are a validation
/// error, never a silent default.
pub fn cancellable_at(date: NaiveDate, time: &str, now: NaiveDateTime) -> anyhow::Result<bool> {
    let slot_start = date.and_time(parse_clock_time(time)?);
    let diff = slot_start.signed_duration_since(now);
    Ok(diff.num_seconds() >= CANCEL_WINDOW_HOURS * 3600)
}

pub fn assert_phone_str(phone: &str) -> anyhow::Result<()> {
    const PREFIXES: [&str; 4] = ["010", "011", "012", "015"];
    if phone.len() != 11 || !phone.chars().all(|c| c.is_ascii_digit()) {
        reject!("Phone number must be 11 digits.");
    }
    if !PREFIXES.iter().any(|p| phone.starts_with(p)) {
        reject!("Phone number must start with 010, 011, 012, or 015.");
    }
    Ok(())
}

pub fn assert_password_str(password: &str) -> anyhow::Result<()> {
    if password.len() < 8 {
        reject!("Password must be at least 8 characters long.");
    }
    Ok(())
}

pub fn assert_email_str(email: &str) -> anyhow::Result<()> {
    if !email.contains('@') {
        reject!("Invalid email address.");
    }
    Ok(())
}

pub fn hash_password(password: &str) -> String {
    format!("{:x}", Blake2b::digest(password.as_bytes()))
}

pub fn generate_login_token(username: &str) -> String {
    let seed = format!("{}:{}", username, Utc::now().timestamp_nanos());
    format!("{:x}", Blake2b::digest(seed.as_bytes()))
}

pub fn format_time_str(time: &NaiveDateTime) -> String {
    const TIME_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    format!("{}+00:00", time.format(TIME_FMT))
}

pub fn get_str_pattern<S: AsRef<str>>(s: S) -> String {
    format!("%{}%", s.as_ref())
}

pub fn get_str_pattern_opt<S: AsRef<str>>(s: Option<S>) -> String {
    match s {
        Some(s) => get_str_pattern(s),
        None => "%".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_accepts_all_three_formats() {
        assert_eq!(
            parse_clock_time("2:30 PM").unwrap(),
            NaiveTime::from_hms(14, 30, 0)
        );
        assert_eq!(
            parse_clock_time("14:30").unwrap(),
            NaiveTime::from_hms(14, 30, 0)
        );
        assert_eq!(
            parse_clock_time("14:30:00").unwrap(),
            NaiveTime::from_hms(14, 30, 0)
        );
        // leading/trailing whitespace is tolerated, as stored labels are free-form
        assert_eq!(
            parse_clock_time(" 9:00 AM ").unwrap(),
            NaiveTime::from_hms(9, 0, 0)
        );
    }

    #[test]
    fn clock_time_rejects_garbage() {
        let err = parse_clock_time("half past nine").unwrap_err();
        let (status, _) = crate::protocol::classify(&err);
        assert_eq!(status, actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn cancel_window_examples() {
        let date = NaiveDate::from_ymd(2025, 6, 1);
        // ~73h before the slot: allowed
        let now = NaiveDate::from_ymd(2025, 5, 29).and_hms(13, 0, 0);
        assert!(cancellable_at(date, "2:00 PM", now).unwrap());
        // ~23h before the slot: rejected
        let now = NaiveDate::from_ymd(2025, 5, 30).and_hms(15, 0, 0);
        assert!(!cancellable_at(date, "2:00 PM", now).unwrap());
        // exactly 48h is still allowed
        let now = NaiveDate::from_ymd(2025, 5, 30).and_hms(14, 0, 0);
        assert!(cancellable_at(date, "2:00 PM", now).unwrap());
    }

    #[test]
    fn cancel_window_propagates_parse_failure() {
        let date = NaiveDate::from_ymd(2025, 6, 1);
        let now = NaiveDate::from_ymd(2025, 5, 1).and_hms(0, 0, 0);
        assert!(cancellable_at(date, "sometime", now).is_err());
    }

    #[test]
    fn phone_validation() {
        assert!(assert_phone_str("01012345678").is_ok());
        assert!(assert_phone_str("0101234567").is_err());
        assert!(assert_phone_str("01912345678").is_err());
        assert!(assert_phone_str("0101234567a").is_err());
    }
}

use serde::Deserialize;

use crate::schedule::Schedule;

/// Replacement slot details attached to reschedule actions. Fields default
/// to empty so the handlers can report a missing piece as a validation
/// error instead of a deserialization failure.
#[derive(Default, Deserialize)]
pub struct NewSlot {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub place: String,
}

#[derive(Deserialize)]
pub struct AddTeacherRequest {
    pub login_token: String,
    pub name: String,
    pub subject: String,
    pub governorate: String,
    pub price_per_session: f64,
    pub max_students_per_group: i32,
    pub schedule: Schedule,
}

#[derive(Deserialize)]
pub struct ModifyTeacherRequest {
    pub login_token: String,
    pub tid: u64,
    pub name: Option<String>,
    pub governorate: Option<String>,
    pub price_per_session: Option<f64>,
    pub max_students_per_group: Option<i32>,
    pub schedule: Option<Schedule>,
}

#[derive(Deserialize)]
pub struct CheckScheduleChangesRequest {
    pub login_token: String,
    pub tid: u64,
    #[serde(default)]
    pub old_schedule: Schedule,
    #[serde(default)]
    pub new_schedule: Schedule,
    #[serde(default)]
    pub new_slot: NewSlot,
}

fn default_action() -> String {
    "reschedule".to_string()
}

#[derive(Deserialize)]
pub struct NotifyStudentsRequest {
    pub login_token: String,
    pub tid: u64,
    pub booking_ids: Vec<u64>,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default)]
    pub new_slot: NewSlot,
}

#[derive(Deserialize)]
pub struct BookingsBySlotRequest {
    pub login_token: String,
    pub tid: u64,
    pub date: String,
    pub time: String,
    pub place: String,
}

#[derive(Deserialize)]
pub struct SearchBookingRequest {
    pub login_token: String,
    pub tid: Option<u64>,
    pub status: Option<String>,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateNotificationRequest {
    pub login_token: String,
    pub title: String,
    pub message: String,
    pub username: Option<String>,
    #[serde(default)]
    pub send_to_all: bool,
}

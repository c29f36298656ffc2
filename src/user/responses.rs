use serde::Serialize;

use crate::schedule::Schedule;

#[derive(Default, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub err: String,
    pub login_token: String,
}

#[derive(Default, Serialize)]
pub struct ViewInfoResponse {
    pub success: bool,
    pub err: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub telephone: String,
}

#[derive(Default, Serialize)]
pub struct SearchTeacherItem {
    pub tid: u64,
    pub name: String,
    pub subject: String,
    pub governorate: String,
    pub price_per_session: f64,
    pub max_students_per_group: i32,
    pub rating: f64,
    pub rating_count: i32,
    pub schedule: Schedule,
}

#[derive(Default, Serialize)]
pub struct SearchTeacherResponse {
    pub success: bool,
    pub err: String,
    pub teachers: Vec<SearchTeacherItem>,
}

#[derive(Default, Serialize)]
pub struct BookResponse {
    pub success: bool,
    pub err: String,
    pub bid: u64,
    pub status: String,
}

#[derive(Default, Serialize)]
pub struct SearchBookingItem {
    pub bid: u64,
    pub tid: u64,
    pub teacher_name: String,
    pub subject: String,
    pub date: String,
    pub time: String,
    pub place: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Default, Serialize)]
pub struct SearchBookingResponse {
    pub success: bool,
    pub err: String,
    pub bookings: Vec<SearchBookingItem>,
}

#[derive(Default, Serialize)]
pub struct RateTeacherResponse {
    pub success: bool,
    pub err: String,
    pub rating: f64,
    pub rating_count: i32,
}

#[derive(Default, Serialize)]
pub struct SearchNotificationItem {
    pub nid: u64,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Default, Serialize)]
pub struct SearchNotificationResponse {
    pub success: bool,
    pub err: String,
    pub notifications: Vec<SearchNotificationItem>,
}

#[derive(Default, Serialize)]
pub struct UnreadCountResponse {
    pub success: bool,
    pub err: String,
    pub unread_count: i64,
}

crate::impl_err_response! {
    LoginResponse,
    ViewInfoResponse,
    SearchTeacherResponse,
    BookResponse,
    SearchBookingResponse,
    RateTeacherResponse,
    SearchNotificationResponse,
    UnreadCountResponse,
}

use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub name: String,
    pub password: String,
    pub email: String,
    pub telephone: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub login_token: String,
}

#[derive(Deserialize)]
pub struct ViewInfoRequest {
    pub login_token: String,
}

#[derive(Deserialize)]
pub struct ModifyPasswordRequest {
    pub login_token: String,
    pub password_old: String,
    pub password_new: String,
}

#[derive(Deserialize)]
pub struct SearchTeacherRequest {
    pub teacher_name: Option<String>,
    pub subject: Option<String>,
    pub governorate: Option<String>,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct BookRequest {
    pub login_token: String,
    pub tid: u64,
    pub subject: String,
    pub date: String,
    pub time: String,
    pub place: String,
}

#[derive(Deserialize)]
pub struct CancelBookingRequest {
    pub login_token: String,
    pub bid: u64,
}

#[derive(Deserialize)]
pub struct SearchBookingRequest {
    pub login_token: String,
    pub status: Option<String>,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct RateTeacherRequest {
    pub login_token: String,
    pub tid: u64,
    pub rating: f64,
}

#[derive(Deserialize)]
pub struct SearchNotificationRequest {
    pub login_token: String,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct UnreadCountRequest {
    pub login_token: String,
}

#[derive(Deserialize)]
pub struct MarkNotificationsReadRequest {
    pub login_token: String,
}

#[derive(Deserialize)]
pub struct DeleteNotificationRequest {
    pub login_token: String,
    pub nid: u64,
}

use serde::Serialize;

#[derive(Default, Serialize)]
pub struct AddTeacherResponse {
    pub success: bool,
    pub err: String,
    pub tid: u64,
}

#[derive(Default, Serialize)]
pub struct AffectedBookingItem {
    pub bid: u64,
    pub username: String,
    pub email: String,
    pub date: String,
    pub time: String,
    pub place: String,
    pub new_date: String,
    pub new_time: String,
    pub new_place: String,
}

#[derive(Default, Serialize)]
pub struct CheckScheduleChangesResponse {
    pub success: bool,
    pub err: String,
    pub detail: String,
    pub affected_bookings: Vec<AffectedBookingItem>,
}

#[derive(Default, Serialize)]
pub struct NotifyStudentsResponse {
    pub success: bool,
    pub err: String,
    pub detail: String,
    pub emails_sent: i32,
    pub emails_failed: i32,
}

#[derive(Default, Serialize)]
pub struct BookingsBySlotItem {
    pub bid: u64,
    pub username: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Default, Serialize)]
pub struct BookingsBySlotResponse {
    pub success: bool,
    pub err: String,
    pub bookings: Vec<BookingsBySlotItem>,
}

#[derive(Default, Serialize)]
pub struct SearchBookingItem {
    pub bid: u64,
    pub username: String,
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
pub struct CreateNotificationResponse {
    pub success: bool,
    pub err: String,
    pub created: i64,
}

crate::impl_err_response! {
    AddTeacherResponse,
    CheckScheduleChangesResponse,
    NotifyStudentsResponse,
    BookingsBySlotResponse,
    SearchBookingResponse,
    CreateNotificationResponse,
}

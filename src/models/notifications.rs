use crate::schema::notifications;
use chrono::NaiveDateTime;

#[derive(Queryable)]
pub struct Notification {
    pub nid: u64,
    pub username: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "notifications"]
pub struct NewNotification {
    pub username: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

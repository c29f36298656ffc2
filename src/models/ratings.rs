use crate::schema::ratings;
use chrono::NaiveDateTime;

#[derive(Queryable)]
pub struct Rating {
    pub rid: u64,
    pub username: String,
    pub tid: u64,
    pub rating: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "ratings"]
pub struct NewRating {
    pub username: String,
    pub tid: u64,
    pub rating: f64,
    pub created_at: NaiveDateTime,
}

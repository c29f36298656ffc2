use crate::schema::teachers;

#[derive(Queryable)]
pub struct TeacherData {
    pub tid: u64,
    pub name: String,
    pub subject: String,
    pub governorate: String,
    pub price_per_session: f64,
    pub max_students_per_group: i32,
    pub schedule: String,
    pub rating: f64,
    pub rating_count: i32,
}

#[derive(Insertable)]
#[table_name = "teachers"]
pub struct NewTeacher {
    pub name: String,
    pub subject: String,
    pub governorate: String,
    pub price_per_session: f64,
    pub max_students_per_group: i32,
    pub schedule: String,
    pub rating: f64,
    pub rating_count: i32,
}

#[derive(AsChangeset, Default)]
#[table_name = "teachers"]
pub struct UpdateTeacher {
    pub name: Option<String>,
    pub governorate: Option<String>,
    pub price_per_session: Option<f64>,
    pub max_students_per_group: Option<i32>,
    pub schedule: Option<String>,
}

use crate::schema::users;

#[derive(Queryable, Insertable, Identifiable)]
#[primary_key(username)]
#[table_name = "users"]
pub struct UserData {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub telephone: String,
    pub is_admin: bool,
}

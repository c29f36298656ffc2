use actix_web::web;
use anyhow::Context;
use chrono::Utc;
use diesel::prelude::*;

use crate::{
    database::{blocking, get_db_conn},
    forbidden,
    models::{user_logins::UserLoginData, users::UserData},
    unauthenticated, DbPool,
};

/// Resolves a login token and requires the account behind it to be an
/// administrator. Endpoints call this first; everything after works with
/// the resolved username instead of ambient request state.
pub async fn get_admin_from_token(
    token: String,
    pool: &web::Data<DbPool>,
) -> anyhow::Result<String> {
    use crate::schema::{user_logins, users};
    const MAX_LOGIN_TIME_SECS: i64 = 3600;

    let conn = get_db_conn(pool)?;
    let data = blocking(move || {
        user_logins::table
            .inner_join(users::table.on(user_logins::username.eq(users::username)))
            .filter(user_logins::token.eq(token))
            .order(user_logins::login_time.desc())
            .limit(1)
            .get_result::<(UserLoginData, UserData)>(&conn)
            .optional()
            .context("DB error")
    })
    .await?;

    match data {
        Some((login, user)) => {
            let time_diff = Utc::now().naive_utc().signed_duration_since(login.login_time);
            if time_diff.num_seconds() > MAX_LOGIN_TIME_SECS {
                unauthenticated!("Login has expired");
            }
            if !user.is_admin {
                forbidden!("Administrator privileges are required.");
            }
            Ok(user.username)
        }
        None => unauthenticated!("You are not logged in"),
    }
}

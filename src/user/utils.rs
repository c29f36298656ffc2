use actix_web::web;
use anyhow::Context;
use chrono::Utc;
use diesel::prelude::*;

use crate::{
    database::{blocking, get_db_conn},
    models::user_logins::UserLoginData,
    unauthenticated, DbPool,
};

pub async fn get_username_from_token(
    token: String,
    pool: &web::Data<DbPool>,
) -> anyhow::Result<String> {
    use crate::schema::user_logins;
    const MAX_LOGIN_TIME_SECS: i64 = 3600;

    let conn = get_db_conn(pool)?;
    let data = blocking(move || {
        user_logins::table
            .filter(user_logins::token.eq(token))
            .order(user_logins::login_time.desc())
            .limit(1)
            .get_result::<UserLoginData>(&conn)
            .optional()
            .context("DB error")
    })
    .await?;

    if let Some(data) = data {
        let time_diff = Utc::now()
            .naive_utc()
            .signed_duration_since(data.login_time);
        if time_diff.num_seconds() <= MAX_LOGIN_TIME_SECS {
            Ok(data.username)
        } else {
            unauthenticated!("Login has expired");
        }
    } else {
        unauthenticated!("You are not logged in");
    }
}

use actix_web::web;
use anyhow::Context;
use diesel::prelude::*;

use crate::{
    database::{blocking, get_db_conn},
    not_found, DbPool,
};

pub async fn assert_user(pool: &web::Data<DbPool>, username: String) -> anyhow::Result<()> {
    use crate::schema::users;

    let conn = get_db_conn(pool)?;
    let res = blocking(move || {
        users::table
            .filter(users::username.eq(username))
            .count()
            .get_result::<i64>(&conn)
            .context("DB error")
    })
    .await?;

    if res == 0 {
        not_found!("No such user");
    }

    Ok(())
}

pub async fn assert_teacher(pool: &web::Data<DbPool>, tid: u64) -> anyhow::Result<()> {
    use crate::schema::teachers;

    let conn = get_db_conn(pool)?;
    let res = blocking(move || {
        teachers::table
            .filter(teachers::tid.eq(tid))
            .count()
            .get_result::<i64>(&conn)
            .context("DB error")
    })
    .await?;

    if res == 0 {
        not_found!("Teacher not found.");
    }

    Ok(())
}

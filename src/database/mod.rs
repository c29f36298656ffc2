pub mod assert;

use crate::DbPool;
use actix_web::{error::BlockingError, web};
use anyhow::Context;
use diesel::{r2d2::ConnectionManager, MysqlConnection};
use r2d2::PooledConnection;

no_arg_sql_function!(
    last_insert_id,
    diesel::sql_types::Unsigned<diesel::sql_types::Bigint>,
    "The MySQL last_insert_id() function"
);

pub fn get_db_conn(
    pool: &web::Data<DbPool>,
) -> anyhow::Result<PooledConnection<ConnectionManager<MysqlConnection>>> {
    pool.get().context("DB connection")
}

/// Runs blocking DB work on the actix blocking pool. Unwraps the
/// `BlockingError` layer so guard errors stay downcastable for
/// `protocol::classify`.
pub async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match web::block(f).await {
        Ok(value) => Ok(value),
        Err(BlockingError::Error(err)) => Err(err),
        Err(BlockingError::Canceled) => Err(anyhow::anyhow!("blocking task canceled")),
    }
}

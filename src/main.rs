#[macro_use]
extern crate diesel;

mod admin;
mod database;
mod mailer;
mod models;
mod notify;
mod protocol;
mod schedule;
mod schema;
mod slots;
mod user;
mod utils;

use actix_web::{middleware, web, App, HttpServer};
use diesel::{r2d2::ConnectionManager, MysqlConnection};

type DbPool = r2d2::Pool<ConnectionManager<MysqlConnection>>;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let conn_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not found");
    let manager = ConnectionManager::<MysqlConnection>::new(conn_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create pool");

    let mailer = mailer::Mailer::from_env().expect("Failed to configure mailer");

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    log::info!("Starting EduBridge HTTP server on http://{}", bind);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .data(pool.clone())
            .data(mailer.clone())
            // student
            .service(
                web::scope("/user")
                    .configure(user::config),
            )
            // administrator
            .service(
                web::scope("/admin")
                    .configure(admin::config),
            )
    })
    .bind(bind)?
    .run()
    .await
}

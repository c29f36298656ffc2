mod requests;
mod responses;
mod utils;

use actix_web::{post, web, HttpResponse, Responder};
use anyhow::Context;
use chrono::{Local, Utc};
use diesel::prelude::*;

use crate::{
    database::{self, assert, blocking, get_db_conn},
    models::{
        bookings::{
            Booking, NewBooking, BOOKING_STATUS_CANCELLED, BOOKING_STATUS_CONFIRMED,
            BOOKING_STATUS_MODIFIED, BOOKING_STATUS_PENDING,
        },
        notifications::Notification,
        ratings::NewRating,
        teachers::TeacherData,
        user_logins::UserLoginData,
        users::UserData,
    },
    not_found, notify,
    protocol::SimpleResponse,
    reject, schedule,
    slots::{self, SlotKey},
    DbPool,
};

use self::{requests::*, responses::*, utils::get_username_from_token};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(logout)
        .service(view_info)
        .service(modify_password)
        .service(search_teacher)
        .service(book)
        .service(cancel_booking)
        .service(search_booking)
        .service(rate_teacher)
        .service(search_notification)
        .service(unread_count)
        .service(mark_notifications_read)
        .service(delete_notification);
}

crate::post_funcs! {
    (register, "/register", RegisterRequest, SimpleResponse),
    (login, "/login", LoginRequest, LoginResponse),
    (logout, "/logout", LogoutRequest, SimpleResponse),
    (view_info, "/view_info", ViewInfoRequest, ViewInfoResponse),
    (modify_password, "/modify_password", ModifyPasswordRequest, SimpleResponse),
    (search_teacher, "/search_teacher", SearchTeacherRequest, SearchTeacherResponse),
    (book, "/book", BookRequest, BookResponse),
    (cancel_booking, "/cancel_booking", CancelBookingRequest, SimpleResponse),
    (search_booking, "/search_booking", SearchBookingRequest, SearchBookingResponse),
    (rate_teacher, "/rate_teacher", RateTeacherRequest, RateTeacherResponse),
    (search_notification, "/search_notification", SearchNotificationRequest, SearchNotificationResponse),
    (unread_count, "/unread_count", UnreadCountRequest, UnreadCountResponse),
    (mark_notifications_read, "/mark_notifications_read", MarkNotificationsReadRequest, SimpleResponse),
    (delete_notification, "/delete_notification", DeleteNotificationRequest, SimpleResponse),
}

async fn register_impl(
    pool: web::Data<DbPool>,
    info: web::Json<RegisterRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::users;

    let info = info.into_inner();
    crate::utils::assert_email_str(&info.email)?;
    crate::utils::assert_phone_str(&info.telephone)?;
    crate::utils::assert_password_str(&info.password)?;

    let conn = get_db_conn(&pool)?;
    blocking(move || {
        conn.transaction(|| {
            let res = users::table
                .filter(users::username.eq(&info.username))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res > 0 {
                reject!("Username already in use.");
            }

            let res = users::table
                .filter(users::email.eq(&info.email))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res > 0 {
                reject!("Email already in use.");
            }

            let res = users::table
                .filter(users::telephone.eq(&info.telephone))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res > 0 {
                reject!("Phone number already in use.");
            }

            let data = UserData {
                username: info.username,
                password: crate::utils::hash_password(&info.password),
                name: info.name,
                email: info.email,
                telephone: info.telephone,
                is_admin: false,
            };
            diesel::insert_into(users::table)
                .values(data)
                .execute(&conn)
                .context("DB error")?;

            Ok(())
        })
    })
    .await?;

    Ok(SimpleResponse::ok())
}

async fn login_impl(
    pool: web::Data<DbPool>,
    info: web::Json<LoginRequest>,
) -> anyhow::Result<LoginResponse> {
    use crate::schema::{user_logins, users};

    let info = info.into_inner();
    assert::assert_user(&pool, info.username.clone()).await?;

    let conn = get_db_conn(&pool)?;
    let login_token = blocking(move || {
        conn.transaction(|| {
            let hashed_password = crate::utils::hash_password(&info.password);
            let res = users::table
                .filter(users::username.eq(&info.username))
                .filter(users::password.eq(&hashed_password))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res != 1 {
                reject!("Wrong username or password.");
            }

            let login_token = crate::utils::generate_login_token(&info.username);
            let token_data = UserLoginData {
                token: login_token.clone(),
                username: info.username,
                login_time: Utc::now().naive_utc(),
            };
            diesel::insert_into(user_logins::table)
                .values(token_data)
                .execute(&conn)
                .context("DB error")?;

            Ok(login_token)
        })
    })
    .await?;

    Ok(LoginResponse {
        success: true,
        err: "".to_string(),
        login_token,
    })
}

async fn logout_impl(
    pool: web::Data<DbPool>,
    info: web::Json<LogoutRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::user_logins;

    let info = info.into_inner();
    let conn = get_db_conn(&pool)?;
    blocking(move || {
        diesel::delete(user_logins::table.filter(user_logins::token.eq(info.login_token)))
            .execute(&conn)
            .context("DB error")
    })
    .await?;

    Ok(SimpleResponse::ok())
}

async fn view_info_impl(
    pool: web::Data<DbPool>,
    info: web::Json<ViewInfoRequest>,
) -> anyhow::Result<ViewInfoResponse> {
    use crate::schema::users;

    let info = info.into_inner();
    let username = get_username_from_token(info.login_token, &pool).await?;

    let conn = get_db_conn(&pool)?;
    let res = blocking(move || {
        users::table
            .filter(users::username.eq(&username))
            .get_result::<UserData>(&conn)
            .optional()
            .context("DB error")
    })
    .await?;
    let res = match res {
        Some(res) => res,
        None => not_found!("No such user"),
    };

    Ok(ViewInfoResponse {
        success: true,
        err: "".to_string(),
        username: res.username,
        name: res.name,
        email: res.email,
        telephone: res.telephone,
    })
}

async fn modify_password_impl(
    pool: web::Data<DbPool>,
    info: web::Json<ModifyPasswordRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::users;

    let info = info.into_inner();
    let username = get_username_from_token(info.login_token.clone(), &pool).await?;
    crate::utils::assert_password_str(&info.password_new)?;

    let conn = get_db_conn(&pool)?;
    blocking(move || {
        conn.transaction(|| {
            let hashed_password_old = crate::utils::hash_password(&info.password_old);
            let res = users::table
                .filter(users::username.eq(&username))
                .filter(users::password.eq(&hashed_password_old))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res != 1 {
                reject!("Wrong password.");
            }

            let hashed_password_new = crate::utils::hash_password(&info.password_new);
            diesel::update(users::table.filter(users::username.eq(&username)))
                .set(users::password.eq(&hashed_password_new))
                .execute(&conn)
                .context("DB error")?;

            Ok(())
        })
    })
    .await?;

    Ok(SimpleResponse::ok())
}

async fn search_teacher_impl(
    pool: web::Data<DbPool>,
    info: web::Json<SearchTeacherRequest>,
) -> anyhow::Result<SearchTeacherResponse> {
    use crate::schema::teachers;

    let info = info.into_inner();

    let conn = get_db_conn(&pool)?;
    let name_pattern = crate::utils::get_str_pattern_opt(info.teacher_name);
    let subject_pattern = crate::utils::get_str_pattern_opt(info.subject);
    let governorate_pattern = crate::utils::get_str_pattern_opt(info.governorate);
    let first_index = info.first_index.unwrap_or(0).max(0);
    let limit = info.limit.unwrap_or(30).max(0);
    let teacher_list = blocking(move || {
        let rows = teachers::table
            .filter(teachers::name.like(name_pattern))
            .filter(teachers::subject.like(subject_pattern))
            .filter(teachers::governorate.like(governorate_pattern))
            .order(teachers::name.asc())
            .offset(first_index)
            .limit(limit)
            .get_results::<TeacherData>(&conn)
            .context("DB error")?;

        rows.into_iter()
            .map(|data| {
                let schedule = schedule::decode_schedule(&data.schedule)?;
                Ok(SearchTeacherItem {
                    tid: data.tid,
                    name: data.name,
                    subject: data.subject,
                    governorate: data.governorate,
                    price_per_session: data.price_per_session,
                    max_students_per_group: data.max_students_per_group,
                    rating: data.rating,
                    rating_count: data.rating_count,
                    schedule,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await?;

    Ok(SearchTeacherResponse {
        success: true,
        err: "".to_string(),
        teachers: teacher_list,
    })
}

async fn book_impl(
    pool: web::Data<DbPool>,
    info: web::Json<BookRequest>,
) -> anyhow::Result<BookResponse> {
    use crate::schema::{bookings, teachers};

    let info = info.into_inner();
    let username = get_username_from_token(info.login_token.clone(), &pool).await?;
    assert::assert_teacher(&pool, info.tid).await?;
    let date = crate::utils::parse_date_str(&info.date)?;

    // count, decide, insert as one unit so two racing requests cannot both
    // read a stale occupancy
    let conn = get_db_conn(&pool)?;
    let (bid, status) = blocking(move || {
        conn.transaction(|| {
            // the row lock serializes capacity decisions for this teacher
            let teacher = teachers::table
                .filter(teachers::tid.eq(info.tid))
                .for_update()
                .get_result::<TeacherData>(&conn)
                .optional()
                .context("DB error")?;
            let teacher = match teacher {
                Some(teacher) => teacher,
                None => not_found!("Teacher not found."),
            };

            if info.subject != teacher.subject {
                reject!("The subject does not match the teacher's subject.");
            }

            let schedule = schedule::decode_schedule(&teacher.schedule)?;
            let date_str = date.format("%Y-%m-%d").to_string();
            match schedule::slot_place(&schedule, &date_str, &info.time) {
                None => reject!("The selected slot is not available in the teacher's schedule."),
                Some(place) if place != info.place => {
                    reject!("The selected place does not match the teacher's schedule.")
                }
                Some(_) => {}
            }

            let existing = bookings::table
                .filter(bookings::username.eq(&username))
                .filter(bookings::tid.eq(info.tid))
                .filter(bookings::date.eq(date))
                .filter(bookings::time.eq(&info.time))
                .filter(bookings::place.eq(&info.place))
                .filter(bookings::status.ne(BOOKING_STATUS_CANCELLED))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if existing > 0 {
                reject!("You have already booked this slot.");
            }

            let slot = SlotKey {
                tid: info.tid,
                date,
                time: info.time.clone(),
                place: info.place.clone(),
            };
            let status = slots::decide_initial_status(&conn, &teacher, &slot)?;

            let data = NewBooking {
                username,
                tid: info.tid,
                subject: info.subject,
                date,
                time: info.time,
                place: info.place,
                status: status.to_string(),
                created_at: Utc::now().naive_utc(),
            };
            diesel::insert_into(bookings::table)
                .values(data)
                .execute(&conn)
                .context("DB error")?;
            let bid = diesel::select(database::last_insert_id)
                .get_result::<u64>(&conn)
                .context("DB error")?;

            Ok((bid, status))
        })
    })
    .await?;

    Ok(BookResponse {
        success: true,
        err: "".to_string(),
        bid,
        status: status.to_string(),
    })
}

async fn cancel_booking_impl(
    pool: web::Data<DbPool>,
    info: web::Json<CancelBookingRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::{bookings, teachers};

    let info = info.into_inner();
    let username = get_username_from_token(info.login_token.clone(), &pool).await?;

    // cancel and promote commit together: two concurrent cancellations on
    // one slot must not both hand the same freed seat out
    let conn = get_db_conn(&pool)?;
    blocking(move || {
        conn.transaction(|| {
            let booking = bookings::table
                .filter(bookings::bid.eq(info.bid))
                .filter(bookings::username.eq(&username))
                .get_result::<Booking>(&conn)
                .optional()
                .context("DB error")?;
            let booking = match booking {
                Some(booking) => booking,
                None => not_found!("Booking not found or you do not have permission."),
            };

            // the row lock serializes capacity decisions for this teacher,
            // so two cancellations cannot hand one freed seat out twice
            let teacher = teachers::table
                .filter(teachers::tid.eq(booking.tid))
                .for_update()
                .get_result::<TeacherData>(&conn)
                .optional()
                .context("DB error")?
                .ok_or_else(|| {
                    anyhow::anyhow!("teacher {} missing for booking {}", booking.tid, booking.bid)
                })?;

            match booking.status.as_str() {
                BOOKING_STATUS_CANCELLED => reject!("The booking is already cancelled."),
                BOOKING_STATUS_PENDING => {
                    // a waitlisted student holds no seat: no 48h window,
                    // nothing to promote
                    diesel::update(bookings::table.filter(bookings::bid.eq(booking.bid)))
                        .set(bookings::status.eq(BOOKING_STATUS_CANCELLED))
                        .execute(&conn)
                        .context("DB error")?;
                    notify::push_notification(
                        &conn,
                        &booking.username,
                        notify::TITLE_BOOKING_CANCELLED,
                        &notify::booking_cancelled_message(&teacher.name, &booking),
                    )?;
                }
                BOOKING_STATUS_CONFIRMED | BOOKING_STATUS_MODIFIED => {
                    let now = Local::now().naive_local();
                    if !crate::utils::cancellable_at(booking.date, &booking.time, now)? {
                        reject!("Cancellation is only allowed at least 48 hours before the session.");
                    }

                    diesel::update(bookings::table.filter(bookings::bid.eq(booking.bid)))
                        .set(bookings::status.eq(BOOKING_STATUS_CANCELLED))
                        .execute(&conn)
                        .context("DB error")?;
                    notify::push_notification(
                        &conn,
                        &booking.username,
                        notify::TITLE_BOOKING_CANCELLED,
                        &notify::booking_cancelled_message(&teacher.name, &booking),
                    )?;

                    slots::promote_after_cancel(&conn, &teacher, &SlotKey::of_booking(&booking))?;
                }
                other => {
                    return Err(anyhow::anyhow!(
                        "booking {} has unknown status '{}'",
                        booking.bid,
                        other
                    ))
                }
            }

            Ok(())
        })
    })
    .await?;

    Ok(SimpleResponse::ok())
}

async fn search_booking_impl(
    pool: web::Data<DbPool>,
    info: web::Json<SearchBookingRequest>,
) -> anyhow::Result<SearchBookingResponse> {
    use crate::schema::{bookings, teachers};

    let info = info.into_inner();
    let username = get_username_from_token(info.login_token, &pool).await?;

    let conn = get_db_conn(&pool)?;
    let status = info.status.unwrap_or_else(|| "all".to_string());
    let first_index = info.first_index.unwrap_or(0).max(0);
    let limit = info.limit.unwrap_or(30).max(0);
    let rows = blocking(move || {
        bookings::table
            .filter(bookings::username.eq(&username))
            .filter((bookings::status.eq(&status)).or(&status == "all"))
            .inner_join(teachers::table.on(bookings::tid.eq(teachers::tid)))
            .order(bookings::created_at.desc())
            .offset(first_index)
            .limit(limit)
            .get_results::<(Booking, TeacherData)>(&conn)
            .context("DB error")
    })
    .await?;

    let bookings_list = rows
        .into_iter()
        .map(|(booking, teacher)| SearchBookingItem {
            bid: booking.bid,
            tid: teacher.tid,
            teacher_name: teacher.name,
            subject: booking.subject,
            date: booking.date.to_string(),
            time: booking.time,
            place: booking.place,
            status: booking.status,
            created_at: crate::utils::format_time_str(&booking.created_at),
        })
        .collect();

    Ok(SearchBookingResponse {
        success: true,
        err: "".to_string(),
        bookings: bookings_list,
    })
}

async fn rate_teacher_impl(
    pool: web::Data<DbPool>,
    info: web::Json<RateTeacherRequest>,
) -> anyhow::Result<RateTeacherResponse> {
    use crate::schema::{ratings, teachers};

    let info = info.into_inner();
    let username = get_username_from_token(info.login_token.clone(), &pool).await?;
    assert::assert_teacher(&pool, info.tid).await?;

    if !(1.0..=5.0).contains(&info.rating) {
        reject!("Rating must be a number between 1 and 5.");
    }

    // the stored aggregate is recomputed on every write so reads stay pure
    let conn = get_db_conn(&pool)?;
    let (rating, rating_count) = blocking(move || {
        conn.transaction(|| {
            let data = NewRating {
                username,
                tid: info.tid,
                rating: info.rating,
                created_at: Utc::now().naive_utc(),
            };
            diesel::insert_into(ratings::table)
                .values(data)
                .execute(&conn)
                .context("DB error")?;

            let count = ratings::table
                .filter(ratings::tid.eq(info.tid))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            let avg = ratings::table
                .filter(ratings::tid.eq(info.tid))
                .select(diesel::dsl::avg(ratings::rating))
                .get_result::<Option<f64>>(&conn)
                .context("DB error")?;
            let rating = (avg.unwrap_or(0.0) * 10.0).round() / 10.0;

            diesel::update(teachers::table.filter(teachers::tid.eq(info.tid)))
                .set((
                    teachers::rating.eq(rating),
                    teachers::rating_count.eq(count as i32),
                ))
                .execute(&conn)
                .context("DB error")?;

            Ok((rating, count as i32))
        })
    })
    .await?;

    Ok(RateTeacherResponse {
        success: true,
        err: "".to_string(),
        rating,
        rating_count,
    })
}

async fn search_notification_impl(
    pool: web::Data<DbPool>,
    info: web::Json<SearchNotificationRequest>,
) -> anyhow::Result<SearchNotificationResponse> {
    use crate::schema::notifications;

    let info = info.into_inner();
    let username = get_username_from_token(info.login_token, &pool).await?;

    let conn = get_db_conn(&pool)?;
    let first_index = info.first_index.unwrap_or(0).max(0);
    let limit = info.limit.unwrap_or(30).max(0);
    let rows = blocking(move || {
        notifications::table
            .filter(notifications::username.eq(&username))
            .order(notifications::created_at.desc())
            .offset(first_index)
            .limit(limit)
            .get_results::<Notification>(&conn)
            .context("DB error")
    })
    .await?;

    let notification_list = rows
        .into_iter()
        .map(|data| SearchNotificationItem {
            nid: data.nid,
            title: data.title,
            message: data.message,
            is_read: data.is_read,
            created_at: crate::utils::format_time_str(&data.created_at),
        })
        .collect();

    Ok(SearchNotificationResponse {
        success: true,
        err: "".to_string(),
        notifications: notification_list,
    })
}

async fn unread_count_impl(
    pool: web::Data<DbPool>,
    info: web::Json<UnreadCountRequest>,
) -> anyhow::Result<UnreadCountResponse> {
    use crate::schema::notifications;

    let info = info.into_inner();
    let username = get_username_from_token(info.login_token, &pool).await?;

    let conn = get_db_conn(&pool)?;
    let unread_count_val = blocking(move || {
        notifications::table
            .filter(notifications::username.eq(&username))
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result::<i64>(&conn)
            .context("DB error")
    })
    .await?;

    Ok(UnreadCountResponse {
        success: true,
        err: "".to_string(),
        unread_count: unread_count_val,
    })
}

async fn mark_notifications_read_impl(
    pool: web::Data<DbPool>,
    info: web::Json<MarkNotificationsReadRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::notifications;

    let info = info.into_inner();
    let username = get_username_from_token(info.login_token, &pool).await?;

    let conn = get_db_conn(&pool)?;
    blocking(move || {
        diesel::update(
            notifications::table
                .filter(notifications::username.eq(&username))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&conn)
        .context("DB error")
    })
    .await?;

    Ok(SimpleResponse::ok())
}

async fn delete_notification_impl(
    pool: web::Data<DbPool>,
    info: web::Json<DeleteNotificationRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::notifications;

    let info = info.into_inner();
    let username = get_username_from_token(info.login_token.clone(), &pool).await?;

    let conn = get_db_conn(&pool)?;
    let deleted = blocking(move || {
        diesel::delete(
            notifications::table
                .filter(notifications::nid.eq(info.nid))
                .filter(notifications::username.eq(&username)),
        )
        .execute(&conn)
        .context("DB error")
    })
    .await?;
    if deleted == 0 {
        not_found!("Notification not found or you do not have permission to delete it.");
    }

    Ok(SimpleResponse::ok())
}

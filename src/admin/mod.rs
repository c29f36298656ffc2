mod requests;
mod responses;
mod utils;

use actix_web::{post, web, HttpResponse, Responder};
use anyhow::Context;
use diesel::prelude::*;

use crate::{
    database::{self, assert, blocking, get_db_conn},
    mailer::Mailer,
    models::{
        bookings::{
            active_statuses, Booking, BOOKING_STATUS_CANCELLED, BOOKING_STATUS_MODIFIED,
        },
        teachers::{NewTeacher, TeacherData, UpdateTeacher},
        users::UserData,
    },
    not_found, notify,
    protocol::SimpleResponse,
    reject, schedule, slots, DbPool,
};

use self::{requests::*, responses::*, utils::get_admin_from_token};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(add_teacher)
        .service(modify_teacher)
        .service(check_schedule_changes)
        .service(notify_students)
        .service(bookings_by_slot)
        .service(search_booking)
        .service(create_notification);
}

crate::post_funcs! {
    (add_teacher, "/add_teacher", AddTeacherRequest, AddTeacherResponse),
    (modify_teacher, "/modify_teacher", ModifyTeacherRequest, SimpleResponse),
    (bookings_by_slot, "/bookings_by_slot", BookingsBySlotRequest, BookingsBySlotResponse),
    (search_booking, "/search_booking", SearchBookingRequest, SearchBookingResponse),
    (create_notification, "/create_notification", CreateNotificationRequest, CreateNotificationResponse),
}

crate::post_mailer_funcs! {
    (check_schedule_changes, "/check_schedule_changes", CheckScheduleChangesRequest, CheckScheduleChangesResponse),
    (notify_students, "/notify_students", NotifyStudentsRequest, NotifyStudentsResponse),
}

fn assert_new_slot(slot: &NewSlot) -> anyhow::Result<()> {
    if slot.date.is_empty() || slot.time.is_empty() || slot.place.is_empty() {
        reject!("New slot must include date, time, and place.");
    }
    Ok(())
}

async fn add_teacher_impl(
    pool: web::Data<DbPool>,
    info: web::Json<AddTeacherRequest>,
) -> anyhow::Result<AddTeacherResponse> {
    use crate::schema::teachers;

    let info = info.into_inner();
    get_admin_from_token(info.login_token.clone(), &pool).await?;
    schedule::assert_schedule(&info.schedule)?;
    if info.max_students_per_group <= 0 {
        log::warn!(
            "teacher '{}' created with max_students_per_group = {}, all bookings will stay pending",
            info.name,
            info.max_students_per_group
        );
    }

    let conn = get_db_conn(&pool)?;
    let tid = blocking(move || {
        conn.transaction(|| {
            let res = teachers::table
                .filter(teachers::name.eq(&info.name))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res > 0 {
                reject!("Teacher already exists.");
            }

            let data = NewTeacher {
                name: info.name,
                subject: info.subject,
                governorate: info.governorate,
                price_per_session: info.price_per_session,
                max_students_per_group: info.max_students_per_group,
                schedule: schedule::encode_schedule(&info.schedule)?,
                rating: 0.0,
                rating_count: 0,
            };
            diesel::insert_into(teachers::table)
                .values(data)
                .execute(&conn)
                .context("DB error")?;
            diesel::select(database::last_insert_id)
                .get_result::<u64>(&conn)
                .context("DB error")
        })
    })
    .await?;

    Ok(AddTeacherResponse {
        success: true,
        err: "".to_string(),
        tid,
    })
}

async fn modify_teacher_impl(
    pool: web::Data<DbPool>,
    info: web::Json<ModifyTeacherRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::{bookings, teachers};

    let info = info.into_inner();
    get_admin_from_token(info.login_token.clone(), &pool).await?;
    if let Some(schedule) = &info.schedule {
        schedule::assert_schedule(schedule)?;
    }
    if info.name.is_none()
        && info.governorate.is_none()
        && info.price_per_session.is_none()
        && info.max_students_per_group.is_none()
        && info.schedule.is_none()
    {
        reject!("Nothing to modify.");
    }

    let conn = get_db_conn(&pool)?;
    blocking(move || {
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
            let old_max = teacher.max_students_per_group;
            let new_max = info.max_students_per_group;

            let schedule_json = match &info.schedule {
                Some(schedule) => Some(schedule::encode_schedule(schedule)?),
                None => None,
            };
            let data = UpdateTeacher {
                name: info.name,
                governorate: info.governorate,
                price_per_session: info.price_per_session,
                max_students_per_group: info.max_students_per_group,
                schedule: schedule_json,
            };
            diesel::update(teachers::table.filter(teachers::tid.eq(info.tid)))
                .set(&data)
                .execute(&conn)
                .context("DB error")?;

            // a schedule edit can strip or move slots out from under active
            // bookings; flag those as modified and tell their owners (the
            // schedule-change endpoint is the path that also emails)
            if let Some(new_schedule) = &info.schedule {
                let old_schedule = schedule::decode_schedule(&teacher.schedule)?;
                let rows = bookings::table
                    .filter(bookings::tid.eq(info.tid))
                    .filter(bookings::status.eq_any(active_statuses()))
                    .get_results::<Booking>(&conn)
                    .context("DB error")?;
                for booking in rows {
                    let date_str = booking.date.format("%Y-%m-%d").to_string();
                    if !schedule::slot_changed(&old_schedule, new_schedule, &date_str, &booking.time)
                    {
                        continue;
                    }
                    diesel::update(bookings::table.filter(bookings::bid.eq(booking.bid)))
                        .set(bookings::status.eq(BOOKING_STATUS_MODIFIED))
                        .execute(&conn)
                        .context("DB error")?;
                    notify::push_notification(
                        &conn,
                        &booking.username,
                        notify::TITLE_BOOKING_MODIFIED,
                        &notify::booking_modified_message(&teacher.name, &booking),
                    )?;
                }
            }

            // a capacity increase frees seats teacher-wide; sweep the stored
            // schedule and fill them oldest-first
            if let Some(new_max) = new_max {
                if new_max > old_max {
                    let teacher = teachers::table
                        .filter(teachers::tid.eq(info.tid))
                        .get_result::<TeacherData>(&conn)
                        .context("DB error")?;
                    let promoted = slots::promote_for_capacity_increase(&conn, &teacher)?;
                    if promoted > 0 {
                        log::info!(
                            "capacity increase for teacher {} promoted {} pending bookings",
                            teacher.tid,
                            promoted
                        );
                    }
                }
            }

            Ok(())
        })
    })
    .await?;

    Ok(SimpleResponse::ok())
}

async fn check_schedule_changes_impl(
    pool: web::Data<DbPool>,
    mailer: web::Data<Mailer>,
    info: web::Json<CheckScheduleChangesRequest>,
) -> anyhow::Result<CheckScheduleChangesResponse> {
    use crate::schema::{bookings, teachers, users};

    let info = info.into_inner();
    get_admin_from_token(info.login_token.clone(), &pool).await?;
    // validated before any booking is touched
    assert_new_slot(&info.new_slot)?;

    let mailer = mailer.get_ref().clone();
    let conn = get_db_conn(&pool)?;
    let (affected, sent, failed) = blocking(move || {
        conn.transaction(|| {
            let teacher = teachers::table
                .filter(teachers::tid.eq(info.tid))
                .get_result::<TeacherData>(&conn)
                .optional()
                .context("DB error")?;
            let teacher = match teacher {
                Some(teacher) => teacher,
                None => not_found!("Teacher not found."),
            };

            let rows = bookings::table
                .filter(bookings::tid.eq(info.tid))
                .filter(bookings::status.eq_any(active_statuses()))
                .get_results::<Booking>(&conn)
                .context("DB error")?;

            let mut affected = Vec::new();
            let mut sent = 0;
            let mut failed = 0;
            for booking in rows {
                let date_str = booking.date.format("%Y-%m-%d").to_string();
                if !schedule::slot_changed(
                    &info.old_schedule,
                    &info.new_schedule,
                    &date_str,
                    &booking.time,
                ) {
                    continue;
                }

                diesel::update(bookings::table.filter(bookings::bid.eq(booking.bid)))
                    .set(bookings::status.eq(BOOKING_STATUS_MODIFIED))
                    .execute(&conn)
                    .context("DB error")?;

                let user = users::table
                    .filter(users::username.eq(&booking.username))
                    .get_result::<UserData>(&conn)
                    .optional()
                    .context("DB error")?;
                let email = match &user {
                    Some(user) => user.email.clone(),
                    None => {
                        log::warn!(
                            "user {} missing for booking {}",
                            booking.username,
                            booking.bid
                        );
                        "".to_string()
                    }
                };
                if let Some(user) = &user {
                    if !user.email.is_empty() {
                        let body = notify::reschedule_email(
                            &user.name,
                            &teacher.name,
                            &booking,
                            &info.new_slot.date,
                            &info.new_slot.time,
                            &info.new_slot.place,
                            None,
                        );
                        match mailer.send(notify::EMAIL_SUBJECT_RESCHEDULED, &body, &user.email) {
                            Ok(()) => sent += 1,
                            Err(err) => {
                                failed += 1;
                                log::warn!(
                                    "failed to email {} about schedule change: {:#}",
                                    user.email,
                                    err
                                );
                            }
                        }
                    }
                }

                affected.push(AffectedBookingItem {
                    bid: booking.bid,
                    username: booking.username.clone(),
                    email,
                    date: date_str,
                    time: booking.time.clone(),
                    place: booking.place.clone(),
                    new_date: info.new_slot.date.clone(),
                    new_time: info.new_slot.time.clone(),
                    new_place: info.new_slot.place.clone(),
                });
            }

            Ok((affected, sent, failed))
        })
    })
    .await?;

    let detail = if affected.is_empty() {
        "No bookings were affected by the schedule change.".to_string()
    } else {
        format!(
            "{} booking(s) affected; {} emails sent, {} failed.",
            affected.len(),
            sent,
            failed
        )
    };
    Ok(CheckScheduleChangesResponse {
        success: true,
        err: "".to_string(),
        detail,
        affected_bookings: affected,
    })
}

async fn notify_students_impl(
    pool: web::Data<DbPool>,
    mailer: web::Data<Mailer>,
    info: web::Json<NotifyStudentsRequest>,
) -> anyhow::Result<NotifyStudentsResponse> {
    use crate::schema::{bookings, teachers, users};

    let info = info.into_inner();
    get_admin_from_token(info.login_token.clone(), &pool).await?;
    if info.action != "cancel" && info.action != "reschedule" {
        reject!("Invalid action. Use 'cancel' or 'reschedule'.");
    }
    if info.action == "reschedule" {
        assert_new_slot(&info.new_slot)?;
    }

    // row updates commit as one unit; email sends are best-effort per item
    let mailer = mailer.get_ref().clone();
    let conn = get_db_conn(&pool)?;
    let (sent, failed) = blocking(move || {
        conn.transaction(|| {
            let teacher = teachers::table
                .filter(teachers::tid.eq(info.tid))
                .get_result::<TeacherData>(&conn)
                .optional()
                .context("DB error")?;
            let teacher = match teacher {
                Some(teacher) => teacher,
                None => not_found!("Teacher not found."),
            };

            let rows = bookings::table
                .filter(bookings::bid.eq_any(info.booking_ids.clone()))
                .filter(bookings::tid.eq(info.tid))
                .get_results::<Booking>(&conn)
                .context("DB error")?;
            if rows.is_empty() {
                reject!("No valid bookings found.");
            }

            let mut sent = 0;
            let mut failed = 0;
            for booking in rows {
                let new_status = if info.action == "cancel" {
                    // bulk cancellation does not reconcile the waitlist: the
                    // slot itself is being withdrawn
                    BOOKING_STATUS_CANCELLED
                } else {
                    BOOKING_STATUS_MODIFIED
                };
                diesel::update(bookings::table.filter(bookings::bid.eq(booking.bid)))
                    .set(bookings::status.eq(new_status))
                    .execute(&conn)
                    .context("DB error")?;

                let user = users::table
                    .filter(users::username.eq(&booking.username))
                    .get_result::<UserData>(&conn)
                    .optional()
                    .context("DB error")?;
                let user = match user {
                    Some(user) => user,
                    None => {
                        log::warn!(
                            "user {} missing for booking {}",
                            booking.username,
                            booking.bid
                        );
                        continue;
                    }
                };
                if user.email.is_empty() {
                    continue;
                }

                let (subject, body) = if info.action == "cancel" {
                    (
                        notify::EMAIL_SUBJECT_CANCELLED,
                        notify::cancellation_email(
                            &user.username,
                            &teacher.name,
                            &booking,
                            &info.message,
                        ),
                    )
                } else {
                    (
                        notify::EMAIL_SUBJECT_RESCHEDULED,
                        notify::reschedule_email(
                            &user.username,
                            &teacher.name,
                            &booking,
                            &info.new_slot.date,
                            &info.new_slot.time,
                            &info.new_slot.place,
                            Some(&info.message),
                        ),
                    )
                };
                match mailer.send(subject, &body, &user.email) {
                    Ok(()) => sent += 1,
                    Err(err) => {
                        failed += 1;
                        log::warn!("failed to email {}: {:#}", user.email, err);
                    }
                }
            }

            Ok((sent, failed))
        })
    })
    .await?;

    Ok(NotifyStudentsResponse {
        success: true,
        err: "".to_string(),
        detail: format!(
            "Notifications processed: {} emails sent successfully, {} failed.",
            sent, failed
        ),
        emails_sent: sent,
        emails_failed: failed,
    })
}

async fn bookings_by_slot_impl(
    pool: web::Data<DbPool>,
    info: web::Json<BookingsBySlotRequest>,
) -> anyhow::Result<BookingsBySlotResponse> {
    use crate::schema::bookings;

    let info = info.into_inner();
    get_admin_from_token(info.login_token.clone(), &pool).await?;
    assert::assert_teacher(&pool, info.tid).await?;
    let date = crate::utils::parse_date_str(&info.date)?;

    let conn = get_db_conn(&pool)?;
    let rows = blocking(move || {
        bookings::table
            .filter(bookings::tid.eq(info.tid))
            .filter(bookings::date.eq(date))
            .filter(bookings::time.eq(&info.time))
            .filter(bookings::place.eq(&info.place))
            .filter(bookings::status.eq_any(active_statuses()))
            .order(bookings::created_at.asc())
            .get_results::<Booking>(&conn)
            .context("DB error")
    })
    .await?;

    let bookings_list = rows
        .into_iter()
        .map(|booking| BookingsBySlotItem {
            bid: booking.bid,
            username: booking.username,
            status: booking.status,
            created_at: crate::utils::format_time_str(&booking.created_at),
        })
        .collect();

    Ok(BookingsBySlotResponse {
        success: true,
        err: "".to_string(),
        bookings: bookings_list,
    })
}

async fn search_booking_impl(
    pool: web::Data<DbPool>,
    info: web::Json<SearchBookingRequest>,
) -> anyhow::Result<SearchBookingResponse> {
    use crate::schema::{bookings, teachers};

    let info = info.into_inner();
    get_admin_from_token(info.login_token.clone(), &pool).await?;

    let conn = get_db_conn(&pool)?;
    let status = info.status.unwrap_or_else(|| "all".to_string());
    let tid_all = info.tid.is_none();
    let tid = info.tid.unwrap_or(0);
    let first_index = info.first_index.unwrap_or(0).max(0);
    let limit = info.limit.unwrap_or(30).max(0);
    let rows = blocking(move || {
        bookings::table
            .filter((bookings::status.eq(&status)).or(&status == "all"))
            .filter((bookings::tid.eq(tid)).or(tid_all))
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
            username: booking.username,
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

async fn create_notification_impl(
    pool: web::Data<DbPool>,
    info: web::Json<CreateNotificationRequest>,
) -> anyhow::Result<CreateNotificationResponse> {
    use crate::schema::users;

    let info = info.into_inner();
    get_admin_from_token(info.login_token.clone(), &pool).await?;
    if info.title.trim().is_empty() || info.message.trim().is_empty() {
        reject!("Title and message are required.");
    }

    let created = if info.send_to_all {
        let conn = get_db_conn(&pool)?;
        blocking(move || {
            conn.transaction(|| {
                let usernames = users::table
                    .select(users::username)
                    .get_results::<String>(&conn)
                    .context("DB error")?;
                if usernames.is_empty() {
                    reject!("No users found in the system.");
                }
                for username in &usernames {
                    notify::push_notification(&conn, username, &info.title, &info.message)?;
                }
                Ok(usernames.len() as i64)
            })
        })
        .await?
    } else {
        let username = match &info.username {
            Some(username) if !username.is_empty() => username.clone(),
            _ => reject!("username is required when sending to a specific user."),
        };
        assert::assert_user(&pool, username.clone()).await?;

        let conn = get_db_conn(&pool)?;
        blocking(move || notify::push_notification(&conn, &username, &info.title, &info.message))
            .await?;
        1
    };

    Ok(CreateNotificationResponse {
        success: true,
        err: "".to_string(),
        created,
    })
}

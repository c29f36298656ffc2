table! {
    bookings (bid) {
        bid -> Unsigned<Bigint>,
        username -> Varchar,
        tid -> Unsigned<Bigint>,
        subject -> Varchar,
        date -> Date,
        time -> Varchar,
        place -> Varchar,
        status -> Varchar,
        created_at -> Datetime,
    }
}

table! {
    notifications (nid) {
        nid -> Unsigned<Bigint>,
        username -> Varchar,
        title -> Varchar,
        message -> Text,
        is_read -> Bool,
        created_at -> Datetime,
    }
}

table! {
    ratings (rid) {
        rid -> Unsigned<Bigint>,
        username -> Varchar,
        tid -> Unsigned<Bigint>,
        rating -> Double,
        created_at -> Datetime,
    }
}

table! {
    teachers (tid) {
        tid -> Unsigned<Bigint>,
        name -> Varchar,
        subject -> Varchar,
        governorate -> Varchar,
        price_per_session -> Double,
        max_students_per_group -> Integer,
        schedule -> Text,
        rating -> Double,
        rating_count -> Integer,
    }
}

table! {
    user_logins (token, username, login_time) {
        token -> Varchar,
        username -> Varchar,
        login_time -> Datetime,
    }
}

table! {
    users (username) {
        username -> Varchar,
        password -> Varchar,
        name -> Varchar,
        email -> Varchar,
        telephone -> Varchar,
        is_admin -> Bool,
    }
}

allow_tables_to_appear_in_same_query!(
    bookings,
    notifications,
    ratings,
    teachers,
    user_logins,
    users,
);

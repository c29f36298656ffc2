use std::fmt;

use actix_web::http::StatusCode;
use serde::Serialize;

#[derive(Default, Serialize)]
pub struct SimpleResponse {
    pub success: bool,
    pub err: String,
}

impl SimpleResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            err: "".to_string(),
        }
    }
}

#[macro_export]
macro_rules! impl_err_response {
    ( $( $type:ty),+ $(,)? ) => {
        $(
            impl $type {
                pub fn err<S: ToString>(err: S) -> Self {
                    Self {
                        success: false,
                        err: err.to_string(),
                        ..Default::default()
                    }
                }
            }
        )+
    };
}

impl_err_response! {
    SimpleResponse,
}

/// Guard failures carried through `anyhow`. Anything that does not
/// downcast to one of these is an internal fault.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Unauthenticated(String),
    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::Forbidden(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ApiError {}

#[macro_export]
macro_rules! reject {
    ($($arg:tt)*) => {
        return Err($crate::protocol::ApiError::Validation(format!($($arg)*)).into())
    };
}

#[macro_export]
macro_rules! not_found {
    ($($arg:tt)*) => {
        return Err($crate::protocol::ApiError::NotFound(format!($($arg)*)).into())
    };
}

#[macro_export]
macro_rules! unauthenticated {
    ($($arg:tt)*) => {
        return Err($crate::protocol::ApiError::Unauthenticated(format!($($arg)*)).into())
    };
}

#[macro_export]
macro_rules! forbidden {
    ($($arg:tt)*) => {
        return Err($crate::protocol::ApiError::Forbidden(format!($($arg)*)).into())
    };
}

/// Maps an endpoint failure to a wire status and user-facing message.
/// Guard failures keep their message; internal faults are logged in full
/// and surfaced as a generic 500.
pub fn classify(err: &anyhow::Error) -> (StatusCode, String) {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
        Some(ApiError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
        Some(ApiError::Unauthenticated(msg)) => (StatusCode::UNAUTHORIZED, msg.clone()),
        Some(ApiError::Forbidden(msg)) => (StatusCode::FORBIDDEN, msg.clone()),
        None => {
            log::error!("internal error: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error.".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard_failure() -> anyhow::Result<()> {
        reject!("The selected slot is not available.")
    }

    #[test]
    fn classify_keeps_guard_messages() {
        let err = guard_failure().unwrap_err();
        let (status, msg) = classify(&err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "The selected slot is not available.");
    }

    #[test]
    fn classify_separates_the_four_classes() {
        let cases: Vec<(anyhow::Error, StatusCode)> = vec![
            (ApiError::Validation("v".into()).into(), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("n".into()).into(), StatusCode::NOT_FOUND),
            (
                ApiError::Unauthenticated("u".into()).into(),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::Forbidden("f".into()).into(), StatusCode::FORBIDDEN),
        ];
        for (err, expected) in cases {
            assert_eq!(classify(&err).0, expected);
        }
    }

    #[test]
    fn classify_hides_internal_detail() {
        let err = anyhow::anyhow!("lost connection to mysql at step 3");
        let (status, msg) = classify(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!msg.contains("mysql"));
    }

    #[test]
    fn classify_sees_through_context() {
        use anyhow::Context;
        let err: anyhow::Error = Err::<(), _>(ApiError::Validation("too late".into()))
            .context("cancel booking")
            .unwrap_err();
        let (status, msg) = classify(&err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "too late");
    }
}

use std::convert::Infallible;

use checkpointz_beacon::Error;
use warp::{
    http::StatusCode,
    reject::{Reject, Rejection},
    reply::{Reply, with_status},
};

use crate::types::response::ErrorResponse;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    UnsupportedMediaType,
    ServiceUnavailable(String),
    InternalError(String),
}

impl Reject for ApiError {}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound => ApiError::NotFound("not found".to_string()),
            Error::NotReady(reason) => ApiError::ServiceUnavailable(reason.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

/// Converts typed rejections into the `{ "message": ..., "code": ... }`
/// error body every endpoint shares.
pub async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(err) = rejection.find::<ApiError>() {
        match err {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            ApiError::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported media type".to_string(),
            ),
            ApiError::ServiceUnavailable(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, message.clone())
            }
            ApiError::InternalError(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
            }
        }
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_string(),
        )
    };

    Ok(with_status(
        warp::reply::json(&ErrorResponse {
            message,
            code: status.as_u16(),
        }),
        status,
    ))
}

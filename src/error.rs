use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::db::StorageError;
use crate::ledger::BookingError;
use crate::models::MessageResponse;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(MessageResponse::new(msg))).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(value: StorageError) -> Self {
        error!("Storage error: {value}");
        ApiError::Internal("Internal Server Error".into())
    }
}

impl From<BookingError> for ApiError {
    fn from(value: BookingError) -> Self {
        match value {
            BookingError::ClassNotFound => ApiError::NotFound(value.to_string()),
            BookingError::InvalidDateRange => ApiError::Unprocessable(value.to_string()),
            BookingError::ClassFull => ApiError::Conflict(value.to_string()),
            BookingError::Storage(err) => err.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        match value {
            JsonRejection::JsonDataError(err) => ApiError::Unprocessable(err.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_error_status() {
        let status = |err: BookingError| ApiError::from(err).into_response().status();
        assert_eq!(status(BookingError::ClassNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(BookingError::InvalidDateRange), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status(BookingError::ClassFull), StatusCode::CONFLICT);
        assert_eq!(
            status(BookingError::Storage(StorageError::Busy { attempts: 4 })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

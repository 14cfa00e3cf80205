use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("that date and time could not be understood, please use a valid 30-minute slot")]
    InvalidTimestamp,

    #[error("we're closed at that time; open Tue-Fri 9:00-19:00 and Sat 8:00-17:00")]
    OutsideBusinessHours,

    #[error("please select at least one of washing, cutting or coloring")]
    NoServiceSelected,

    #[error("no service matches the requested combination")]
    ServiceNotFound,

    #[error("that time slot is already booked, please pick a different time")]
    SlotConflict,

    #[error("appointment not found")]
    NotFoundOrForbidden,

    #[error("the appointment is already scheduled at that time")]
    NoChange,

    #[error("the new time is in the past")]
    PastDate,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("an account with that email already exists")]
    EmailTaken,

    #[error("{0}")]
    BadRequest(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidTimestamp
            | AppError::OutsideBusinessHours
            | AppError::NoServiceSelected
            | AppError::NoChange
            | AppError::PastDate
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ServiceNotFound | AppError::NotFoundOrForbidden => StatusCode::NOT_FOUND,
            AppError::SlotConflict | AppError::EmailTaken => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self}");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Commit paths translate a violated unique index into the same conflict
/// error the pre-check produces, so callers see one contract either way.
pub fn map_slot_constraint(err: rusqlite::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::SlotConflict
    } else {
        AppError::Database(err)
    }
}

pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

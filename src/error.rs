//! Error types for the Bookflix server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes surfaced to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchRecord = 4,
    NoCopyAvailable = 5,
    Duplicate = 6,
    BadValue = 7,
    MaxBorrowsReached = 8,
    MaxRenewalsReached = 9,
    LoanOverdue = 10,
    AlreadyReturned = 11,
    AlreadyReserved = 12,
    AlreadyBorrowed = 13,
    BookAvailable = 14,
    ReservationCompleted = 15,
    InsufficientStock = 16,
    FineNotPending = 17,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    // Business-rule rejections. Each carries enough context for the caller
    // to explain the rejection to a user.
    #[error("Borrow limit reached ({current}/{limit}): up to {limit} books at a time")]
    BorrowLimitReached { current: i64, limit: i64 },

    #[error("Member already has an active loan of this book")]
    DuplicateLoan,

    #[error("No copy of this book is currently available")]
    NoCopyAvailable,

    #[error("Renewal limit reached ({limit} renewals allowed)")]
    RenewalLimitReached { limit: i16 },

    #[error("Overdue loans cannot be renewed; return the book first")]
    CannotRenewOverdue,

    #[error("Loan has already been returned")]
    AlreadyReturned,

    #[error("Member already has an unresolved reservation for this book")]
    AlreadyReserved,

    #[error("Member already holds a copy of this book")]
    AlreadyBorrowed,

    #[error("A copy is available; borrow it directly instead of reserving")]
    BookCurrentlyAvailable,

    #[error("No available copy could be assigned to this reservation")]
    NoAvailableCopy,

    #[error("Completed reservations cannot be cancelled")]
    CannotCancelCompleted,

    #[error("Cannot remove {needed} copies: only {removable} available for removal")]
    InsufficientRemovableStock { needed: i64, removable: i64 },

    #[error("Fine is not pending")]
    FineNotPending,
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchRecord),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure)
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Duplicate),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure)
            }
            AppError::BorrowLimitReached { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::MaxBorrowsReached)
            }
            AppError::DuplicateLoan => (StatusCode::CONFLICT, ErrorCode::Duplicate),
            AppError::NoCopyAvailable => (StatusCode::CONFLICT, ErrorCode::NoCopyAvailable),
            AppError::RenewalLimitReached { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::MaxRenewalsReached)
            }
            AppError::CannotRenewOverdue => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::LoanOverdue)
            }
            AppError::AlreadyReturned => (StatusCode::CONFLICT, ErrorCode::AlreadyReturned),
            AppError::AlreadyReserved => (StatusCode::CONFLICT, ErrorCode::AlreadyReserved),
            AppError::AlreadyBorrowed => (StatusCode::CONFLICT, ErrorCode::AlreadyBorrowed),
            AppError::BookCurrentlyAvailable => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::BookAvailable)
            }
            AppError::NoAvailableCopy => (StatusCode::CONFLICT, ErrorCode::NoCopyAvailable),
            AppError::CannotCancelCompleted => {
                (StatusCode::CONFLICT, ErrorCode::ReservationCompleted)
            }
            AppError::InsufficientRemovableStock { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::InsufficientStock)
            }
            AppError::FineNotPending => (StatusCode::CONFLICT, ErrorCode::FineNotPending),
        };

        // Internal failures keep their detail in the logs, not the response
        let message = match &self {
            AppError::Database(_) => "Database error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

//! Notification intent types
//!
//! The engine emits *intents*: structured descriptions of state changes
//! destined for an external delivery pipeline. Payloads are a closed tagged
//! union, never an open string-keyed map.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Structured payload for each notification kind
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NotificationPayload {
    BookBorrowed {
        borrowing_id: i32,
        book_id: i32,
        book_title: String,
        due_date: DateTime<Utc>,
    },
    BorrowingDue {
        borrowing_id: i32,
        book_id: i32,
        book_title: String,
        due_date: DateTime<Utc>,
        days_remaining: i64,
    },
    BorrowingOverdue {
        borrowing_id: i32,
        book_id: i32,
        book_title: String,
        due_date: DateTime<Utc>,
        days_overdue: i64,
    },
    FineIssued {
        fine_id: i32,
        borrowing_id: i32,
        book_id: i32,
        book_title: String,
        #[schema(value_type = f64)]
        amount: Decimal,
        days_overdue: i64,
    },
    ReservationReady {
        reservation_id: i32,
        book_id: i32,
        book_title: String,
        pickup_expiry_date: DateTime<Utc>,
    },
    ReservationExpired {
        reservation_id: i32,
        book_id: i32,
        book_title: String,
    },
}

impl NotificationPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationPayload::BookBorrowed { .. } => "book_borrowed",
            NotificationPayload::BorrowingDue { .. } => "borrowing_due",
            NotificationPayload::BorrowingOverdue { .. } => "borrowing_overdue",
            NotificationPayload::FineIssued { .. } => "fine_issued",
            NotificationPayload::ReservationReady { .. } => "reservation_ready",
            NotificationPayload::ReservationExpired { .. } => "reservation_expired",
        }
    }

    /// Whether the delivery pipeline should also send an email for this kind
    pub fn sends_email(&self) -> bool {
        matches!(
            self,
            NotificationPayload::FineIssued { .. } | NotificationPayload::ReservationReady { .. }
        )
    }
}

/// A notification intent addressed to one member
#[derive(Debug, Clone)]
pub struct NotificationIntent {
    pub member_id: i32,
    pub payload: NotificationPayload,
}

impl NotificationIntent {
    pub fn new(member_id: i32, payload: NotificationPayload) -> Self {
        Self { member_id, payload }
    }
}

/// Persisted notification row
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i32,
    pub member_id: i32,
    pub kind: String,
    pub title: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    pub email: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_flags() {
        let ready = NotificationPayload::ReservationReady {
            reservation_id: 1,
            book_id: 2,
            book_title: "Dune".to_string(),
            pickup_expiry_date: Utc::now(),
        };
        assert!(ready.sends_email());

        let overdue = NotificationPayload::BorrowingOverdue {
            borrowing_id: 1,
            book_id: 2,
            book_title: "Dune".to_string(),
            due_date: Utc::now(),
            days_overdue: 3,
        };
        assert!(!overdue.sends_email());
    }

    #[test]
    fn test_payload_serializes_tagged() {
        let payload = NotificationPayload::ReservationExpired {
            reservation_id: 7,
            book_id: 3,
            book_title: "Dune".to_string(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "reservation_expired");
        assert_eq!(value["data"]["reservation_id"], 7);
    }
}

//! Reservation (hold) model and queue state machine types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Reservation status.
///
/// `pending → ready → completed` is the happy path; `cancelled` and
/// `expired` are terminal from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reservation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Ready,
    Completed,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed | ReservationStatus::Cancelled | ReservationStatus::Expired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Ready => "ready",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reservation model from database.
///
/// `expiry_date` is the queue expiry fixed at request time;
/// `pickup_expiry_date` is the shorter pickup window set when the hold
/// becomes ready. They are kept distinct on purpose.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i32,
    pub member_id: i32,
    pub book_id: i32,
    pub book_copy_id: Option<i32>,
    pub reserved_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub pickup_expiry_date: Option<DateTime<Utc>>,
    pub ready_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub cancelled_date: Option<DateTime<Utc>>,
    pub cancelled_by: Option<i32>,
    pub status: ReservationStatus,
    pub queue_position: i32,
}

impl Reservation {
    /// The expiry that applies to the reservation's current state
    pub fn effective_expiry(&self) -> DateTime<Utc> {
        match self.status {
            ReservationStatus::Ready => self.pickup_expiry_date.unwrap_or(self.expiry_date),
            _ => self.expiry_date,
        }
    }

    /// Whether the reservation has logically timed out at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.effective_expiry() < now
    }
}

/// Reservation with book title, for display
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ReservationDetails {
    pub id: i32,
    pub member_id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub reserved_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub pickup_expiry_date: Option<DateTime<Utc>>,
    pub status: ReservationStatus,
    pub queue_position: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reservation(status: ReservationStatus) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: 1,
            member_id: 1,
            book_id: 1,
            book_copy_id: None,
            reserved_date: now - Duration::days(10),
            expiry_date: now + Duration::days(4),
            pickup_expiry_date: None,
            ready_date: None,
            completed_date: None,
            cancelled_date: None,
            cancelled_by: None,
            status,
            queue_position: 1,
        }
    }

    #[test]
    fn test_pending_uses_queue_expiry() {
        let mut r = reservation(ReservationStatus::Pending);
        assert!(!r.is_expired_at(Utc::now()));
        r.expiry_date = Utc::now() - Duration::hours(1);
        assert!(r.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_ready_uses_pickup_window() {
        let mut r = reservation(ReservationStatus::Ready);
        r.pickup_expiry_date = Some(Utc::now() - Duration::hours(1));
        // queue expiry is still in the future, but the pickup window rules
        assert!(r.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_terminal_states_never_expire() {
        let mut r = reservation(ReservationStatus::Completed);
        r.expiry_date = Utc::now() - Duration::days(1);
        assert!(!r.is_expired_at(Utc::now()));
    }
}

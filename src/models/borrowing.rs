//! Borrowing (loan) model and derived status helpers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Borrowing status as reported to clients.
///
/// Only `returned` corresponds to a stored fact (`returned_date`); an open
/// loan is `active` or `overdue` depending on `due_date` at read time, so
/// the database never holds a stale status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowingStatus {
    Active,
    Overdue,
    Returned,
}

/// Borrowing model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i32,
    pub member_id: i32,
    pub book_id: i32,
    pub book_copy_id: i32,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub renewal_count: i16,
    pub renewed_date: Option<DateTime<Utc>>,
    pub returned_by: Option<i32>,
}

impl Borrowing {
    /// Derive the status at a given instant
    pub fn status_at(&self, now: DateTime<Utc>) -> BorrowingStatus {
        if self.returned_date.is_some() {
            BorrowingStatus::Returned
        } else if self.due_date < now {
            BorrowingStatus::Overdue
        } else {
            BorrowingStatus::Active
        }
    }

    /// Whole days overdue, rounded up; 0 when not overdue or returned
    pub fn days_overdue_at(&self, now: DateTime<Utc>) -> i64 {
        if self.returned_date.is_some() {
            return 0;
        }
        days_overdue(self.due_date, now)
    }

    /// Whole days until due, rounded up; 0 when overdue or returned
    pub fn days_remaining_at(&self, now: DateTime<Utc>) -> i64 {
        if self.returned_date.is_some() {
            return 0;
        }
        days_overdue(now, self.due_date)
    }
}

/// Days from `from` to `to`, rounded up to whole days; 0 when `to <= from`
pub fn days_overdue(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let seconds = (to - from).num_seconds();
    if seconds <= 0 {
        0
    } else {
        (seconds + 86_399) / 86_400
    }
}

/// Borrowing with derived fields, for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowingDetails {
    pub id: i32,
    pub member_id: i32,
    pub book_id: i32,
    pub book_copy_id: i32,
    pub book_title: String,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub renewal_count: i16,
    pub status: BorrowingStatus,
    pub days_overdue: i64,
    pub days_remaining: i64,
}

impl BorrowingDetails {
    pub fn new(borrowing: Borrowing, book_title: String, now: DateTime<Utc>) -> Self {
        Self {
            status: borrowing.status_at(now),
            days_overdue: borrowing.days_overdue_at(now),
            days_remaining: borrowing.days_remaining_at(now),
            id: borrowing.id,
            member_id: borrowing.member_id,
            book_id: borrowing.book_id,
            book_copy_id: borrowing.book_copy_id,
            book_title,
            borrowed_date: borrowing.borrowed_date,
            due_date: borrowing.due_date,
            returned_date: borrowing.returned_date,
            renewal_count: borrowing.renewal_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn borrowing(due_offset: Duration, returned: bool) -> Borrowing {
        let now = Utc::now();
        Borrowing {
            id: 1,
            member_id: 1,
            book_id: 1,
            book_copy_id: 1,
            borrowed_date: now - Duration::days(7),
            due_date: now + due_offset,
            returned_date: returned.then_some(now),
            renewal_count: 0,
            renewed_date: None,
            returned_by: None,
        }
    }

    #[test]
    fn test_status_active() {
        let b = borrowing(Duration::days(3), false);
        assert_eq!(b.status_at(Utc::now()), BorrowingStatus::Active);
    }

    #[test]
    fn test_status_overdue() {
        let b = borrowing(Duration::days(-3), false);
        assert_eq!(b.status_at(Utc::now()), BorrowingStatus::Overdue);
    }

    #[test]
    fn test_status_returned_wins_over_overdue() {
        let b = borrowing(Duration::days(-3), true);
        assert_eq!(b.status_at(Utc::now()), BorrowingStatus::Returned);
    }

    #[test]
    fn test_days_overdue_rounds_up() {
        let now = Utc::now();
        let due = now - Duration::hours(25);
        assert_eq!(days_overdue(due, now), 2);
        let due = now - Duration::hours(24);
        assert_eq!(days_overdue(due, now), 1);
        let due = now - Duration::minutes(1);
        assert_eq!(days_overdue(due, now), 1);
    }

    #[test]
    fn test_days_overdue_zero_when_not_due() {
        let now = Utc::now();
        assert_eq!(days_overdue(now + Duration::days(1), now), 0);
        assert_eq!(days_overdue(now, now), 0);
    }
}

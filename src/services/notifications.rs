//! Notification intent emitter
//!
//! Composes the human-readable title/message for each intent kind, persists
//! the intent and logs it. Delivery (email, push) belongs to an external
//! pipeline reading the notifications table.

use crate::{
    error::AppResult,
    models::notification::{Notification, NotificationIntent, NotificationPayload},
    repository::Repository,
};

#[derive(Clone)]
pub struct NotificationService {
    repository: Repository,
}

impl NotificationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Emit an intent. Failures are logged, not propagated: a lost
    /// notification must never roll back the lending action it describes.
    pub async fn emit(&self, intent: NotificationIntent) {
        let (title, message) = compose(&intent.payload);
        let kind = intent.payload.kind();
        let email = intent.payload.sends_email();

        let payload = match serde_json::to_value(&intent.payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize {} payload: {}", kind, e);
                return;
            }
        };

        match self
            .repository
            .notifications
            .insert(intent.member_id, kind, &title, &message, &payload, email)
            .await
        {
            Ok(()) => {
                tracing::info!(member_id = intent.member_id, kind, email, "notification intent emitted");
            }
            Err(e) => {
                tracing::error!(member_id = intent.member_id, kind, "failed to persist notification intent: {}", e);
            }
        }
    }

    /// A member's notifications, newest first
    pub async fn get_member_notifications(&self, member_id: i32) -> AppResult<Vec<Notification>> {
        self.repository.members.get_by_id(member_id).await?;
        self.repository
            .notifications
            .get_member_notifications(member_id)
            .await
    }
}

/// Title and message for each intent kind
fn compose(payload: &NotificationPayload) -> (String, String) {
    match payload {
        NotificationPayload::BookBorrowed { book_title, due_date, .. } => (
            "Book borrowed".to_string(),
            format!(
                "You borrowed \"{}\". It is due back on {}.",
                book_title,
                due_date.format("%Y-%m-%d")
            ),
        ),
        NotificationPayload::BorrowingDue { book_title, due_date, days_remaining, .. } => (
            "Book due soon".to_string(),
            format!(
                "\"{}\" is due on {} ({} day(s) left). Renew or return it to avoid fines.",
                book_title,
                due_date.format("%Y-%m-%d"),
                days_remaining
            ),
        ),
        NotificationPayload::BorrowingOverdue { book_title, days_overdue, .. } => (
            "Book overdue".to_string(),
            format!(
                "\"{}\" is {} day(s) overdue. Please return it as soon as possible.",
                book_title, days_overdue
            ),
        ),
        NotificationPayload::FineIssued { book_title, amount, days_overdue, .. } => (
            "Fine issued".to_string(),
            format!(
                "A fine of {} has been issued for \"{}\" ({} day(s) overdue).",
                amount, book_title, days_overdue
            ),
        ),
        NotificationPayload::ReservationReady { book_title, pickup_expiry_date, .. } => (
            "Reserved book ready for pickup".to_string(),
            format!(
                "\"{}\" is being held for you. Pick it up before {}.",
                book_title,
                pickup_expiry_date.format("%Y-%m-%d")
            ),
        ),
        NotificationPayload::ReservationExpired { book_title, .. } => (
            "Reservation expired".to_string(),
            format!(
                "Your reservation for \"{}\" has expired and your place in the queue was released.",
                book_title
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_compose_mentions_title_and_numbers() {
        let (title, message) = compose(&NotificationPayload::BorrowingOverdue {
            borrowing_id: 1,
            book_id: 2,
            book_title: "Dune".to_string(),
            due_date: Utc::now(),
            days_overdue: 4,
        });
        assert_eq!(title, "Book overdue");
        assert!(message.contains("Dune"));
        assert!(message.contains('4'));
    }
}

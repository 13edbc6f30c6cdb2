//! Fine calculation service
//!
//! The sweep is externally triggered (cron) and idempotent: one pending
//! fine per overdue borrowing, re-accrued in place on every pass.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        borrowing::Borrowing,
        fine::Fine,
        notification::{NotificationIntent, NotificationPayload},
    },
    repository::Repository,
    services::notifications::NotificationService,
};

/// Outcome of one fine sweep pass
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct FineSweepReport {
    /// Overdue borrowings examined
    pub swept: u32,
    pub fines_created: u32,
    pub fines_updated: u32,
    /// Due-soon reminder intents emitted
    pub reminders: u32,
    /// Borrowings skipped because of a per-item failure
    pub errors: u32,
}

#[derive(Clone)]
pub struct FineService {
    repository: Repository,
    config: LendingConfig,
    notifications: NotificationService,
}

impl FineService {
    pub fn new(
        repository: Repository,
        config: LendingConfig,
        notifications: NotificationService,
    ) -> Self {
        Self {
            repository,
            config,
            notifications,
        }
    }

    /// Run one sweep pass over all overdue borrowings, then emit due-soon
    /// reminders. One bad record never aborts the batch.
    pub async fn run_sweep(&self) -> AppResult<FineSweepReport> {
        let now = Utc::now();
        let mut report = FineSweepReport::default();

        let overdue = self.repository.borrowings.open_overdue(now).await?;
        for (borrowing, book_title) in overdue {
            report.swept += 1;
            match self.sweep_one(&borrowing, &book_title).await {
                Ok(created) => {
                    if created {
                        report.fines_created += 1;
                    } else {
                        report.fines_updated += 1;
                    }
                }
                Err(e) => {
                    report.errors += 1;
                    tracing::error!(borrowing_id = borrowing.id, "fine sweep item failed: {}", e);
                }
            }
        }

        let horizon = now + Duration::days(self.config.due_soon_days);
        let due_soon = self.repository.borrowings.open_due_soon(now, horizon).await?;
        for (borrowing, book_title) in due_soon {
            self.notifications
                .emit(NotificationIntent::new(
                    borrowing.member_id,
                    NotificationPayload::BorrowingDue {
                        borrowing_id: borrowing.id,
                        book_id: borrowing.book_id,
                        book_title,
                        due_date: borrowing.due_date,
                        days_remaining: borrowing.days_remaining_at(now),
                    },
                ))
                .await;
            report.reminders += 1;
        }

        tracing::info!(
            swept = report.swept,
            created = report.fines_created,
            updated = report.fines_updated,
            reminders = report.reminders,
            errors = report.errors,
            "fine sweep completed"
        );

        Ok(report)
    }

    /// Accrue (or open) the single pending fine for one overdue borrowing.
    /// Returns true when a new fine was created.
    async fn sweep_one(&self, borrowing: &Borrowing, book_title: &str) -> AppResult<bool> {
        let now = Utc::now();
        let days_overdue = borrowing.days_overdue_at(now);
        if days_overdue <= 0 {
            return Ok(false);
        }

        let amount = fine_amount(days_overdue, self.config.fine_rate);

        let existing = self
            .repository
            .fines
            .find_pending_by_borrowing(borrowing.id)
            .await?;

        let created = match existing {
            Some(fine) => {
                self.repository
                    .fines
                    .update_accrual(fine.id, amount, days_overdue as i32)
                    .await?;
                false
            }
            None => {
                let fine = self
                    .repository
                    .fines
                    .create(borrowing.member_id, borrowing.id, amount, days_overdue as i32, now)
                    .await?;

                self.notifications
                    .emit(NotificationIntent::new(
                        borrowing.member_id,
                        NotificationPayload::FineIssued {
                            fine_id: fine.id,
                            borrowing_id: borrowing.id,
                            book_id: borrowing.book_id,
                            book_title: book_title.to_string(),
                            amount,
                            days_overdue,
                        },
                    ))
                    .await;
                true
            }
        };

        // the overdue nag goes out on every pass, fine or no fine
        self.notifications
            .emit(NotificationIntent::new(
                borrowing.member_id,
                NotificationPayload::BorrowingOverdue {
                    borrowing_id: borrowing.id,
                    book_id: borrowing.book_id,
                    book_title: book_title.to_string(),
                    due_date: borrowing.due_date,
                    days_overdue,
                },
            ))
            .await;

        Ok(created)
    }

    /// Waive a pending fine
    pub async fn waive(&self, fine_id: i32, waived_by: i32, notes: Option<String>) -> AppResult<Fine> {
        self.repository.fines.get_by_id(fine_id).await?;

        let waived = self
            .repository
            .fines
            .waive(fine_id, waived_by, notes, Utc::now())
            .await?;
        if !waived {
            return Err(AppError::FineNotPending);
        }

        tracing::info!(fine_id, waived_by, "fine waived");
        self.repository.fines.get_by_id(fine_id).await
    }

    /// Settle a fine from the payment collaborator's "fine paid" fact
    pub async fn mark_paid(&self, fine_id: i32) -> AppResult<Fine> {
        self.repository.fines.get_by_id(fine_id).await?;

        let paid = self.repository.fines.mark_paid(fine_id, Utc::now()).await?;
        if !paid {
            return Err(AppError::FineNotPending);
        }

        tracing::info!(fine_id, "fine marked paid");
        self.repository.fines.get_by_id(fine_id).await
    }

    /// Get a member's fines
    pub async fn get_member_fines(&self, member_id: i32) -> AppResult<Vec<Fine>> {
        self.repository.members.get_by_id(member_id).await?;
        self.repository.fines.get_member_fines(member_id).await
    }
}

/// Flat per-day fine. The configured cap is deliberately not applied here;
/// it exists for the billing collaborator's display layer.
pub fn fine_amount(days_overdue: i64, rate: Decimal) -> Decimal {
    Decimal::from(days_overdue) * rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fine_amount_is_linear_in_days() {
        let rate = Decimal::new(50, 2); // 0.50
        assert_eq!(fine_amount(1, rate), Decimal::new(50, 2));
        assert_eq!(fine_amount(3, rate), Decimal::new(150, 2));
        assert_eq!(fine_amount(4, rate), Decimal::new(200, 2));
    }

    #[test]
    fn test_fine_amount_zero_days() {
        assert_eq!(fine_amount(0, Decimal::new(50, 2)), Decimal::ZERO);
    }
}

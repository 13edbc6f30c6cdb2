//! Borrowing lifecycle service: borrow, renew, return

use chrono::{Duration, Utc};

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        borrowing::BorrowingDetails,
        copy::CopyStatus,
        notification::{NotificationIntent, NotificationPayload},
    },
    repository::Repository,
    services::{notifications::NotificationService, policy},
};

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    config: LendingConfig,
    notifications: NotificationService,
}

impl LendingService {
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

    /// Borrow one available copy of a book for a member
    pub async fn borrow(&self, member_id: i32, book_id: i32) -> AppResult<BorrowingDetails> {
        let member = self.repository.members.get_by_id(member_id).await?;
        let book = self.repository.books.get_by_id(book_id).await?;

        let tier = policy::resolve_for(&member, &self.config);

        let current = self.repository.borrowings.count_open_by_member(member_id).await?;
        if current >= tier.max_concurrent_loans {
            return Err(AppError::BorrowLimitReached {
                current,
                limit: tier.max_concurrent_loans,
            });
        }

        let copy = self
            .repository
            .books
            .find_available_copy(book_id)
            .await?
            .ok_or(AppError::NoCopyAvailable)?;

        if self.repository.borrowings.has_open_loan(member_id, book_id).await? {
            return Err(AppError::DuplicateLoan);
        }

        let now = Utc::now();
        let due_date = now + Duration::days(tier.loan_days);

        let mut tx = self.repository.pool.begin().await?;

        // Status-guarded claim: losing the race to another request leaves
        // the copy untouched and fails this borrow instead of over-lending.
        let claimed = self
            .repository
            .books
            .transition_copy(&mut tx, copy.id, CopyStatus::Available, CopyStatus::Borrowed)
            .await?;
        if !claimed {
            tx.rollback().await?;
            return Err(AppError::NoCopyAvailable);
        }

        let borrowing = self
            .repository
            .borrowings
            .insert(&mut tx, member_id, book_id, copy.id, now, due_date)
            .await?;

        tx.commit().await?;

        tracing::info!(member_id, book_id, copy_id = copy.id, borrowing_id = borrowing.id, "book borrowed");

        self.notifications
            .emit(NotificationIntent::new(
                member_id,
                NotificationPayload::BookBorrowed {
                    borrowing_id: borrowing.id,
                    book_id,
                    book_title: book.title.clone(),
                    due_date,
                },
            ))
            .await;

        Ok(BorrowingDetails::new(borrowing, book.title, now))
    }

    /// Renew a loan, extending the existing due date by the member's
    /// current tier loan length
    pub async fn renew(&self, borrowing_id: i32) -> AppResult<BorrowingDetails> {
        let (borrowing, title) = self.repository.borrowings.get_with_title(borrowing_id).await?;

        if borrowing.returned_date.is_some() {
            return Err(AppError::AlreadyReturned);
        }

        if borrowing.renewal_count >= self.config.max_renewals {
            return Err(AppError::RenewalLimitReached {
                limit: self.config.max_renewals,
            });
        }

        let now = Utc::now();
        if borrowing.due_date < now {
            return Err(AppError::CannotRenewOverdue);
        }

        // the extension length follows the member's tier as of now, not at
        // borrow time
        let member = self.repository.members.get_by_id(borrowing.member_id).await?;
        let tier = policy::resolve_for(&member, &self.config);

        let new_due_date = borrowing.due_date + Duration::days(tier.loan_days);
        self.repository
            .borrowings
            .renew(borrowing_id, new_due_date, now)
            .await?;

        tracing::info!(borrowing_id, renewal = borrowing.renewal_count + 1, "loan renewed");

        let (renewed, _) = self.repository.borrowings.get_with_title(borrowing_id).await?;
        Ok(BorrowingDetails::new(renewed, title, now))
    }

    /// Return a loan, freeing its copy.
    ///
    /// Queue promotion is a separate, explicit step: returning makes the
    /// copy available, and a librarian (or the caller) then marks the next
    /// reservation ready.
    pub async fn return_loan(
        &self,
        borrowing_id: i32,
        returned_by: Option<i32>,
    ) -> AppResult<BorrowingDetails> {
        let (borrowing, title) = self.repository.borrowings.get_with_title(borrowing_id).await?;

        if borrowing.returned_date.is_some() {
            return Err(AppError::AlreadyReturned);
        }

        let now = Utc::now();
        let mut tx = self.repository.pool.begin().await?;

        let closed = self
            .repository
            .borrowings
            .mark_returned(&mut tx, borrowing_id, now, returned_by)
            .await?;
        if !closed {
            tx.rollback().await?;
            return Err(AppError::AlreadyReturned);
        }

        // The copy may have been marked lost while on loan; in that case
        // the librarian's status wins and the copy stays out of circulation.
        let freed = self
            .repository
            .books
            .transition_copy(
                &mut tx,
                borrowing.book_copy_id,
                CopyStatus::Borrowed,
                CopyStatus::Available,
            )
            .await?;
        if !freed {
            tracing::warn!(
                copy_id = borrowing.book_copy_id,
                borrowing_id,
                "returned copy was not in borrowed state"
            );
        }

        tx.commit().await?;

        tracing::info!(borrowing_id, copy_id = borrowing.book_copy_id, "book returned");

        let (returned, _) = self.repository.borrowings.get_with_title(borrowing_id).await?;
        Ok(BorrowingDetails::new(returned, title, now))
    }

    /// Owner of a borrowing, for authorization checks
    pub async fn get_borrowing_owner(&self, borrowing_id: i32) -> AppResult<i32> {
        Ok(self.repository.borrowings.get_by_id(borrowing_id).await?.member_id)
    }

    /// Get a member's borrowings
    pub async fn get_member_borrowings(
        &self,
        member_id: i32,
        open_only: bool,
    ) -> AppResult<Vec<BorrowingDetails>> {
        self.repository.members.get_by_id(member_id).await?;
        self.repository
            .borrowings
            .get_member_borrowings(member_id, open_only)
            .await
    }
}

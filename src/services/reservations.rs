//! Reservation queue management service
//!
//! Holds move `pending → ready → completed`, with `cancelled`/`expired`
//! reachable from any non-terminal state. Queue positions are recomputed in
//! full after every mutation of a book's queue.

use chrono::{Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        borrowing::BorrowingDetails,
        copy::CopyStatus,
        notification::{NotificationIntent, NotificationPayload},
        reservation::{Reservation, ReservationDetails, ReservationStatus},
    },
    repository::Repository,
    services::{notifications::NotificationService, policy},
};

/// Outcome of one expiry sweep pass
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ExpirySweepReport {
    /// Reservations examined
    pub swept: u32,
    pub expired: u32,
    /// Held copies released back to circulation
    pub copies_released: u32,
    pub errors: u32,
}

#[derive(Clone)]
pub struct ReservationService {
    repository: Repository,
    config: LendingConfig,
    notifications: NotificationService,
}

impl ReservationService {
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

    /// Place a hold on a book with no available copies
    pub async fn request(&self, member_id: i32, book_id: i32) -> AppResult<Reservation> {
        self.repository.members.get_by_id(member_id).await?;
        self.repository.books.get_by_id(book_id).await?;

        if self.repository.reservations.has_unresolved(member_id, book_id).await? {
            return Err(AppError::AlreadyReserved);
        }

        if self.repository.borrowings.has_open_loan(member_id, book_id).await? {
            return Err(AppError::AlreadyBorrowed);
        }

        // reserving a book that can be borrowed right now is a caller error
        if self.repository.books.count_available(book_id).await? > 0 {
            return Err(AppError::BookCurrentlyAvailable);
        }

        let now = Utc::now();
        let expiry = now + Duration::days(self.config.reservation_expiry_days);
        let position = self.repository.reservations.count_unresolved(book_id).await? + 1;

        let reservation = self
            .repository
            .reservations
            .insert(member_id, book_id, now, expiry, position as i32)
            .await?;

        self.repository.reservations.update_queue_positions(book_id).await?;

        tracing::info!(member_id, book_id, reservation_id = reservation.id, position, "reservation queued");

        self.repository.reservations.get_by_id(reservation.id).await
    }

    /// Assign an available copy to the reservation and open its pickup
    /// window. Run after a return has freed a copy; this is the explicit
    /// promotion step, never triggered implicitly.
    pub async fn mark_ready(
        &self,
        reservation_id: i32,
        book_copy_id: Option<i32>,
    ) -> AppResult<Reservation> {
        let reservation = self.repository.reservations.get_by_id(reservation_id).await?;

        if reservation.status != ReservationStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Reservation is {}; only pending reservations can be marked ready",
                reservation.status
            )));
        }

        let copy = match book_copy_id {
            Some(id) => {
                let copy = self.repository.books.get_copy(id).await?;
                if copy.book_id != reservation.book_id || copy.status != CopyStatus::Available {
                    return Err(AppError::NoAvailableCopy);
                }
                copy
            }
            None => self
                .repository
                .books
                .find_available_copy(reservation.book_id)
                .await?
                .ok_or(AppError::NoAvailableCopy)?,
        };

        let now = Utc::now();
        let pickup_expiry = now + Duration::days(self.config.pickup_window_days);

        let mut tx = self.repository.pool.begin().await?;

        let held = self
            .repository
            .books
            .transition_copy(&mut tx, copy.id, CopyStatus::Available, CopyStatus::Reserved)
            .await?;
        if !held {
            tx.rollback().await?;
            return Err(AppError::NoAvailableCopy);
        }

        let marked = self
            .repository
            .reservations
            .mark_ready(&mut tx, reservation_id, copy.id, now, pickup_expiry)
            .await?;
        if !marked {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Reservation was resolved by another request".to_string(),
            ));
        }

        tx.commit().await?;

        tracing::info!(reservation_id, copy_id = copy.id, "reservation ready for pickup");

        let book = self.repository.books.get_by_id(reservation.book_id).await?;
        self.notifications
            .emit(NotificationIntent::new(
                reservation.member_id,
                NotificationPayload::ReservationReady {
                    reservation_id,
                    book_id: reservation.book_id,
                    book_title: book.title,
                    pickup_expiry_date: pickup_expiry,
                },
            ))
            .await;

        self.repository.reservations.get_by_id(reservation_id).await
    }

    /// Convert a ready hold into a borrowing. The member's concurrent-loan
    /// cap is re-checked against their current tier, which may have changed
    /// since the reservation was requested.
    pub async fn complete(&self, reservation_id: i32) -> AppResult<BorrowingDetails> {
        let reservation = self.repository.reservations.get_by_id(reservation_id).await?;

        if reservation.status != ReservationStatus::Ready {
            return Err(AppError::Conflict(format!(
                "Reservation is {}; only ready reservations can be completed",
                reservation.status
            )));
        }

        let copy_id = reservation.book_copy_id.ok_or_else(|| {
            AppError::Internal(format!("Ready reservation {} has no assigned copy", reservation_id))
        })?;

        let member = self.repository.members.get_by_id(reservation.member_id).await?;
        let tier = policy::resolve_for(&member, &self.config);

        let current = self
            .repository
            .borrowings
            .count_open_by_member(reservation.member_id)
            .await?;
        if current >= tier.max_concurrent_loans {
            return Err(AppError::BorrowLimitReached {
                current,
                limit: tier.max_concurrent_loans,
            });
        }

        let now = Utc::now();
        let due_date = now + Duration::days(tier.loan_days);

        let mut tx = self.repository.pool.begin().await?;

        let claimed = self
            .repository
            .books
            .transition_copy(&mut tx, copy_id, CopyStatus::Reserved, CopyStatus::Borrowed)
            .await?;
        if !claimed {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "The held copy is no longer reserved".to_string(),
            ));
        }

        let borrowing = self
            .repository
            .borrowings
            .insert(&mut tx, reservation.member_id, reservation.book_id, copy_id, now, due_date)
            .await?;

        let completed = self
            .repository
            .reservations
            .complete(&mut tx, reservation_id, now)
            .await?;
        if !completed {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Reservation was resolved by another request".to_string(),
            ));
        }

        tx.commit().await?;

        // the completed hold leaves the queue; everyone behind moves up
        self.repository
            .reservations
            .update_queue_positions(reservation.book_id)
            .await?;

        tracing::info!(reservation_id, borrowing_id = borrowing.id, "reservation completed");

        let book = self.repository.books.get_by_id(reservation.book_id).await?;
        self.notifications
            .emit(NotificationIntent::new(
                reservation.member_id,
                NotificationPayload::BookBorrowed {
                    borrowing_id: borrowing.id,
                    book_id: reservation.book_id,
                    book_title: book.title.clone(),
                    due_date,
                },
            ))
            .await;

        Ok(BorrowingDetails::new(borrowing, book.title, now))
    }

    /// Cancel an unresolved reservation
    pub async fn cancel(
        &self,
        reservation_id: i32,
        cancelled_by: Option<i32>,
    ) -> AppResult<Reservation> {
        let reservation = self.repository.reservations.get_by_id(reservation_id).await?;

        match reservation.status {
            ReservationStatus::Completed => return Err(AppError::CannotCancelCompleted),
            ReservationStatus::Cancelled | ReservationStatus::Expired => {
                return Err(AppError::Conflict(format!(
                    "Reservation is already {}",
                    reservation.status
                )));
            }
            ReservationStatus::Pending | ReservationStatus::Ready => {}
        }

        let now = Utc::now();
        let mut tx = self.repository.pool.begin().await?;

        let cancelled = self
            .repository
            .reservations
            .cancel(&mut tx, reservation_id, now, cancelled_by)
            .await?;
        if !cancelled {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Reservation was resolved by another request".to_string(),
            ));
        }

        self.release_held_copy(&mut tx, &reservation).await?;

        tx.commit().await?;

        self.repository
            .reservations
            .update_queue_positions(reservation.book_id)
            .await?;

        tracing::info!(reservation_id, "reservation cancelled");

        self.repository.reservations.get_by_id(reservation_id).await
    }

    /// Expire every unresolved reservation past its applicable deadline.
    /// Held copies go back to circulation; promotion of the next hold in
    /// line stays an explicit follow-up step.
    pub async fn run_expiry_sweep(&self) -> AppResult<ExpirySweepReport> {
        let now = Utc::now();
        let mut report = ExpirySweepReport::default();

        let candidates = self.repository.reservations.expiry_candidates(now).await?;
        for reservation in candidates {
            report.swept += 1;
            match self.expire_one(&reservation).await {
                Ok(released) => {
                    report.expired += 1;
                    if released {
                        report.copies_released += 1;
                    }
                }
                Err(e) => {
                    report.errors += 1;
                    tracing::error!(
                        reservation_id = reservation.id,
                        "expiry sweep item failed: {}",
                        e
                    );
                }
            }
        }

        tracing::info!(
            swept = report.swept,
            expired = report.expired,
            released = report.copies_released,
            errors = report.errors,
            "reservation expiry sweep completed"
        );

        Ok(report)
    }

    async fn expire_one(&self, reservation: &Reservation) -> AppResult<bool> {
        let mut tx = self.repository.pool.begin().await?;

        let expired = self.repository.reservations.expire(&mut tx, reservation.id).await?;
        if !expired {
            // resolved between the candidate query and now; nothing to do
            tx.rollback().await?;
            return Ok(false);
        }

        let released = self.release_held_copy(&mut tx, reservation).await?;

        tx.commit().await?;

        self.repository
            .reservations
            .update_queue_positions(reservation.book_id)
            .await?;

        let book = self.repository.books.get_by_id(reservation.book_id).await?;
        self.notifications
            .emit(NotificationIntent::new(
                reservation.member_id,
                NotificationPayload::ReservationExpired {
                    reservation_id: reservation.id,
                    book_id: reservation.book_id,
                    book_title: book.title,
                },
            ))
            .await;

        Ok(released)
    }

    /// Release the copy a ready hold was keeping, if any
    async fn release_held_copy(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        reservation: &Reservation,
    ) -> AppResult<bool> {
        if reservation.status != ReservationStatus::Ready {
            return Ok(false);
        }
        let Some(copy_id) = reservation.book_copy_id else {
            return Ok(false);
        };

        let released = self
            .repository
            .books
            .transition_copy(tx, copy_id, CopyStatus::Reserved, CopyStatus::Available)
            .await?;
        if !released {
            tracing::warn!(copy_id, reservation_id = reservation.id, "held copy was not in reserved state");
        }
        Ok(released)
    }

    /// Owner of a reservation, for authorization checks
    pub async fn get_reservation_owner(&self, reservation_id: i32) -> AppResult<i32> {
        Ok(self.repository.reservations.get_by_id(reservation_id).await?.member_id)
    }

    /// The unresolved queue for a book
    pub async fn get_book_queue(&self, book_id: i32) -> AppResult<Vec<ReservationDetails>> {
        self.repository.books.get_by_id(book_id).await?;
        self.repository.reservations.get_book_queue(book_id).await
    }

    /// A member's reservations
    pub async fn get_member_reservations(&self, member_id: i32) -> AppResult<Vec<ReservationDetails>> {
        self.repository.members.get_by_id(member_id).await?;
        self.repository
            .reservations
            .get_member_reservations(member_id)
            .await
    }
}

//! Reservations repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::reservation::{Reservation, ReservationDetails},
};

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    /// Does the member already have an unresolved hold on this book?
    pub async fn has_unresolved(&self, member_id: i32, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reservations
                WHERE member_id = $1 AND book_id = $2 AND status IN ('pending', 'ready')
            )
            "#,
        )
        .bind(member_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Count unresolved holds for a book
    pub async fn count_unresolved(&self, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE book_id = $1 AND status IN ('pending', 'ready')",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Create a pending reservation at the tail of the queue
    pub async fn insert(
        &self,
        member_id: i32,
        book_id: i32,
        reserved_date: DateTime<Utc>,
        expiry_date: DateTime<Utc>,
        queue_position: i32,
    ) -> AppResult<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (member_id, book_id, reserved_date, expiry_date, status, queue_position)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING *
            "#,
        )
        .bind(member_id)
        .bind(book_id)
        .bind(reserved_date)
        .bind(expiry_date)
        .bind(queue_position)
        .fetch_one(&self.pool)
        .await?;

        Ok(reservation)
    }

    /// Recompute queue positions for a book from scratch.
    ///
    /// Full re-sort of all unresolved holds by request time rather than an
    /// incremental decrement; position 1 is always the earliest unresolved
    /// request after this runs.
    pub async fn update_queue_positions(&self, book_id: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE reservations r
            SET queue_position = ranked.position
            FROM (
                SELECT id, ROW_NUMBER() OVER (ORDER BY reserved_date, id) AS position
                FROM reservations
                WHERE book_id = $1 AND status IN ('pending', 'ready')
            ) ranked
            WHERE r.id = ranked.id AND r.queue_position <> ranked.position
            "#,
        )
        .bind(book_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Move a pending reservation to ready with its assigned copy.
    /// Returns false if the reservation was no longer pending.
    pub async fn mark_ready(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
        book_copy_id: i32,
        ready_date: DateTime<Utc>,
        pickup_expiry_date: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET status = 'ready', book_copy_id = $1, ready_date = $2, pickup_expiry_date = $3
            WHERE id = $4 AND status = 'pending'
            "#,
        )
        .bind(book_copy_id)
        .bind(ready_date)
        .bind(pickup_expiry_date)
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Close a ready reservation as completed.
    /// Returns false if the reservation was no longer ready.
    pub async fn complete(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
        completed_date: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations SET status = 'completed', completed_date = $1
            WHERE id = $2 AND status = 'ready'
            "#,
        )
        .bind(completed_date)
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Cancel a non-terminal reservation.
    /// Returns false if it had already reached a terminal state.
    pub async fn cancel(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
        cancelled_date: DateTime<Utc>,
        cancelled_by: Option<i32>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations SET status = 'cancelled', cancelled_date = $1, cancelled_by = $2
            WHERE id = $3 AND status IN ('pending', 'ready')
            "#,
        )
        .bind(cancelled_date)
        .bind(cancelled_by)
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Expire a reservation. Returns false if it was resolved in the meantime.
    pub async fn expire(&self, tx: &mut Transaction<'_, Postgres>, id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE reservations SET status = 'expired' WHERE id = $1 AND status IN ('pending', 'ready')",
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Unresolved reservations past their applicable expiry (sweep input).
    /// Pending holds age out on `expiry_date`, ready holds on the pickup window.
    pub async fn expiry_candidates(&self, now: DateTime<Utc>) -> AppResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT * FROM reservations
            WHERE (status = 'pending' AND expiry_date < $1)
               OR (status = 'ready' AND pickup_expiry_date < $1)
            ORDER BY book_id, reserved_date
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    /// The unresolved queue for a book, in position order
    pub async fn get_book_queue(&self, book_id: i32) -> AppResult<Vec<ReservationDetails>> {
        let queue = sqlx::query_as::<_, ReservationDetails>(
            r#"
            SELECT r.id, r.member_id, r.book_id, k.title AS book_title,
                   r.reserved_date, r.expiry_date, r.pickup_expiry_date,
                   r.status, r.queue_position
            FROM reservations r
            JOIN books k ON k.id = r.book_id
            WHERE r.book_id = $1 AND r.status IN ('pending', 'ready')
            ORDER BY r.queue_position
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(queue)
    }

    /// A member's reservations, unresolved first
    pub async fn get_member_reservations(&self, member_id: i32) -> AppResult<Vec<ReservationDetails>> {
        let reservations = sqlx::query_as::<_, ReservationDetails>(
            r#"
            SELECT r.id, r.member_id, r.book_id, k.title AS book_title,
                   r.reserved_date, r.expiry_date, r.pickup_expiry_date,
                   r.status, r.queue_position
            FROM reservations r
            JOIN books k ON k.id = r.book_id
            WHERE r.member_id = $1
            ORDER BY r.status IN ('pending', 'ready') DESC, r.reserved_date DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }
}

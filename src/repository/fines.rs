//! Fines repository for database operations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::fine::Fine,
};

#[derive(Clone)]
pub struct FinesRepository {
    pool: Pool<Postgres>,
}

impl FinesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get fine by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Fine> {
        sqlx::query_as::<_, Fine>("SELECT * FROM fines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Fine with id {} not found", id)))
    }

    /// The single pending fine for a borrowing, if any
    pub async fn find_pending_by_borrowing(&self, borrowing_id: i32) -> AppResult<Option<Fine>> {
        let fine = sqlx::query_as::<_, Fine>(
            "SELECT * FROM fines WHERE borrowing_id = $1 AND status = 'pending'",
        )
        .bind(borrowing_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(fine)
    }

    /// Create a pending fine
    pub async fn create(
        &self,
        member_id: i32,
        borrowing_id: i32,
        amount: Decimal,
        days_overdue: i32,
        issued_date: DateTime<Utc>,
    ) -> AppResult<Fine> {
        let fine = sqlx::query_as::<_, Fine>(
            r#"
            INSERT INTO fines (member_id, borrowing_id, amount, days_overdue, status, issued_date)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING *
            "#,
        )
        .bind(member_id)
        .bind(borrowing_id)
        .bind(amount)
        .bind(days_overdue)
        .bind(issued_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(fine)
    }

    /// Update a pending fine's accrual in place (sweep re-runs hit this path)
    pub async fn update_accrual(
        &self,
        id: i32,
        amount: Decimal,
        days_overdue: i32,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE fines SET amount = $1, days_overdue = $2, updated_at = NOW()
            WHERE id = $3 AND status = 'pending'
            "#,
        )
        .bind(amount)
        .bind(days_overdue)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Waive a pending fine. Returns false if the fine was not pending.
    pub async fn waive(
        &self,
        id: i32,
        waived_by: i32,
        notes: Option<String>,
        waived_date: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE fines
            SET status = 'waived', waived_date = $1, waived_by = $2, notes = $3, updated_at = NOW()
            WHERE id = $4 AND status = 'pending'
            "#,
        )
        .bind(waived_date)
        .bind(waived_by)
        .bind(notes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Settle a pending fine from the payment collaborator's callback.
    /// Returns false if the fine was not pending.
    pub async fn mark_paid(&self, id: i32, paid_date: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE fines SET status = 'paid', paid_date = $1, updated_at = NOW()
            WHERE id = $2 AND status = 'pending'
            "#,
        )
        .bind(paid_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// A member's fines, pending first
    pub async fn get_member_fines(&self, member_id: i32) -> AppResult<Vec<Fine>> {
        let fines = sqlx::query_as::<_, Fine>(
            r#"
            SELECT * FROM fines
            WHERE member_id = $1
            ORDER BY status = 'pending' DESC, issued_date DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(fines)
    }
}

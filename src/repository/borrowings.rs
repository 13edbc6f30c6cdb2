//! Borrowings repository for database operations
//!
//! A borrowing is open while `returned_date IS NULL`; "overdue" is always a
//! predicate on `due_date`, never a stored flag.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::borrowing::{Borrowing, BorrowingDetails},
};

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrowing by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Get borrowing with its book title
    pub async fn get_with_title(&self, id: i32) -> AppResult<(Borrowing, String)> {
        let row = sqlx::query(
            r#"
            SELECT b.*, k.title AS book_title
            FROM borrowings b
            JOIN books k ON k.id = b.book_id
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))?;

        let title: String = row.get("book_title");
        Ok((borrowing_from_row(&row)?, title))
    }

    /// Count a member's open loans
    pub async fn count_open_by_member(&self, member_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE member_id = $1 AND returned_date IS NULL",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Does the member already hold an open loan of this book?
    pub async fn has_open_loan(&self, member_id: i32, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrowings
                WHERE member_id = $1 AND book_id = $2 AND returned_date IS NULL
            )
            "#,
        )
        .bind(member_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Get borrowings for a member, open loans first
    pub async fn get_member_borrowings(
        &self,
        member_id: i32,
        open_only: bool,
    ) -> AppResult<Vec<BorrowingDetails>> {
        let query = if open_only {
            r#"
            SELECT b.*, k.title AS book_title
            FROM borrowings b
            JOIN books k ON k.id = b.book_id
            WHERE b.member_id = $1 AND b.returned_date IS NULL
            ORDER BY b.due_date
            "#
        } else {
            r#"
            SELECT b.*, k.title AS book_title
            FROM borrowings b
            JOIN books k ON k.id = b.book_id
            WHERE b.member_id = $1
            ORDER BY b.returned_date IS NOT NULL, b.due_date
            "#
        };

        let rows = sqlx::query(query).bind(member_id).fetch_all(&self.pool).await?;

        let now = Utc::now();
        let mut result = Vec::new();
        for row in rows {
            let title: String = row.get("book_title");
            result.push(BorrowingDetails::new(borrowing_from_row(&row)?, title, now));
        }

        Ok(result)
    }

    /// Create a borrowing for an already-claimed copy
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        member_id: i32,
        book_id: i32,
        book_copy_id: i32,
        borrowed_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> AppResult<Borrowing> {
        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (member_id, book_id, book_copy_id, borrowed_date, due_date, renewal_count)
            VALUES ($1, $2, $3, $4, $5, 0)
            RETURNING *
            "#,
        )
        .bind(member_id)
        .bind(book_id)
        .bind(book_copy_id)
        .bind(borrowed_date)
        .bind(due_date)
        .fetch_one(&mut **tx)
        .await?;

        Ok(borrowing)
    }

    /// Extend the due date and bump the renewal count
    pub async fn renew(
        &self,
        id: i32,
        new_due_date: DateTime<Utc>,
        renewed_date: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE borrowings
            SET due_date = $1, renewed_date = $2, renewal_count = renewal_count + 1
            WHERE id = $3
            "#,
        )
        .bind(new_due_date)
        .bind(renewed_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Close a borrowing. Returns false if it was already returned.
    pub async fn mark_returned(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
        returned_date: DateTime<Utc>,
        returned_by: Option<i32>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE borrowings SET returned_date = $1, returned_by = $2
            WHERE id = $3 AND returned_date IS NULL
            "#,
        )
        .bind(returned_date)
        .bind(returned_by)
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Open borrowings past their due date, with book titles (fine sweep input)
    pub async fn open_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<(Borrowing, String)>> {
        let rows = sqlx::query(
            r#"
            SELECT b.*, k.title AS book_title
            FROM borrowings b
            JOIN books k ON k.id = b.book_id
            WHERE b.returned_date IS NULL AND b.due_date < $1
            ORDER BY b.due_date
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        collect_with_titles(rows)
    }

    /// Open borrowings due within the reminder horizon, with book titles
    pub async fn open_due_soon(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<(Borrowing, String)>> {
        let rows = sqlx::query(
            r#"
            SELECT b.*, k.title AS book_title
            FROM borrowings b
            JOIN books k ON k.id = b.book_id
            WHERE b.returned_date IS NULL AND b.due_date >= $1 AND b.due_date <= $2
            ORDER BY b.due_date
            "#,
        )
        .bind(now)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        collect_with_titles(rows)
    }
}

fn collect_with_titles(rows: Vec<sqlx::postgres::PgRow>) -> AppResult<Vec<(Borrowing, String)>> {
    let mut result = Vec::new();
    for row in rows {
        let title: String = row.get("book_title");
        result.push((borrowing_from_row(&row)?, title));
    }
    Ok(result)
}

fn borrowing_from_row(row: &sqlx::postgres::PgRow) -> AppResult<Borrowing> {
    Ok(Borrowing {
        id: row.get("id"),
        member_id: row.get("member_id"),
        book_id: row.get("book_id"),
        book_copy_id: row.get("book_copy_id"),
        borrowed_date: row.get("borrowed_date"),
        due_date: row.get("due_date"),
        returned_date: row.get("returned_date"),
        renewal_count: row.get("renewal_count"),
        renewed_date: row.get("renewed_date"),
        returned_by: row.get("returned_by"),
    })
}

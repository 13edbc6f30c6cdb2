//! Books and copies repository for database operations

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookSummary, CreateBook},
        copy::{BookCopy, CopyStatus},
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book with stock counts
    pub async fn get_summary(&self, id: i32) -> AppResult<BookSummary> {
        sqlx::query_as::<_, BookSummary>(
            r#"
            SELECT b.id, b.title, b.author, b.isbn, b.category, b.rating, b.is_active,
                   COALESCE((
                       SELECT COUNT(*) FROM book_copies c
                       WHERE c.book_id = b.id AND c.is_active
                         AND c.status IN ('available', 'borrowed', 'reserved')
                   ), 0) AS total_copies,
                   COALESCE((
                       SELECT COUNT(*) FROM book_copies c
                       WHERE c.book_id = b.id AND c.is_active AND c.status = 'available'
                   ), 0) AS available_copies
            FROM books b
            WHERE b.id = $1 AND b.is_active
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List active books with stock counts
    pub async fn list(&self) -> AppResult<Vec<BookSummary>> {
        let books = sqlx::query_as::<_, BookSummary>(
            r#"
            SELECT b.id, b.title, b.author, b.isbn, b.category, b.rating, b.is_active,
                   COALESCE((
                       SELECT COUNT(*) FROM book_copies c
                       WHERE c.book_id = b.id AND c.is_active
                         AND c.status IN ('available', 'borrowed', 'reserved')
                   ), 0) AS total_copies,
                   COALESCE((
                       SELECT COUNT(*) FROM book_copies c
                       WHERE c.book_id = b.id AND c.is_active AND c.status = 'available'
                   ), 0) AS available_copies
            FROM books b
            WHERE b.is_active
            ORDER BY b.title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, category, rating)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(book.rating)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Soft-delete a book
    pub async fn deactivate(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET is_active = false, updated_at = NOW() WHERE id = $1 AND is_active")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    // =========================================================================
    // COPIES
    // =========================================================================

    /// Count countable stock (active copies currently in circulation states)
    pub async fn count_total(&self, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM book_copies
            WHERE book_id = $1 AND is_active
              AND status IN ('available', 'borrowed', 'reserved')
            "#,
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count copies available for direct borrowing
    pub async fn count_available(&self, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_copies WHERE book_id = $1 AND is_active AND status = 'available'",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Get copy by ID
    pub async fn get_copy(&self, id: i32) -> AppResult<BookCopy> {
        sqlx::query_as::<_, BookCopy>("SELECT * FROM book_copies WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Copy with id {} not found", id)))
    }

    /// Get active copies for a book
    pub async fn get_copies(&self, book_id: i32) -> AppResult<Vec<BookCopy>> {
        let copies = sqlx::query_as::<_, BookCopy>(
            "SELECT * FROM book_copies WHERE book_id = $1 AND is_active ORDER BY copy_number",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Find any one available copy of a book
    pub async fn find_available_copy(&self, book_id: i32) -> AppResult<Option<BookCopy>> {
        let copy = sqlx::query_as::<_, BookCopy>(
            r#"
            SELECT * FROM book_copies
            WHERE book_id = $1 AND is_active AND status = 'available'
            ORDER BY copy_number
            LIMIT 1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(copy)
    }

    /// Flip a copy's status, but only if it is still in the expected state.
    /// Returns false when the guard failed (someone else got there first).
    pub async fn transition_copy(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        copy_id: i32,
        from: CopyStatus,
        to: CopyStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE book_copies SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3 AND is_active
            "#,
        )
        .bind(to)
        .bind(copy_id)
        .bind(from)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Set a copy's status unconditionally (librarian lost/maintenance flows)
    pub async fn set_copy_status(&self, copy_id: i32, status: CopyStatus) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE book_copies SET status = $1, updated_at = NOW() WHERE id = $2 AND is_active",
        )
        .bind(status)
        .bind(copy_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Copy with id {} not found", copy_id)));
        }
        Ok(())
    }

    /// Create `count` new available copies, numbering after the current max
    pub async fn add_copies(&self, book_id: i32, count: i64) -> AppResult<Vec<BookCopy>> {
        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(copy_number), 0) + 1 FROM book_copies WHERE book_id = $1",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;

        let mut created = Vec::new();
        for n in 0..count {
            let copy = sqlx::query_as::<_, BookCopy>(
                r#"
                INSERT INTO book_copies (book_id, copy_number, barcode, status)
                VALUES ($1, $2, $3, 'available')
                RETURNING *
                "#,
            )
            .bind(book_id)
            .bind(next + n as i32)
            .bind(format!("BFX-{:06}-{:03}", book_id, next + n as i32))
            .fetch_one(&self.pool)
            .await?;
            created.push(copy);
        }

        Ok(created)
    }

    /// Deactivate the oldest available copies of a book, up to `count`.
    /// Returns how many were actually deactivated.
    pub async fn deactivate_available_copies(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        count: i64,
    ) -> AppResult<i64> {
        let result = sqlx::query(
            r#"
            UPDATE book_copies SET is_active = false, updated_at = NOW()
            WHERE id IN (
                SELECT id FROM book_copies
                WHERE book_id = $1 AND is_active AND status = 'available'
                ORDER BY created_at, id
                LIMIT $2
            )
            "#,
        )
        .bind(book_id)
        .bind(count)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() as i64)
    }
}

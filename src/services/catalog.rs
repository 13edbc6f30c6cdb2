//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookSummary, CreateBook},
        copy::{BookCopy, CopyStatus},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List active books with stock counts
    pub async fn list_books(&self) -> AppResult<Vec<BookSummary>> {
        self.repository.books.list().await
    }

    /// Get a book with stock counts and its copies
    pub async fn get_book(&self, book_id: i32) -> AppResult<(BookSummary, Vec<BookCopy>)> {
        let summary = self.repository.books.get_summary(book_id).await?;
        let copies = self.repository.books.get_copies(book_id).await?;
        Ok((summary, copies))
    }

    /// Create a book, optionally with initial copies
    pub async fn create_book(&self, book: CreateBook) -> AppResult<BookSummary> {
        let created: Book = self.repository.books.create(&book).await?;

        let initial = book.initial_copies.unwrap_or(0);
        if initial > 0 {
            self.repository.books.add_copies(created.id, initial).await?;
        }

        tracing::info!(book_id = created.id, copies = initial, "book created");
        self.repository.books.get_summary(created.id).await
    }

    /// Soft-delete a book
    pub async fn deactivate_book(&self, book_id: i32) -> AppResult<()> {
        self.repository.books.deactivate(book_id).await
    }

    /// Reconcile the physical copy count of a book to `target`.
    ///
    /// Increases create fresh available copies; decreases deactivate the
    /// oldest available copies first. Copies currently lent or held are
    /// never force-removed.
    pub async fn set_stock_level(&self, book_id: i32, target: i64) -> AppResult<BookSummary> {
        if target < 0 {
            return Err(AppError::Validation("Stock level cannot be negative".to_string()));
        }

        self.repository.books.get_by_id(book_id).await?;

        let current = self.repository.books.count_total(book_id).await?;

        if target > current {
            let added = self.repository.books.add_copies(book_id, target - current).await?;
            tracing::info!(book_id, added = added.len(), "stock increased");
        } else if target < current {
            let needed = current - target;
            let removable = self.repository.books.count_available(book_id).await?;
            if removable < needed {
                return Err(AppError::InsufficientRemovableStock { needed, removable });
            }

            let mut tx = self.repository.pool.begin().await?;
            let removed = self
                .repository
                .books
                .deactivate_available_copies(&mut tx, book_id, needed)
                .await?;
            if removed < needed {
                // a concurrent borrow shrank the removable pool under us
                tx.rollback().await?;
                return Err(AppError::InsufficientRemovableStock {
                    needed,
                    removable: removed,
                });
            }
            tx.commit().await?;
            tracing::info!(book_id, removed, "stock reduced");
        }

        self.repository.books.get_summary(book_id).await
    }

    /// Librarian flow: mark a copy lost, under maintenance, or back in
    /// circulation. Copies on loan or held for a reservation are owned by
    /// that record and cannot be re-statused here.
    pub async fn update_copy_status(&self, copy_id: i32, status: CopyStatus) -> AppResult<BookCopy> {
        let copy = self.repository.books.get_copy(copy_id).await?;

        if matches!(copy.status, CopyStatus::Borrowed | CopyStatus::Reserved) {
            return Err(AppError::Conflict(format!(
                "Copy {} is currently {}; resolve the loan or hold first",
                copy_id, copy.status
            )));
        }

        if matches!(status, CopyStatus::Borrowed | CopyStatus::Reserved) {
            return Err(AppError::Validation(
                "Copies become borrowed or reserved through loans and reservations".to_string(),
            ));
        }

        self.repository.books.set_copy_status(copy_id, status).await?;
        self.repository.books.get_copy(copy_id).await
    }
}

//! Repository layer for database operations

pub mod books;
pub mod borrowings;
pub mod fines;
pub mod members;
pub mod notifications;
pub mod reservations;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub members: members::MembersRepository,
    pub borrowings: borrowings::BorrowingsRepository,
    pub reservations: reservations::ReservationsRepository,
    pub fines: fines::FinesRepository,
    pub notifications: notifications::NotificationsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            members: members::MembersRepository::new(pool.clone()),
            borrowings: borrowings::BorrowingsRepository::new(pool.clone()),
            reservations: reservations::ReservationsRepository::new(pool.clone()),
            fines: fines::FinesRepository::new(pool.clone()),
            notifications: notifications::NotificationsRepository::new(pool.clone()),
            pool,
        }
    }
}

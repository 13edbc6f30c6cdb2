//! Data models for Bookflix

pub mod book;
pub mod borrowing;
pub mod copy;
pub mod fine;
pub mod member;
pub mod notification;
pub mod reservation;

// Re-export commonly used types
pub use book::{Book, BookSummary};
pub use borrowing::{Borrowing, BorrowingDetails, BorrowingStatus};
pub use copy::{BookCopy, CopyStatus};
pub use fine::{Fine, FineStatus};
pub use member::{Member, MemberClaims, Role, SubscriptionStatus, SubscriptionType};
pub use notification::{Notification, NotificationIntent, NotificationPayload};
pub use reservation::{Reservation, ReservationDetails, ReservationStatus};

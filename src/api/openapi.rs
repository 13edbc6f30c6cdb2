//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowings, fines, health, members, reservations, sweeps};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookflix API",
        version = "0.9.0",
        description = "Library lending and reservation REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::delete_book,
        books::set_stock_level,
        books::update_copy_status,
        // Borrowings
        borrowings::borrow,
        borrowings::renew,
        borrowings::return_loan,
        // Reservations
        reservations::reserve,
        reservations::mark_ready,
        reservations::complete,
        reservations::cancel,
        reservations::get_book_queue,
        // Members
        members::get_member_borrowings,
        members::get_member_reservations,
        members::get_member_fines,
        members::get_member_notifications,
        // Fines
        fines::waive,
        fines::mark_paid,
        // Sweeps
        sweeps::run_fine_sweep,
        sweeps::run_expiry_sweep,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::CreateBook,
            crate::models::copy::BookCopy,
            crate::models::copy::CopyStatus,
            crate::models::copy::UpdateCopyStatus,
            books::BookResponse,
            books::SetStockLevel,
            // Borrowings
            crate::models::borrowing::Borrowing,
            crate::models::borrowing::BorrowingDetails,
            crate::models::borrowing::BorrowingStatus,
            borrowings::BorrowRequest,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationDetails,
            crate::models::reservation::ReservationStatus,
            reservations::ReserveRequest,
            reservations::MarkReadyRequest,
            // Fines
            crate::models::fine::Fine,
            crate::models::fine::FineStatus,
            crate::models::fine::WaiveFine,
            // Notifications
            crate::models::notification::Notification,
            crate::models::notification::NotificationPayload,
            // Sweeps
            crate::services::fines::FineSweepReport,
            crate::services::reservations::ExpirySweepReport,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog and stock management"),
        (name = "borrowings", description = "Borrowing lifecycle"),
        (name = "reservations", description = "Reservation queue"),
        (name = "members", description = "Member-scoped lookups"),
        (name = "fines", description = "Fine administration"),
        (name = "sweeps", description = "Scheduled batch passes")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

//! Reservation endpoints: request, ready, complete, cancel, queue

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        borrowing::BorrowingDetails,
        reservation::{Reservation, ReservationDetails},
    },
};

use super::AuthenticatedMember;

/// Reservation request
#[derive(Deserialize, ToSchema)]
pub struct ReserveRequest {
    /// Reserving member (staff may reserve on behalf of anyone)
    pub member_id: Option<i32>,
    /// Book to reserve
    pub book_id: i32,
}

/// Mark-ready request
#[derive(Deserialize, ToSchema)]
pub struct MarkReadyRequest {
    /// Specific copy to hold; auto-selected when omitted
    pub book_copy_id: Option<i32>,
}

/// Reserve a book with no available copies
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = ReserveRequest,
    responses(
        (status = 201, description = "Reservation queued", body = Reservation),
        (status = 404, description = "Member or book not found"),
        (status = 409, description = "Already reserved or already borrowed"),
        (status = 422, description = "A copy is currently available")
    )
)]
pub async fn reserve(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Json(request): Json<ReserveRequest>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let member_id = request.member_id.unwrap_or(claims.member_id);
    claims.require_self_or_staff(member_id)?;

    let reservation = state
        .services
        .reservations
        .request(member_id, request.book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Mark a reservation ready for pickup
#[utoipa::path(
    post,
    path = "/reservations/{id}/ready",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    request_body = MarkReadyRequest,
    responses(
        (status = 200, description = "Reservation ready", body = Reservation),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Not pending, or no available copy")
    )
)]
pub async fn mark_ready(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(reservation_id): Path<i32>,
    request: Option<Json<MarkReadyRequest>>,
) -> AppResult<Json<Reservation>> {
    claims.require_staff()?;

    let book_copy_id = request.map(|Json(r)| r.book_copy_id).unwrap_or(None);
    let reservation = state
        .services
        .reservations
        .mark_ready(reservation_id, book_copy_id)
        .await?;
    Ok(Json(reservation))
}

/// Complete a ready reservation, creating the borrowing
#[utoipa::path(
    post,
    path = "/reservations/{id}/complete",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 201, description = "Borrowing created", body = BorrowingDetails),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Not ready"),
        (status = 422, description = "Borrow limit reached")
    )
)]
pub async fn complete(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(reservation_id): Path<i32>,
) -> AppResult<(StatusCode, Json<BorrowingDetails>)> {
    claims.require_staff()?;

    let borrowing = state.services.reservations.complete(reservation_id).await?;
    Ok((StatusCode::CREATED, Json(borrowing)))
}

/// Cancel a reservation
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation cancelled", body = Reservation),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Already completed or resolved")
    )
)]
pub async fn cancel(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(reservation_id): Path<i32>,
) -> AppResult<Json<Reservation>> {
    let owner = state
        .services
        .reservations
        .get_reservation_owner(reservation_id)
        .await?;
    claims.require_self_or_staff(owner)?;

    let cancelled_by = (claims.member_id != owner).then_some(claims.member_id);
    let reservation = state
        .services
        .reservations
        .cancel(reservation_id, cancelled_by)
        .await?;
    Ok(Json(reservation))
}

/// The unresolved reservation queue for a book
#[utoipa::path(
    get,
    path = "/books/{id}/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Queue in position order", body = Vec<ReservationDetails>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_queue(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(book_id): Path<i32>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    claims.require_staff()?;

    let queue = state.services.reservations.get_book_queue(book_id).await?;
    Ok(Json(queue))
}

//! Member-scoped lookup endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::{
        borrowing::BorrowingDetails, fine::Fine, notification::Notification,
        reservation::ReservationDetails,
    },
};

use super::AuthenticatedMember;

/// Borrowing listing filters
#[derive(Deserialize, IntoParams)]
pub struct BorrowingsQuery {
    /// Only open loans (default true)
    pub open_only: Option<bool>,
}

/// A member's borrowings
#[utoipa::path(
    get,
    path = "/members/{id}/borrowings",
    tag = "members",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID"),
        BorrowingsQuery
    ),
    responses(
        (status = 200, description = "Borrowings with derived status", body = Vec<BorrowingDetails>),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member_borrowings(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(member_id): Path<i32>,
    Query(query): Query<BorrowingsQuery>,
) -> AppResult<Json<Vec<BorrowingDetails>>> {
    claims.require_self_or_staff(member_id)?;

    let borrowings = state
        .services
        .lending
        .get_member_borrowings(member_id, query.open_only.unwrap_or(true))
        .await?;
    Ok(Json(borrowings))
}

/// A member's reservations
#[utoipa::path(
    get,
    path = "/members/{id}/reservations",
    tag = "members",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Reservations, unresolved first", body = Vec<ReservationDetails>),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(member_id): Path<i32>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    claims.require_self_or_staff(member_id)?;

    let reservations = state
        .services
        .reservations
        .get_member_reservations(member_id)
        .await?;
    Ok(Json(reservations))
}

/// A member's fines
#[utoipa::path(
    get,
    path = "/members/{id}/fines",
    tag = "members",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Fines, pending first", body = Vec<Fine>),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member_fines(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(member_id): Path<i32>,
) -> AppResult<Json<Vec<Fine>>> {
    claims.require_self_or_staff(member_id)?;

    let fines = state.services.fines.get_member_fines(member_id).await?;
    Ok(Json(fines))
}

/// A member's notification intents
#[utoipa::path(
    get,
    path = "/members/{id}/notifications",
    tag = "members",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Notifications, newest first", body = Vec<Notification>),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member_notifications(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(member_id): Path<i32>,
) -> AppResult<Json<Vec<Notification>>> {
    claims.require_self_or_staff(member_id)?;

    let notifications = state
        .services
        .notifications
        .get_member_notifications(member_id)
        .await?;
    Ok(Json(notifications))
}

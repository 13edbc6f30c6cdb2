//! Borrowing endpoints: borrow, renew, return

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::borrowing::BorrowingDetails};

use super::AuthenticatedMember;

/// Borrow request
#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    /// Borrowing member (staff may borrow on behalf of anyone)
    pub member_id: Option<i32>,
    /// Book to borrow
    pub book_id: i32,
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowingDetails),
        (status = 404, description = "Member or book not found"),
        (status = 409, description = "Duplicate loan or no copy available"),
        (status = 422, description = "Borrow limit reached")
    )
)]
pub async fn borrow(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowingDetails>)> {
    let member_id = request.member_id.unwrap_or(claims.member_id);
    claims.require_self_or_staff(member_id)?;

    let borrowing = state.services.lending.borrow(member_id, request.book_id).await?;
    Ok((StatusCode::CREATED, Json(borrowing)))
}

/// Renew a loan
#[utoipa::path(
    post,
    path = "/borrowings/{id}/renew",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Loan renewed", body = BorrowingDetails),
        (status = 404, description = "Borrowing not found"),
        (status = 409, description = "Already returned"),
        (status = 422, description = "Renewal limit reached or loan overdue")
    )
)]
pub async fn renew(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(borrowing_id): Path<i32>,
) -> AppResult<Json<BorrowingDetails>> {
    let owner = state.services.lending.get_borrowing_owner(borrowing_id).await?;
    claims.require_self_or_staff(owner)?;

    let renewed = state.services.lending.renew(borrowing_id).await?;
    Ok(Json(renewed))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrowings/{id}/return",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = BorrowingDetails),
        (status = 404, description = "Borrowing not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(borrowing_id): Path<i32>,
) -> AppResult<Json<BorrowingDetails>> {
    let owner = state.services.lending.get_borrowing_owner(borrowing_id).await?;
    claims.require_self_or_staff(owner)?;

    // record who handled the return when it wasn't the borrower
    let returned_by = (claims.member_id != owner).then_some(claims.member_id);

    let returned = state
        .services
        .lending
        .return_loan(borrowing_id, returned_by)
        .await?;
    Ok(Json(returned))
}

//! Fine endpoints: waive and the payment collaborator's paid callback

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::fine::{Fine, WaiveFine},
};

use super::AuthenticatedMember;

/// Waive a pending fine
#[utoipa::path(
    post,
    path = "/fines/{id}/waive",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Fine ID")
    ),
    request_body = WaiveFine,
    responses(
        (status = 200, description = "Fine waived", body = Fine),
        (status = 404, description = "Fine not found"),
        (status = 409, description = "Fine is not pending")
    )
)]
pub async fn waive(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(fine_id): Path<i32>,
    request: Option<Json<WaiveFine>>,
) -> AppResult<Json<Fine>> {
    claims.require_admin()?;

    let notes = request.and_then(|Json(r)| r.notes);
    let fine = state
        .services
        .fines
        .waive(fine_id, claims.member_id, notes)
        .await?;
    Ok(Json(fine))
}

/// Record the payment collaborator's "fine paid" fact
#[utoipa::path(
    post,
    path = "/fines/{id}/paid",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Fine ID")
    ),
    responses(
        (status = 200, description = "Fine settled", body = Fine),
        (status = 404, description = "Fine not found"),
        (status = 409, description = "Fine is not pending")
    )
)]
pub async fn mark_paid(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(fine_id): Path<i32>,
) -> AppResult<Json<Fine>> {
    claims.require_staff()?;

    let fine = state.services.fines.mark_paid(fine_id).await?;
    Ok(Json(fine))
}

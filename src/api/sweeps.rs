//! Sweep endpoints, triggered by the external scheduler

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    services::{fines::FineSweepReport, reservations::ExpirySweepReport},
};

use super::AuthenticatedMember;

/// Run the fine sweep over all overdue borrowings
#[utoipa::path(
    post,
    path = "/sweeps/fines",
    tag = "sweeps",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sweep completed", body = FineSweepReport)
    )
)]
pub async fn run_fine_sweep(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
) -> AppResult<Json<FineSweepReport>> {
    claims.require_staff()?;

    let report = state.services.fines.run_sweep().await?;
    Ok(Json(report))
}

/// Run the reservation expiry sweep
#[utoipa::path(
    post,
    path = "/sweeps/reservations",
    tag = "sweeps",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sweep completed", body = ExpirySweepReport)
    )
)]
pub async fn run_expiry_sweep(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
) -> AppResult<Json<ExpirySweepReport>> {
    claims.require_staff()?;

    let report = state.services.reservations.run_expiry_sweep().await?;
    Ok(Json(report))
}

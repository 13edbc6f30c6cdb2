//! API handlers for Bookflix REST endpoints

pub mod books;
pub mod borrowings;
pub mod fines;
pub mod health;
pub mod members;
pub mod openapi;
pub mod reservations;
pub mod sweeps;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{error::AppError, models::member::MemberClaims, AppState};

/// Extractor for the authenticated member from a JWT token
pub struct AuthenticatedMember(pub MemberClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedMember {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        // Check for Bearer token
        if !auth_header.starts_with("Bearer ") {
            return Err(AppError::Authentication(
                "Invalid authorization header format".to_string(),
            ));
        }

        let token = &auth_header[7..];

        // Validate JWT token using the secret from configuration
        let claims = MemberClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedMember(claims))
    }
}

//! Member model, subscription facts and authenticated-claims types
//!
//! Members are owned by the identity collaborator; the lending engine only
//! reads the subscription facts and the role carried in JWT claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;

/// Subscription plan sold by the billing collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subscription_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Free,
    Monthly,
    Yearly,
}

/// Billing status of the subscription, updated by payment webhooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

/// Member role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Librarian,
    Admin,
}

impl Role {
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Librarian | Role::Admin)
    }
}

/// Member model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub subscription_type: SubscriptionType,
    pub subscription_status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

/// JWT claims supplied by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberClaims {
    pub sub: String,
    pub member_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl MemberClaims {
    /// Parse and validate a JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Create a token (used by tests and tooling; issuing is otherwise the
    /// identity provider's job)
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    // Authorization checks

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Librarian access required".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Authorization("Admin access required".to_string()))
        }
    }

    /// Members may act on their own records; staff may act on anyone's
    pub fn require_self_or_staff(&self, member_id: i32) -> Result<(), AppError> {
        if self.member_id == member_id || self.role.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Cannot access another member's records".to_string(),
            ))
        }
    }
}

//! Book (catalog title) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub rating: Option<f32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book with stock counts, as listed in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub rating: Option<f32>,
    pub is_active: bool,
    pub total_copies: i64,
    pub available_copies: i64,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub author: String,
    #[validate(length(max = 20))]
    pub isbn: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f32>,
    /// Copies to create alongside the title
    #[validate(range(min = 0, max = 500))]
    pub initial_copies: Option<i64>,
}

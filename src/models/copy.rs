//! Book copy (physical lending unit) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Copy status. A copy is lent out (`Borrowed`) or held for a ready
/// reservation (`Reserved`) by at most one record at a time, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "copy_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CopyStatus {
    Available,
    Borrowed,
    Reserved,
    Lost,
    Maintenance,
}

impl CopyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Available => "available",
            CopyStatus::Borrowed => "borrowed",
            CopyStatus::Reserved => "reserved",
            CopyStatus::Lost => "lost",
            CopyStatus::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Book copy model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookCopy {
    pub id: i32,
    pub book_id: i32,
    pub copy_number: i32,
    pub barcode: Option<String>,
    pub status: CopyStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Update copy status request (librarian marks a copy lost or repaired)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCopyStatus {
    pub status: CopyStatus,
}

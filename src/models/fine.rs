//! Fine model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Fine status. `paid` and `waived` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "fine_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FineStatus {
    Pending,
    Paid,
    Waived,
}

/// Fine model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Fine {
    pub id: i32,
    pub member_id: i32,
    pub borrowing_id: i32,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub days_overdue: i32,
    pub status: FineStatus,
    pub issued_date: DateTime<Utc>,
    pub paid_date: Option<DateTime<Utc>>,
    pub waived_date: Option<DateTime<Utc>>,
    pub waived_by: Option<i32>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Waive fine request
#[derive(Debug, Deserialize, ToSchema)]
pub struct WaiveFine {
    pub notes: Option<String>,
}

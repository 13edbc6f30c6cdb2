//! Notifications repository for database operations

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::notification::Notification};

#[derive(Clone)]
pub struct NotificationsRepository {
    pool: Pool<Postgres>,
}

impl NotificationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Persist a notification intent
    pub async fn insert(
        &self,
        member_id: i32,
        kind: &str,
        title: &str,
        message: &str,
        payload: &serde_json::Value,
        email: bool,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (member_id, kind, title, message, payload, email)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(member_id)
        .bind(kind)
        .bind(title)
        .bind(message)
        .bind(payload)
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// A member's notifications, newest first
    pub async fn get_member_notifications(&self, member_id: i32) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE member_id = $1 ORDER BY created_at DESC LIMIT 100",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }
}

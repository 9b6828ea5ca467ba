//! Notification repository

use crate::config::DEFAULT_NOTIFICATION_LIMIT;
use crate::database::models::{NewNotification, Notification, NotificationFilter};
use crate::database::record::{Fields, RecordStore, Table};
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::SqlitePool;

pub struct NotificationsTable;

impl Table for NotificationsTable {
    const NAME: &'static str = "notifications";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "notification_type",
        "title",
        "message",
        "is_read",
        "is_system",
        "cocktail_id",
        "created_at",
        "read_at",
    ];
    type Row = Notification;
}

#[derive(Clone)]
pub struct NotificationRepository {
    records: RecordStore<NotificationsTable>,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            records: RecordStore::new(pool),
        }
    }

    fn pool(&self) -> &SqlitePool {
        self.records.pool()
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Notification>> {
        self.records.find_by_id(id).await
    }

    /// Notifications visible to a user (their own plus system-wide), newest first
    pub async fn find_by_user_id(
        &self,
        user_id: i64,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>> {
        let limit = filter.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT).max(0);
        let kind = filter.notification_type.map(|t| t.as_str());

        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE (user_id = ? OR user_id IS NULL)
              AND (? = 0 OR is_read = 0)
              AND (? IS NULL OR notification_type = ?)
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(filter.unread_only)
        .bind(kind)
        .bind(kind)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(notifications)
    }

    pub async fn create_notification(&self, req: &NewNotification) -> Result<i64> {
        if req.title.trim().is_empty() {
            return Err(AppError::validation("Notification title is required"));
        }

        let fields = Fields::new()
            .with("user_id", req.user_id)
            .with("notification_type", req.notification_type)
            .with("title", req.title.trim())
            .with("message", req.message.as_str())
            .with("is_read", false)
            .with("is_system", req.is_system)
            .with("cocktail_id", req.cocktail_id)
            .with("created_at", Utc::now());

        let id = self.records.create(&fields).await?;

        tracing::debug!(
            "Created {} notification {} for user {:?}",
            req.notification_type.as_str(),
            id,
            req.user_id
        );
        Ok(id)
    }

    /// Returns false if the notification is missing or already read
    pub async fn mark_as_read(&self, id: i64) -> Result<bool> {
        let rows =
            sqlx::query("UPDATE notifications SET is_read = 1, read_at = ? WHERE id = ? AND is_read = 0")
                .bind(Utc::now())
                .bind(id)
                .execute(self.pool())
                .await?
                .rows_affected();

        Ok(rows > 0)
    }

    /// Marks the user's own unread notifications; returns how many changed
    pub async fn mark_all_as_read(&self, user_id: i64) -> Result<u64> {
        let rows = sqlx::query(
            "UPDATE notifications SET is_read = 1, read_at = ? WHERE user_id = ? AND is_read = 0",
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(self.pool())
        .await?
        .rows_affected();

        tracing::debug!("Marked {} notifications read for user {}", rows, user_id);
        Ok(rows)
    }

    pub async fn count_unread(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE (user_id = ? OR user_id IS NULL) AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;

        Ok(count)
    }

    /// Delete read notifications created more than `days_old` days ago
    pub async fn clean_old_notifications(&self, days_old: i64) -> Result<u64> {
        if days_old < 0 {
            return Err(AppError::validation("days_old must not be negative"));
        }

        // julianday() normalizes both RFC 3339 and CURRENT_TIMESTAMP text
        let rows = sqlx::query(
            "DELETE FROM notifications WHERE is_read = 1 AND julianday(created_at) < julianday('now', ?)",
        )
        .bind(format!("-{} days", days_old))
        .execute(self.pool())
        .await?
        .rows_affected();

        tracing::info!("Cleaned {} old notifications", rows);
        Ok(rows)
    }

    pub async fn delete_notification(&self, id: i64) -> Result<bool> {
        self.records.delete(id).await
    }
}

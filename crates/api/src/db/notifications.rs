//! Notification repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ration_tds_core::{NotificationId, ShopId, UserId};

use super::RepositoryError;
use crate::models::notification::Notification;

/// Default and maximum page sizes for the listing query. The limit is a
/// bound parameter, never interpolated into the SQL text.
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: NotificationId,
    shop_id: Option<ShopId>,
    user_id: Option<UserId>,
    notification_type: String,
    message: String,
    is_sent: bool,
    created_at: DateTime<Utc>,
    acknowledged_at: Option<DateTime<Utc>>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            shop_id: row.shop_id,
            user_id: row.user_id,
            notification_type: row.notification_type,
            message: row.message,
            is_sent: row.is_sent,
            created_at: row.created_at,
            acknowledged_at: row.acknowledged_at,
        }
    }
}

const NOTIFICATION_COLUMNS: &str = "id, shop_id, user_id, notification_type, message, \
     is_sent, created_at, acknowledged_at";

/// Fields for creating a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// Shop scope, or `None` for global.
    pub shop_id: Option<ShopId>,
    /// Addressed user, or `None` for shop-wide.
    pub user_id: Option<UserId>,
    /// Category tag.
    pub notification_type: String,
    /// Human-readable message.
    pub message: String,
}

/// Repository for notification operations.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Notifications visible to a requester: their shop's plus global ones,
    /// or global-only for requesters with no shop. Newest-id first.
    ///
    /// The limit is clamped to [1, [`MAX_LIMIT`]].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_visible(
        &self,
        shop_id: Option<&ShopId>,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE shop_id IS NULL OR shop_id = $1
             ORDER BY id DESC
             LIMIT $2"
        ))
        .bind(shop_id.map(ShopId::as_str))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a notification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewNotification) -> Result<Notification, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "INSERT INTO notifications (shop_id, user_id, notification_type, message)
             VALUES ($1, $2, $3, $4)
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(new.shop_id.as_ref().map(ShopId::as_str))
        .bind(new.user_id)
        .bind(&new.notification_type)
        .bind(&new.message)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Mark a notification acknowledged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no notification has this ID.
    pub async fn acknowledge(&self, id: NotificationId) -> Result<Notification, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "UPDATE notifications SET acknowledged_at = NOW()
             WHERE id = $1
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("notification {id}")))?;

        Ok(row.into())
    }
}

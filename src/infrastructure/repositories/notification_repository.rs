//! Notification Repository Implementation
//!
//! A user holds at most one notification per name: `replace` deletes the old
//! rows and inserts the new one in the caller's transaction.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::{Notification, NotificationRepository};
use crate::infrastructure::database::TransactionContext;
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    user_id: i64,
    name: String,
    payload: Json<serde_json::Value>,
    timestamp: f64,
}

impl NotificationRow {
    fn into_notification(self) -> Notification {
        Notification {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            payload: self.payload.0,
            timestamp: self.timestamp,
        }
    }
}

/// PostgreSQL notification repository implementation.
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn replace(
        &self,
        tx: &mut TransactionContext,
        notification: &Notification,
    ) -> Result<Notification, AppError> {
        let removed = sqlx::query_as::<_, NotificationRow>(
            r#"
            DELETE FROM notifications
            WHERE user_id = $1 AND name = $2
            RETURNING id, user_id, name, payload, timestamp
            "#,
        )
        .bind(notification.user_id)
        .bind(&notification.name)
        .fetch_all(tx.conn())
        .await?;

        for row in removed {
            tx.record_deleted(row.into_notification());
        }

        let created = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (id, user_id, name, payload, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, payload, timestamp
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(&notification.name)
        .bind(Json(&notification.payload))
        .bind(notification.timestamp)
        .fetch_one(tx.conn())
        .await?
        .into_notification();

        tx.record_added(created.clone());
        Ok(created)
    }

    async fn since(&self, user_id: i64, since: f64) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, name, payload, timestamp
            FROM notifications
            WHERE user_id = $1 AND timestamp > $2
            ORDER BY timestamp ASC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(NotificationRow::into_notification).collect())
    }
}

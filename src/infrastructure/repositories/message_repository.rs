//! Message Repository Implementation
//!
//! PostgreSQL implementation of private message storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Message, MessageListing, MessageRepository};
use crate::infrastructure::database::TransactionContext;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for message queries.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    sender_id: i64,
    recipient_id: i64,
    body: String,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    /// Converts database row to domain Message entity.
    fn into_message(self) -> Message {
        Message {
            id: self.id,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            body: self.body,
            created_at: self.created_at,
        }
    }
}

/// Message joined with its sender.
#[derive(Debug, sqlx::FromRow)]
struct MessageListingRow {
    #[sqlx(flatten)]
    message: MessageRow,
    sender_username: String,
    sender_email: String,
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(
        &self,
        tx: &mut TransactionContext,
        message: &Message,
    ) -> Result<Message, AppError> {
        let created = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, sender_id, recipient_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sender_id, recipient_id, body, created_at
            "#,
        )
        .bind(message.id)
        .bind(message.sender_id)
        .bind(message.recipient_id)
        .bind(&message.body)
        .fetch_one(tx.conn())
        .await?
        .into_message();

        tx.record_added(created.clone());
        Ok(created)
    }

    async fn count_unread(
        &self,
        tx: &mut TransactionContext,
        recipient_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE recipient_id = $1
              AND ($2::timestamptz IS NULL OR created_at > $2)
            "#,
        )
        .bind(recipient_id)
        .bind(since)
        .fetch_one(tx.conn())
        .await?;

        Ok(count)
    }

    async fn received(
        &self,
        recipient_id: i64,
        page: PageRequest,
    ) -> Result<Vec<MessageListing>, AppError> {
        let rows = sqlx::query_as::<_, MessageListingRow>(
            r#"
            SELECT m.id, m.sender_id, m.recipient_id, m.body, m.created_at,
                   u.username AS sender_username,
                   u.email AS sender_email
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.recipient_id = $1
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(recipient_id)
        .bind(page.fetch_limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| MessageListing {
                message: row.message.into_message(),
                sender_username: row.sender_username,
                sender_email: row.sender_email,
            })
            .collect())
    }
}

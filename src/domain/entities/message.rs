//! Private message entity and repository trait.
//!
//! Maps to the `messages` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::infrastructure::database::TransactionContext;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// A private message between two users.
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - sender_id: BIGINT NOT NULL REFERENCES users(id)
/// - recipient_id: BIGINT NOT NULL REFERENCES users(id)
/// - body: VARCHAR(140) NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether the recipient has not seen this message as of `last_read`.
    pub fn is_unread(&self, last_read: Option<DateTime<Utc>>) -> bool {
        last_read.map_or(true, |read| self.created_at > read)
    }
}

/// A received message with its sender's name.
#[derive(Debug, Clone)]
pub struct MessageListing {
    pub message: Message,
    pub sender_username: String,
    pub sender_email: String,
}

/// Repository trait for Message data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, tx: &mut TransactionContext, message: &Message)
        -> Result<Message, AppError>;

    /// Messages received by `recipient_id` after `since` (all when `None`).
    ///
    /// Runs inside the transaction so uncommitted messages are counted.
    async fn count_unread(
        &self,
        tx: &mut TransactionContext,
        recipient_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError>;

    /// Messages received by `recipient_id`, newest first.
    async fn received(
        &self,
        recipient_id: i64,
        page: PageRequest,
    ) -> Result<Vec<MessageListing>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_unread() {
        let now = Utc::now();
        let message = Message {
            id: 1,
            sender_id: 2,
            recipient_id: 3,
            body: "hi".into(),
            created_at: now,
        };

        assert!(message.is_unread(None));
        assert!(message.is_unread(Some(now - Duration::seconds(5))));
        assert!(!message.is_unread(Some(now)));
        assert!(!message.is_unread(Some(now + Duration::seconds(5))));
    }
}

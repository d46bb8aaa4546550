//! Notification entity and repository trait.
//!
//! Maps to the `notifications` table. A user holds at most one notification
//! per name; adding one replaces the previous.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::infrastructure::database::TransactionContext;
use crate::shared::error::AppError;

/// Name of the unread-message counter notification.
pub const UNREAD_MESSAGE_COUNT: &str = "unread_message_count";

/// Maps to the `notifications` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - user_id: BIGINT NOT NULL REFERENCES users(id)
/// - name: VARCHAR(128) NOT NULL
/// - payload: JSONB NOT NULL
/// - timestamp: DOUBLE PRECISION NOT NULL (Unix seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub payload: Value,
    pub timestamp: f64,
}

impl Notification {
    /// New notification stamped with the current time.
    pub fn new(id: i64, user_id: i64, name: impl Into<String>, payload: Value) -> Self {
        Self {
            id,
            user_id,
            name: name.into(),
            payload,
            timestamp: unix_seconds_now(),
        }
    }
}

/// Current time as fractional Unix seconds.
pub fn unix_seconds_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Repository trait for Notification data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Delete the user's notifications named `notification.name`, then insert it.
    async fn replace(
        &self,
        tx: &mut TransactionContext,
        notification: &Notification,
    ) -> Result<Notification, AppError>;

    /// Notifications newer than `since`, oldest first.
    async fn since(&self, user_id: i64, since: f64) -> Result<Vec<Notification>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_stamps_current_time() {
        let before = unix_seconds_now();
        let n = Notification::new(1, 2, UNREAD_MESSAGE_COUNT, json!(3));
        let after = unix_seconds_now();

        assert!(n.timestamp >= before && n.timestamp <= after);
        assert_eq!(n.name, "unread_message_count");
        assert_eq!(n.payload, json!(3));
    }
}

//! Notification Service
//!
//! Named per-user notifications that clients poll with a `since` timestamp.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Notification, NotificationRepository};
use crate::infrastructure::database::UnitOfWork;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Notifications newer than `since` (Unix seconds), oldest first.
    async fn notifications_since(
        &self,
        user_id: i64,
        since: f64,
    ) -> Result<Vec<Notification>, AppError>;

    /// Store `payload` under `name`, replacing the previous notification of
    /// that name.
    async fn add_notification(
        &self,
        user_id: i64,
        name: &str,
        payload: Value,
    ) -> Result<Notification, AppError>;
}

pub struct NotificationServiceImpl<N, W>
where
    N: NotificationRepository,
    W: UnitOfWork,
{
    notification_repo: Arc<N>,
    uow: Arc<W>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<N, W> NotificationServiceImpl<N, W>
where
    N: NotificationRepository,
    W: UnitOfWork,
{
    pub fn new(
        notification_repo: Arc<N>,
        uow: Arc<W>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            notification_repo,
            uow,
            id_generator,
        }
    }
}

#[async_trait]
impl<N, W> NotificationService for NotificationServiceImpl<N, W>
where
    N: NotificationRepository + 'static,
    W: UnitOfWork + 'static,
{
    async fn notifications_since(
        &self,
        user_id: i64,
        since: f64,
    ) -> Result<Vec<Notification>, AppError> {
        self.notification_repo.since(user_id, since).await
    }

    async fn add_notification(
        &self,
        user_id: i64,
        name: &str,
        payload: Value,
    ) -> Result<Notification, AppError> {
        let notification = Notification::new(self.id_generator.generate(), user_id, name, payload);

        let mut tx = self.uow.begin().await?;
        let stored = self.notification_repo.replace(&mut tx, &notification).await?;
        self.uow.commit(tx).await?;

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::NoTransactions;
    use crate::domain::{MockNotificationRepository, UNREAD_MESSAGE_COUNT};
    use crate::shared::snowflake::DEFAULT_EPOCH;
    use serde_json::json;

    fn service(
        repo: MockNotificationRepository,
    ) -> NotificationServiceImpl<MockNotificationRepository, NoTransactions> {
        NotificationServiceImpl::new(
            Arc::new(repo),
            Arc::new(NoTransactions),
            Arc::new(SnowflakeGenerator::new(1, DEFAULT_EPOCH)),
        )
    }

    #[tokio::test]
    async fn test_notifications_since_passes_through_order() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_since()
            .withf(|user_id, since| *user_id == 4 && *since == 10.5)
            .returning(|user_id, _| {
                Ok(vec![
                    Notification {
                        id: 1,
                        user_id,
                        name: UNREAD_MESSAGE_COUNT.into(),
                        payload: json!(1),
                        timestamp: 11.0,
                    },
                    Notification {
                        id: 2,
                        user_id,
                        name: "other".into(),
                        payload: json!({"x": 1}),
                        timestamp: 12.0,
                    },
                ])
            });

        let notifications = service(repo).notifications_since(4, 10.5).await.unwrap();
        let ids: Vec<i64> = notifications.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_add_notification_needs_a_transaction() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_replace().times(0);

        let result = service(repo).add_notification(1, "x", json!(null)).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}

//! Message Service
//!
//! Private messages and the recipient's unread counter.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::domain::{
    Message, MessageListing, MessageRepository, Notification, NotificationRepository, User,
    UserRepository, MAX_POST_LENGTH, UNREAD_MESSAGE_COUNT,
};
use crate::infrastructure::database::UnitOfWork;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};
use crate::shared::snowflake::SnowflakeGenerator;

/// Message service trait
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Send a message to `recipient`. The recipient's unread counter is
    /// refreshed in the same transaction.
    async fn send_message(
        &self,
        sender_id: i64,
        recipient: &str,
        body: &str,
    ) -> Result<Message, MessageError>;

    /// Mark everything read, then list received messages newest first.
    async fn inbox(&self, user_id: i64, page: PageRequest)
        -> Result<Page<MessageListing>, MessageError>;
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Recipient not found")]
    RecipientNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Message body is empty")]
    EmptyBody,

    #[error("Message body exceeds 140 characters")]
    BodyTooLong,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<MessageError> for AppError {
    fn from(e: MessageError) -> Self {
        match e {
            MessageError::RecipientNotFound => AppError::NotFound("Recipient not found".into()),
            MessageError::UserNotFound => AppError::NotFound("User not found".into()),
            e @ (MessageError::EmptyBody | MessageError::BodyTooLong) => {
                AppError::Validation(e.to_string())
            }
            MessageError::Repository(e) => e,
        }
    }
}

/// MessageService implementation
pub struct MessageServiceImpl<M, N, U, W>
where
    M: MessageRepository,
    N: NotificationRepository,
    U: UserRepository,
    W: UnitOfWork,
{
    message_repo: Arc<M>,
    notification_repo: Arc<N>,
    user_repo: Arc<U>,
    uow: Arc<W>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<M, N, U, W> MessageServiceImpl<M, N, U, W>
where
    M: MessageRepository,
    N: NotificationRepository,
    U: UserRepository,
    W: UnitOfWork,
{
    pub fn new(
        message_repo: Arc<M>,
        notification_repo: Arc<N>,
        user_repo: Arc<U>,
        uow: Arc<W>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            message_repo,
            notification_repo,
            user_repo,
            uow,
            id_generator,
        }
    }

    fn unread_notification(&self, user: &User, count: i64) -> Notification {
        Notification::new(
            self.id_generator.generate(),
            user.id,
            UNREAD_MESSAGE_COUNT,
            json!(count),
        )
    }
}

#[async_trait]
impl<M, N, U, W> MessageService for MessageServiceImpl<M, N, U, W>
where
    M: MessageRepository + 'static,
    N: NotificationRepository + 'static,
    U: UserRepository + 'static,
    W: UnitOfWork + 'static,
{
    async fn send_message(
        &self,
        sender_id: i64,
        recipient: &str,
        body: &str,
    ) -> Result<Message, MessageError> {
        if body.trim().is_empty() {
            return Err(MessageError::EmptyBody);
        }
        if body.chars().count() > MAX_POST_LENGTH {
            return Err(MessageError::BodyTooLong);
        }

        let recipient = self
            .user_repo
            .find_by_username(recipient)
            .await?
            .ok_or(MessageError::RecipientNotFound)?;

        let message = Message {
            id: self.id_generator.generate(),
            sender_id,
            recipient_id: recipient.id,
            body: body.to_string(),
            created_at: Utc::now(),
        };

        let mut tx = self.uow.begin().await?;
        let sent = self.message_repo.create(&mut tx, &message).await?;
        let unread = self
            .message_repo
            .count_unread(&mut tx, recipient.id, recipient.last_message_read_time)
            .await?;
        self.notification_repo
            .replace(&mut tx, &self.unread_notification(&recipient, unread))
            .await?;
        self.uow.commit(tx).await?;

        tracing::info!(
            message_id = sent.id,
            sender_id,
            recipient_id = recipient.id,
            unread,
            "Message sent"
        );
        Ok(sent)
    }

    async fn inbox(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<MessageListing>, MessageError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(MessageError::UserNotFound)?;

        let mut tx = self.uow.begin().await?;
        self.user_repo
            .set_last_message_read_time(&mut tx, user.id, Utc::now())
            .await?;
        self.notification_repo
            .replace(&mut tx, &self.unread_notification(&user, 0))
            .await?;
        self.uow.commit(tx).await?;

        let rows = self.message_repo.received(user.id, page).await?;
        Ok(Page::from_overfetch(rows, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::NoTransactions;
    use crate::domain::{MockMessageRepository, MockNotificationRepository, MockUserRepository};
    use crate::shared::snowflake::DEFAULT_EPOCH;

    fn service(
        messages: MockMessageRepository,
        users: MockUserRepository,
    ) -> MessageServiceImpl<
        MockMessageRepository,
        MockNotificationRepository,
        MockUserRepository,
        NoTransactions,
    > {
        MessageServiceImpl::new(
            Arc::new(messages),
            Arc::new(MockNotificationRepository::new()),
            Arc::new(users),
            Arc::new(NoTransactions),
            Arc::new(SnowflakeGenerator::new(1, DEFAULT_EPOCH)),
        )
    }

    #[tokio::test]
    async fn test_send_to_unknown_recipient() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        let mut messages = MockMessageRepository::new();
        messages.expect_create().times(0);

        let result = service(messages, users).send_message(1, "ghost", "hello").await;
        assert!(matches!(result, Err(MessageError::RecipientNotFound)));
    }

    #[tokio::test]
    async fn test_send_rejects_blank_body() {
        let result = service(MockMessageRepository::new(), MockUserRepository::new())
            .send_message(1, "bob", "  ")
            .await;
        assert!(matches!(result, Err(MessageError::EmptyBody)));
    }

    #[tokio::test]
    async fn test_send_rejects_long_body() {
        let body = "m".repeat(MAX_POST_LENGTH + 1);
        let result = service(MockMessageRepository::new(), MockUserRepository::new())
            .send_message(1, "bob", &body)
            .await;
        assert!(matches!(result, Err(MessageError::BodyTooLong)));
    }

    #[tokio::test]
    async fn test_send_fails_without_transaction() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|name| {
            Ok(Some(User {
                id: 2,
                username: name.into(),
                ..User::default()
            }))
        });
        let mut messages = MockMessageRepository::new();
        messages.expect_create().times(0);

        let result = service(messages, users).send_message(1, "bob", "hello").await;
        assert!(matches!(
            result,
            Err(MessageError::Repository(AppError::Internal(_)))
        ));
    }

    #[tokio::test]
    async fn test_inbox_for_unknown_user() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let mut messages = MockMessageRepository::new();
        messages.expect_received().times(0);

        let result = service(messages, users)
            .inbox(9, PageRequest::new(None, 10))
            .await;
        assert!(matches!(result, Err(MessageError::UserNotFound)));
    }
}

//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Registration, login, JWT access tokens
//! - **UserService**: Profiles and the follow relation
//! - **PostService**: Posts, comments, likes and rendered listings
//! - **MessageService**: Private messages and the unread counter
//! - **NotificationService**: Polled per-user notifications
//! - **SearchService**: Full-text post search and index rebuilds

pub mod auth_service;
pub mod message_service;
pub mod notification_service;
pub mod post_service;
pub mod search_service;
pub mod user_service;

pub use auth_service::{AuthError, AuthService, AuthServiceImpl, AuthTokens, Claims};
pub use message_service::{MessageError, MessageService, MessageServiceImpl};
pub use notification_service::{NotificationService, NotificationServiceImpl};
pub use post_service::{
    render_listings, CreatePostDto, PostError, PostService, PostServiceImpl, PostView,
};
pub use search_service::{SearchService, SearchServiceImpl};
pub use user_service::{UpdateProfileDto, UserError, UserService, UserServiceImpl};

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;

    use crate::infrastructure::database::{TransactionContext, UnitOfWork};
    use crate::shared::error::AppError;

    /// Unit of work for tests that never reach the database.
    pub struct NoTransactions;

    #[async_trait]
    impl UnitOfWork for NoTransactions {
        async fn begin(&self) -> Result<TransactionContext, AppError> {
            Err(AppError::Internal("no database in unit tests".into()))
        }

        async fn commit(&self, _tx: TransactionContext) -> Result<(), AppError> {
            Err(AppError::Internal("no database in unit tests".into()))
        }
    }
}

//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! ## Available Repositories
//!
//! - **UserRepository** - Accounts, profiles and the follow relation
//! - **PostRepository** - Posts, comment threads and likes
//! - **MessageRepository** - Private messages
//! - **NotificationRepository** - Per-user named notifications
//!
//! Writes taking a [`TransactionContext`](crate::infrastructure::database::TransactionContext)
//! record the rows they touch so the search index can follow the commit.

pub mod message_repository;
pub mod notification_repository;
pub mod post_repository;
pub mod user_repository;

pub use message_repository::PgMessageRepository;
pub use notification_repository::PgNotificationRepository;
pub use post_repository::PgPostRepository;
pub use user_repository::PgUserRepository;

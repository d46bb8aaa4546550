//! # Domain Entities
//!
//! Core domain entities. All entities map directly to their database tables.
//!
//! - **User**: account, profile, follow relation
//! - **Post**: a post or, with a parent, a comment; likes hang off posts
//! - **Message**: private message between two users
//! - **Notification**: per-user named payloads polled by clients
//!
//! Each entity has a repository trait implemented in the infrastructure layer.

mod message;
mod notification;
mod post;
mod user;

pub use message::{Message, MessageListing, MessageRepository};
pub use notification::{
    unix_seconds_now, Notification, NotificationRepository, UNREAD_MESSAGE_COUNT,
};
pub use post::{Post, PostListing, PostRepository, MAX_POST_LENGTH};
pub use user::{User, UserRepository};

#[cfg(test)]
pub use message::MockMessageRepository;
#[cfg(test)]
pub use notification::MockNotificationRepository;
#[cfg(test)]
pub use post::MockPostRepository;
#[cfg(test)]
pub use user::MockUserRepository;

//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::services::{mention_parser, MentionTarget};
use crate::infrastructure::database::TransactionContext;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Represents a user account.
///
/// Maps to the `users` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - username: VARCHAR(64) NOT NULL UNIQUE
/// - email: VARCHAR(120) NOT NULL UNIQUE
/// - password_hash: VARCHAR(255) NOT NULL
/// - about_me: VARCHAR(140) NULL
/// - last_seen: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - last_message_read_time: TIMESTAMPTZ NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Username (may contain spaces)
    pub username: String,

    /// Email address (unique)
    pub email: String,

    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Profile text, up to 140 characters
    pub about_me: Option<String>,

    /// Last authenticated request
    pub last_seen: DateTime<Utc>,

    /// When the inbox was last opened
    pub last_message_read_time: Option<DateTime<Utc>>,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name used after `@` in post bodies.
    pub fn mention_name(&self) -> String {
        mention_parser::mention_name(&self.username)
    }

    /// Gravatar identicon URL for this user's email.
    pub fn avatar(&self, size: u32) -> String {
        Self::avatar_for_email(&self.email, size)
    }

    pub fn avatar_for_email(email: &str, size: u32) -> String {
        let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
        format!(
            "https://www.gravatar.com/avatar/{:x}?d=identicon&s={}",
            digest, size
        )
    }

    pub fn mention_target(&self) -> MentionTarget {
        MentionTarget::new(self.id, self.username.clone())
    }
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username: String::new(),
            email: String::new(),
            password_hash: String::new(),
            about_me: None,
            last_seen: now,
            last_message_read_time: None,
            created_at: now,
        }
    }
}

/// Repository trait for User data access operations.
///
/// Writes that belong to a unit of work take the open transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Find a user by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Check if a username is already taken.
    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;

    /// Check if an email address is already registered.
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Users whose mention name is one of `mention_names`, in id order.
    async fn mention_targets(&self, mention_names: &[String])
        -> Result<Vec<MentionTarget>, AppError>;

    /// Insert a new user.
    async fn create(&self, tx: &mut TransactionContext, user: &User) -> Result<User, AppError>;

    /// Update username, email and about_me.
    async fn update_profile(&self, tx: &mut TransactionContext, user: &User)
        -> Result<User, AppError>;

    /// Mark the inbox as read at `at`.
    async fn set_last_message_read_time(
        &self,
        tx: &mut TransactionContext,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Record activity for the user.
    async fn touch_last_seen(&self, user_id: i64) -> Result<(), AppError>;

    /// Follow `followed_id`. Returns false if already following.
    async fn follow(&self, follower_id: i64, followed_id: i64) -> Result<bool, AppError>;

    /// Unfollow `followed_id`. Returns false if not following.
    async fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<bool, AppError>;

    async fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool, AppError>;

    /// Users followed by `user_id`, ordered by username.
    async fn following(&self, user_id: i64, page: PageRequest) -> Result<Vec<User>, AppError>;

    /// Users following `user_id`, ordered by username.
    async fn followers(&self, user_id: i64, page: PageRequest) -> Result<Vec<User>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user() -> User {
        User {
            id: 12345678901234567,
            username: "mary jane".to_string(),
            email: "MaryJane@Example.com".to_string(),
            password_hash: "hashed_password".to_string(),
            ..User::default()
        }
    }

    #[test]
    fn test_mention_name_removes_spaces() {
        assert_eq!(create_test_user().mention_name(), "maryjane");
    }

    #[test]
    fn test_mention_name_without_spaces_is_username() {
        let user = User {
            username: "alice".into(),
            ..User::default()
        };
        assert_eq!(user.mention_name(), "alice");
    }

    #[test]
    fn test_mention_name_keeps_single_word_with_trailing_space() {
        let user = User {
            username: "alice ".into(),
            ..User::default()
        };
        assert_eq!(user.mention_name(), "alice ");
    }

    #[test]
    fn test_mention_target_matches_mention_name() {
        let user = create_test_user();
        let target = user.mention_target();
        assert_eq!(target.user_id, user.id);
        assert_eq!(target.username, "mary jane");
        assert_eq!(target.mention_name, user.mention_name());
    }

    #[test]
    fn test_avatar_is_case_insensitive_on_email() {
        let user = create_test_user();
        let mut lower = user.clone();
        lower.email = lower.email.to_lowercase();

        assert_eq!(user.avatar(128), lower.avatar(128));
        assert!(user.avatar(36).starts_with("https://www.gravatar.com/avatar/"));
        assert!(user.avatar(36).ends_with("?d=identicon&s=36"));
    }

    #[test]
    fn test_avatar_digest_is_sha256_hex() {
        let url = create_test_user().avatar(80);
        let digest = url
            .trim_start_matches("https://www.gravatar.com/avatar/")
            .split('?')
            .next()
            .unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let serialized = serde_json::to_string(&create_test_user()).unwrap();
        assert!(!serialized.contains("password_hash"));
        assert!(!serialized.contains("hashed_password"));
    }
}

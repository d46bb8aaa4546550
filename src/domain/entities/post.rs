//! Post entity and repository trait.
//!
//! Maps to the `posts` table. A post with a `parent_id` is a comment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::User;
use crate::domain::search::Searchable;
use crate::infrastructure::database::TransactionContext;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Maximum post body length in characters.
pub const MAX_POST_LENGTH: usize = 140;

/// Represents a post or a comment.
///
/// Maps to the `posts` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - author_id: BIGINT NOT NULL REFERENCES users(id)
/// - body: VARCHAR(140) NOT NULL
/// - language: VARCHAR(5) NULL
/// - parent_id: BIGINT NULL REFERENCES posts(id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - edited_at: TIMESTAMPTZ NULL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub body: String,
    /// Language code supplied by the client, if any
    pub language: Option<String>,
    /// Post this comment replies to
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn is_comment(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn body_length(&self) -> usize {
        self.body.chars().count()
    }
}

impl Searchable for Post {
    const COLLECTION: &'static str = "posts";
    const FIELDS: &'static [&'static str] = &["body"];

    fn search_id(&self) -> i64 {
        self.id
    }

    fn field_value(&self, field: &str) -> Option<&str> {
        match field {
            "body" => Some(&self.body),
            _ => None,
        }
    }
}

impl Default for Post {
    fn default() -> Self {
        Self {
            id: 0,
            author_id: 0,
            body: String::new(),
            language: None,
            parent_id: None,
            created_at: Utc::now(),
            edited_at: None,
        }
    }
}

/// A post joined with what listings display next to it.
#[derive(Debug, Clone)]
pub struct PostListing {
    pub post: Post,
    pub author_username: String,
    pub author_email: String,
    pub like_count: i64,
    pub comment_count: i64,
}

/// Repository trait for Post data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError>;

    async fn find_listing(&self, id: i64) -> Result<Option<PostListing>, AppError>;

    /// Load posts by id, returned in the order of `ids`. Unknown ids are skipped.
    async fn find_listings_ordered(&self, ids: &[i64]) -> Result<Vec<PostListing>, AppError>;

    /// Posts by `user_id` and by everyone they follow, newest first.
    async fn home_feed(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Vec<PostListing>, AppError>;

    /// All posts and comments, newest first.
    async fn explore(&self, page: PageRequest) -> Result<Vec<PostListing>, AppError>;

    /// Top-level posts by `author_id`, newest first.
    async fn posts_by_author(&self, author_id: i64, page: PageRequest)
        -> Result<Vec<PostListing>, AppError>;

    /// Comments by `author_id`, newest first.
    async fn comments_by_author(
        &self,
        author_id: i64,
        page: PageRequest,
    ) -> Result<Vec<PostListing>, AppError>;

    /// Posts liked by `user_id`, newest first.
    async fn liked_by(&self, user_id: i64, page: PageRequest) -> Result<Vec<PostListing>, AppError>;

    /// Direct comments on `post_id`, newest first.
    async fn comments_of(&self, post_id: i64, page: PageRequest)
        -> Result<Vec<PostListing>, AppError>;

    /// Every post, for index rebuilds.
    async fn all(&self) -> Result<Vec<Post>, AppError>;

    async fn create(&self, tx: &mut TransactionContext, post: &Post) -> Result<Post, AppError>;

    /// Replace the body (and language) of an existing post.
    async fn update_body(&self, tx: &mut TransactionContext, post: &Post) -> Result<Post, AppError>;

    /// Delete a post together with its whole comment thread.
    async fn delete_thread(
        &self,
        tx: &mut TransactionContext,
        id: i64,
    ) -> Result<Vec<Post>, AppError>;

    /// Returns false if the like already existed.
    async fn like(&self, user_id: i64, post_id: i64) -> Result<bool, AppError>;

    /// Returns false if there was no like.
    async fn unlike(&self, user_id: i64, post_id: i64) -> Result<bool, AppError>;

    async fn is_liked(&self, user_id: i64, post_id: i64) -> Result<bool, AppError>;

    /// Users who liked `post_id`, ordered by username.
    async fn likers(&self, post_id: i64, page: PageRequest) -> Result<Vec<User>, AppError>;
}

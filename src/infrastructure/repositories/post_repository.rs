//! Post Repository Implementation
//!
//! PostgreSQL implementation of the PostRepository trait. Posts and comments
//! share the `posts` table; likes live in `likes`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Post, PostListing, PostRepository, User};
use crate::infrastructure::database::TransactionContext;
use crate::infrastructure::repositories::user_repository::{user_columns, UserRow};
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

const POST_COLUMNS: &str = "id, author_id, body, language, parent_id, created_at, edited_at";

/// Listing projection; filters and ordering are appended per query.
const LISTING_SELECT: &str = r#"
    SELECT p.id, p.author_id, p.body, p.language, p.parent_id, p.created_at, p.edited_at,
           u.username AS author_username,
           u.email AS author_email,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
           (SELECT COUNT(*) FROM posts c WHERE c.parent_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    author_id: i64,
    body: String,
    language: Option<String>,
    parent_id: Option<i64>,
    created_at: DateTime<Utc>,
    edited_at: Option<DateTime<Utc>>,
}

impl PostRow {
    fn into_post(self) -> Post {
        Post {
            id: self.id,
            author_id: self.author_id,
            body: self.body,
            language: self.language,
            parent_id: self.parent_id,
            created_at: self.created_at,
            edited_at: self.edited_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PostListingRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_username: String,
    author_email: String,
    like_count: i64,
    comment_count: i64,
}

impl PostListingRow {
    fn into_listing(self) -> PostListing {
        PostListing {
            post: self.post.into_post(),
            author_username: self.author_username,
            author_email: self.author_email,
            like_count: self.like_count,
            comment_count: self.comment_count,
        }
    }
}

/// PostgreSQL post repository implementation.
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run a paged listing query whose `$1` is `key`; `$2`/`$3` are limit/offset.
    async fn paged_listings(
        &self,
        filter: &str,
        key: i64,
        page: PageRequest,
    ) -> Result<Vec<PostListing>, AppError> {
        let sql = format!(
            "{LISTING_SELECT} {filter} ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, PostListingRow>(&sql)
            .bind(key)
            .bind(page.fetch_limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostListingRow::into_listing).collect())
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(PostRow::into_post))
    }

    async fn find_listing(&self, id: i64) -> Result<Option<PostListing>, AppError> {
        let sql = format!("{LISTING_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostListingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(PostListingRow::into_listing))
    }

    async fn find_listings_ordered(&self, ids: &[i64]) -> Result<Vec<PostListing>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{LISTING_SELECT} WHERE p.id = ANY($1) ORDER BY array_position($1::bigint[], p.id)"
        );
        let rows = sqlx::query_as::<_, PostListingRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostListingRow::into_listing).collect())
    }

    async fn home_feed(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Vec<PostListing>, AppError> {
        self.paged_listings(
            "WHERE p.author_id = $1 \
             OR p.author_id IN (SELECT followed_id FROM followers WHERE follower_id = $1)",
            user_id,
            page,
        )
        .await
    }

    async fn explore(&self, page: PageRequest) -> Result<Vec<PostListing>, AppError> {
        let sql =
            format!("{LISTING_SELECT} ORDER BY p.created_at DESC, p.id DESC LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, PostListingRow>(&sql)
            .bind(page.fetch_limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostListingRow::into_listing).collect())
    }

    async fn posts_by_author(
        &self,
        author_id: i64,
        page: PageRequest,
    ) -> Result<Vec<PostListing>, AppError> {
        self.paged_listings("WHERE p.author_id = $1 AND p.parent_id IS NULL", author_id, page)
            .await
    }

    async fn comments_by_author(
        &self,
        author_id: i64,
        page: PageRequest,
    ) -> Result<Vec<PostListing>, AppError> {
        self.paged_listings("WHERE p.author_id = $1 AND p.parent_id IS NOT NULL", author_id, page)
            .await
    }

    async fn liked_by(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Vec<PostListing>, AppError> {
        self.paged_listings(
            "WHERE p.id IN (SELECT post_id FROM likes WHERE user_id = $1)",
            user_id,
            page,
        )
        .await
    }

    async fn comments_of(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> Result<Vec<PostListing>, AppError> {
        self.paged_listings("WHERE p.parent_id = $1", post_id, page).await
    }

    async fn all(&self) -> Result<Vec<Post>, AppError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostRow::into_post).collect())
    }

    async fn create(&self, tx: &mut TransactionContext, post: &Post) -> Result<Post, AppError> {
        let sql = format!(
            r#"
            INSERT INTO posts (id, author_id, body, language, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {POST_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post.id)
            .bind(post.author_id)
            .bind(&post.body)
            .bind(&post.language)
            .bind(post.parent_id)
            .fetch_one(tx.conn())
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    AppError::NotFound("Parent post not found".to_string())
                }
                _ => AppError::Database(e),
            })?
            .into_post();

        tx.record_added(created.clone());
        Ok(created)
    }

    async fn update_body(
        &self,
        tx: &mut TransactionContext,
        post: &Post,
    ) -> Result<Post, AppError> {
        let sql = format!(
            r#"
            UPDATE posts
            SET body = $2,
                language = $3,
                edited_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post.id)
            .bind(&post.body)
            .bind(&post.language)
            .fetch_optional(tx.conn())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", post.id)))?
            .into_post();

        tx.record_updated(updated.clone());
        Ok(updated)
    }

    async fn delete_thread(
        &self,
        tx: &mut TransactionContext,
        id: i64,
    ) -> Result<Vec<Post>, AppError> {
        let sql = format!(
            r#"
            WITH RECURSIVE thread AS (
                SELECT id FROM posts WHERE id = $1
                UNION ALL
                SELECT p.id FROM posts p JOIN thread t ON p.parent_id = t.id
            )
            DELETE FROM posts
            WHERE id IN (SELECT id FROM thread)
            RETURNING {POST_COLUMNS}
            "#
        );
        let deleted: Vec<Post> = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_all(tx.conn())
            .await?
            .into_iter()
            .map(PostRow::into_post)
            .collect();

        if deleted.is_empty() {
            return Err(AppError::NotFound(format!("Post with id {} not found", id)));
        }

        for post in &deleted {
            tx.record_deleted(post.clone());
        }
        Ok(deleted)
    }

    async fn like(&self, user_id: i64, post_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO likes (user_id, post_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, post_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn unlike(&self, user_id: i64, post_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_liked(&self, user_id: i64, post_id: i64) -> Result<bool, AppError> {
        let liked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = $1 AND post_id = $2)",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(liked)
    }

    async fn likers(&self, post_id: i64, page: PageRequest) -> Result<Vec<User>, AppError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM users u
            JOIN likes l ON l.user_id = u.id
            WHERE l.post_id = $1
            ORDER BY u.username
            LIMIT $2 OFFSET $3
            "#,
            user_columns("u")
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(post_id)
            .bind(page.fetch_limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }
}

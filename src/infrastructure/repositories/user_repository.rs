//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait, including the
//! `followers` relation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::services::MentionTarget;
use crate::domain::{User, UserRepository};
use crate::infrastructure::database::TransactionContext;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, about_me, last_seen, last_message_read_time, created_at";

/// Database row representation of the users table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    about_me: Option<String>,
    last_seen: DateTime<Utc>,
    last_message_read_time: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert database row to domain User entity.
    pub(crate) fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            about_me: self.about_me,
            last_seen: self.last_seen,
            last_message_read_time: self.last_message_read_time,
            created_at: self.created_at,
        }
    }
}

/// Prefix user columns with a table alias, e.g. `u.id, u.username, ...`.
pub(crate) fn user_columns(alias: &str) -> String {
    USER_COLUMNS
        .split(", ")
        .map(|column| format!("{alias}.{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn map_unique_violation(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("User with this email or username already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserRow::into_user))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_one("email", email).await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn mention_targets(
        &self,
        mention_names: &[String],
    ) -> Result<Vec<MentionTarget>, AppError> {
        if mention_names.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT id, username
            FROM users
            WHERE REGEXP_REPLACE(username, '\s+', '', 'g') = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(mention_names)
        .fetch_all(&self.pool)
        .await?;

        // The SQL filter also matches single-word names with stray spaces,
        // which keep those spaces in their mention name.
        Ok(rows
            .into_iter()
            .map(|(id, username)| MentionTarget::new(id, username))
            .filter(|target| mention_names.contains(&target.mention_name))
            .collect())
    }

    async fn create(&self, tx: &mut TransactionContext, user: &User) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, about_me)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.about_me)
            .fetch_one(tx.conn())
            .await
            .map_err(map_unique_violation)?
            .into_user();

        tx.record_added(created.clone());
        Ok(created)
    }

    async fn update_profile(
        &self,
        tx: &mut TransactionContext,
        user: &User,
    ) -> Result<User, AppError> {
        let sql = format!(
            r#"
            UPDATE users
            SET username = $2,
                email = $3,
                about_me = $4
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.about_me)
            .fetch_optional(tx.conn())
            .await
            .map_err(map_unique_violation)?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user.id)))?
            .into_user();

        tx.record_updated(updated.clone());
        Ok(updated)
    }

    async fn set_last_message_read_time(
        &self,
        tx: &mut TransactionContext,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE users SET last_message_read_time = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .bind(at)
            .fetch_optional(tx.conn())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?
            .into_user();

        tx.record_updated(updated);
        Ok(())
    }

    async fn touch_last_seen(&self, user_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_seen = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn follow(&self, follower_id: i64, followed_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO followers (follower_id, followed_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, followed_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM followers WHERE follower_id = $1 AND followed_id = $2")
                .bind(follower_id)
                .bind(followed_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM followers WHERE follower_id = $1 AND followed_id = $2)",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn following(&self, user_id: i64, page: PageRequest) -> Result<Vec<User>, AppError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM users u
            JOIN followers f ON f.followed_id = u.id
            WHERE f.follower_id = $1
            ORDER BY u.username
            LIMIT $2 OFFSET $3
            "#,
            user_columns("u")
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .bind(page.fetch_limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn followers(&self, user_id: i64, page: PageRequest) -> Result<Vec<User>, AppError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM users u
            JOIN followers f ON f.follower_id = u.id
            WHERE f.followed_id = $1
            ORDER BY u.username
            LIMIT $2 OFFSET $3
            "#,
            user_columns("u")
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .bind(page.fetch_limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_columns_with_alias() {
        let columns = user_columns("u");
        assert!(columns.starts_with("u.id, u.username, u.email"));
        assert!(columns.ends_with("u.created_at"));
        assert_eq!(columns.matches("u.").count(), 8);
    }
}

//! User Service
//!
//! Profiles, the follow relation and activity tracking.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{User, UserRepository};
use crate::infrastructure::database::UnitOfWork;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, user_id: i64) -> Result<User, UserError>;

    /// Get user by username
    async fn get_user_by_username(&self, username: &str) -> Result<User, UserError>;

    /// Update user profile
    async fn update_profile(&self, user_id: i64, update: UpdateProfileDto)
        -> Result<User, UserError>;

    /// Follow `username`. Following twice is a no-op.
    async fn follow(&self, user_id: i64, username: &str) -> Result<User, UserError>;

    /// Unfollow `username`. Unfollowing twice is a no-op.
    async fn unfollow(&self, user_id: i64, username: &str) -> Result<User, UserError>;

    async fn is_following(&self, user_id: i64, other_id: i64) -> Result<bool, UserError>;

    /// Users followed by `username`
    async fn following(&self, username: &str, page: PageRequest) -> Result<Page<User>, UserError>;

    /// Users following `username`
    async fn followers(&self, username: &str, page: PageRequest) -> Result<Page<User>, UserError>;

    /// Record that the user was active just now
    async fn touch_last_seen(&self, user_id: i64) -> Result<(), UserError>;
}

/// Update profile request
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileDto {
    pub username: Option<String>,
    pub email: Option<String>,
    pub about_me: Option<String>,
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("You cannot follow yourself")]
    CannotFollowSelf,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound => AppError::NotFound("User not found".into()),
            UserError::UsernameTaken => AppError::Conflict("Username already taken".into()),
            UserError::EmailTaken => AppError::Conflict("Email already registered".into()),
            UserError::CannotFollowSelf => {
                AppError::BadRequest("You cannot follow yourself".into())
            }
            UserError::Repository(e) => e,
        }
    }
}

/// UserService implementation
pub struct UserServiceImpl<U, W>
where
    U: UserRepository,
    W: UnitOfWork,
{
    user_repo: Arc<U>,
    uow: Arc<W>,
}

impl<U, W> UserServiceImpl<U, W>
where
    U: UserRepository,
    W: UnitOfWork,
{
    pub fn new(user_repo: Arc<U>, uow: Arc<W>) -> Self {
        Self { user_repo, uow }
    }

    async fn find(&self, username: &str) -> Result<User, UserError> {
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Resolve the follow target and reject self-follows.
    async fn follow_target(&self, user_id: i64, username: &str) -> Result<User, UserError> {
        let target = self.find(username).await?;
        if target.id == user_id {
            return Err(UserError::CannotFollowSelf);
        }
        Ok(target)
    }
}

#[async_trait]
impl<U, W> UserService for UserServiceImpl<U, W>
where
    U: UserRepository + 'static,
    W: UnitOfWork + 'static,
{
    async fn get_user(&self, user_id: i64) -> Result<User, UserError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, UserError> {
        self.find(username).await
    }

    async fn update_profile(
        &self,
        user_id: i64,
        update: UpdateProfileDto,
    ) -> Result<User, UserError> {
        let mut user = self.get_user(user_id).await?;

        if let Some(username) = update.username {
            if username != user.username {
                if self.user_repo.username_exists(&username).await? {
                    return Err(UserError::UsernameTaken);
                }
                user.username = username;
            }
        }

        if let Some(email) = update.email {
            if email != user.email {
                if self.user_repo.email_exists(&email).await? {
                    return Err(UserError::EmailTaken);
                }
                user.email = email;
            }
        }

        if let Some(about_me) = update.about_me {
            user.about_me = Some(about_me).filter(|s| !s.trim().is_empty());
        }

        let mut tx = self.uow.begin().await?;
        let updated = self.user_repo.update_profile(&mut tx, &user).await?;
        self.uow.commit(tx).await?;

        Ok(updated)
    }

    async fn follow(&self, user_id: i64, username: &str) -> Result<User, UserError> {
        let target = self.follow_target(user_id, username).await?;
        if self.user_repo.follow(user_id, target.id).await? {
            tracing::debug!(follower = user_id, followed = target.id, "Followed user");
        }
        Ok(target)
    }

    async fn unfollow(&self, user_id: i64, username: &str) -> Result<User, UserError> {
        let target = self.follow_target(user_id, username).await?;
        if self.user_repo.unfollow(user_id, target.id).await? {
            tracing::debug!(follower = user_id, followed = target.id, "Unfollowed user");
        }
        Ok(target)
    }

    async fn is_following(&self, user_id: i64, other_id: i64) -> Result<bool, UserError> {
        Ok(self.user_repo.is_following(user_id, other_id).await?)
    }

    async fn following(&self, username: &str, page: PageRequest) -> Result<Page<User>, UserError> {
        let user = self.find(username).await?;
        let rows = self.user_repo.following(user.id, page).await?;
        Ok(Page::from_overfetch(rows, page))
    }

    async fn followers(&self, username: &str, page: PageRequest) -> Result<Page<User>, UserError> {
        let user = self.find(username).await?;
        let rows = self.user_repo.followers(user.id, page).await?;
        Ok(Page::from_overfetch(rows, page))
    }

    async fn touch_last_seen(&self, user_id: i64) -> Result<(), UserError> {
        Ok(self.user_repo.touch_last_seen(user_id).await?)
    }
}

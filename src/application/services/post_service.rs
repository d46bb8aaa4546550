//! Post Service
//!
//! Posts, comment threads, likes and the listings built from them. Every
//! listed post comes back with its body split into text and mention segments.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::services::{
    mention_candidates, parse_mentions, MentionDirectory, MentionError, ParsedBody,
};
use crate::domain::{Post, PostListing, PostRepository, User, UserRepository, MAX_POST_LENGTH};
use crate::infrastructure::database::UnitOfWork;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};
use crate::shared::snowflake::SnowflakeGenerator;

/// Post service trait
#[async_trait]
pub trait PostService: Send + Sync {
    async fn create_post(
        &self,
        author_id: i64,
        input: CreatePostDto,
    ) -> Result<PostView, PostError>;

    /// Reply to `parent_id`, which must exist.
    async fn create_comment(
        &self,
        author_id: i64,
        parent_id: i64,
        input: CreatePostDto,
    ) -> Result<PostView, PostError>;

    /// Replace the body of a post. Only its author may edit it.
    async fn edit_post(
        &self,
        user_id: i64,
        post_id: i64,
        input: CreatePostDto,
    ) -> Result<PostView, PostError>;

    /// Delete a post and its whole comment thread. Only its author may delete
    /// it. Returns the number of deleted posts.
    async fn delete_post(&self, user_id: i64, post_id: i64) -> Result<usize, PostError>;

    async fn get_post(&self, post_id: i64) -> Result<PostView, PostError>;

    /// Own posts and posts of followed users
    async fn home_feed(&self, user_id: i64, page: PageRequest) -> Result<Page<PostView>, PostError>;

    /// Every post
    async fn explore(&self, page: PageRequest) -> Result<Page<PostView>, PostError>;

    /// Top-level posts of `username`
    async fn user_posts(&self, username: &str, page: PageRequest)
        -> Result<Page<PostView>, PostError>;

    /// Comments written by `username`
    async fn user_comments(
        &self,
        username: &str,
        page: PageRequest,
    ) -> Result<Page<PostView>, PostError>;

    /// Posts liked by `username`
    async fn liked_posts(&self, username: &str, page: PageRequest)
        -> Result<Page<PostView>, PostError>;

    /// Direct comments on a post
    async fn comments(&self, post_id: i64, page: PageRequest) -> Result<Page<PostView>, PostError>;

    /// Like a post. Liking twice is a no-op.
    async fn like(&self, user_id: i64, post_id: i64) -> Result<(), PostError>;

    /// Remove a like. Unliking twice is a no-op.
    async fn unlike(&self, user_id: i64, post_id: i64) -> Result<(), PostError>;

    /// Users who liked a post
    async fn likers(&self, post_id: i64, page: PageRequest) -> Result<Page<User>, PostError>;
}

/// Post or comment input
#[derive(Debug, Clone)]
pub struct CreatePostDto {
    pub body: String,
    pub language: Option<String>,
}

/// A listed post with its rendered body.
#[derive(Debug, Clone)]
pub struct PostView {
    pub listing: PostListing,
    pub body: ParsedBody,
}

/// Post service errors
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("Post not found")]
    NotFound,

    #[error("Parent post not found")]
    ParentNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Only the author can change this post")]
    NotAuthor,

    #[error("Post body is empty")]
    EmptyBody,

    #[error("Post body exceeds 140 characters")]
    BodyTooLong,

    #[error(transparent)]
    Mention(#[from] MentionError),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<PostError> for AppError {
    fn from(e: PostError) -> Self {
        match e {
            PostError::NotFound => AppError::NotFound("Post not found".into()),
            PostError::ParentNotFound => AppError::NotFound("Parent post not found".into()),
            PostError::UserNotFound => AppError::NotFound("User not found".into()),
            PostError::NotAuthor => {
                AppError::Forbidden("Only the author can change this post".into())
            }
            e @ (PostError::EmptyBody | PostError::BodyTooLong) => {
                AppError::Validation(e.to_string())
            }
            PostError::Mention(e) => AppError::Internal(e.to_string()),
            PostError::Repository(e) => e,
        }
    }
}

/// Render listing bodies, resolving only the names the bodies mention.
pub async fn render_listings<U>(
    user_repo: &U,
    listings: Vec<PostListing>,
) -> Result<Vec<PostView>, PostError>
where
    U: UserRepository + ?Sized,
{
    let mut names: Vec<String> = listings
        .iter()
        .flat_map(|listing| mention_candidates(&listing.post.body))
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();

    let directory = MentionDirectory::new(user_repo.mention_targets(&names).await?);

    listings
        .into_iter()
        .map(|listing| {
            let body = parse_mentions(&listing.post.body, &directory)?;
            Ok(PostView { listing, body })
        })
        .collect()
}

fn validate_body(body: &str) -> Result<(), PostError> {
    if body.trim().is_empty() {
        return Err(PostError::EmptyBody);
    }
    if body.chars().count() > MAX_POST_LENGTH {
        return Err(PostError::BodyTooLong);
    }
    Ok(())
}

/// PostService implementation
pub struct PostServiceImpl<P, U, W>
where
    P: PostRepository,
    U: UserRepository,
    W: UnitOfWork,
{
    post_repo: Arc<P>,
    user_repo: Arc<U>,
    uow: Arc<W>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<P, U, W> PostServiceImpl<P, U, W>
where
    P: PostRepository,
    U: UserRepository,
    W: UnitOfWork,
{
    pub fn new(
        post_repo: Arc<P>,
        user_repo: Arc<U>,
        uow: Arc<W>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            uow,
            id_generator,
        }
    }

    async fn render_page(
        &self,
        rows: Vec<PostListing>,
        page: PageRequest,
    ) -> Result<Page<PostView>, PostError> {
        let page = Page::from_overfetch(rows, page);
        let views = render_listings(self.user_repo.as_ref(), page.items).await?;
        Ok(Page {
            items: views,
            page: page.page,
            next_page: page.next_page,
            prev_page: page.prev_page,
        })
    }

    async fn view(&self, post_id: i64) -> Result<PostView, PostError> {
        let listing = self
            .post_repo
            .find_listing(post_id)
            .await?
            .ok_or(PostError::NotFound)?;

        render_listings(self.user_repo.as_ref(), vec![listing])
            .await?
            .pop()
            .ok_or(PostError::NotFound)
    }

    async fn author_id(&self, username: &str) -> Result<i64, PostError> {
        self.user_repo
            .find_by_username(username)
            .await?
            .map(|user| user.id)
            .ok_or(PostError::UserNotFound)
    }

    async fn owned_post(&self, user_id: i64, post_id: i64) -> Result<Post, PostError> {
        let post = self
            .post_repo
            .find_by_id(post_id)
            .await?
            .ok_or(PostError::NotFound)?;

        if post.author_id != user_id {
            return Err(PostError::NotAuthor);
        }
        Ok(post)
    }

    async fn insert(
        &self,
        author_id: i64,
        parent_id: Option<i64>,
        input: CreatePostDto,
    ) -> Result<PostView, PostError> {
        validate_body(&input.body)?;

        let post = Post {
            id: self.id_generator.generate(),
            author_id,
            body: input.body,
            language: input.language,
            parent_id,
            ..Post::default()
        };

        let mut tx = self.uow.begin().await?;
        let created = self.post_repo.create(&mut tx, &post).await?;
        self.uow.commit(tx).await?;

        tracing::info!(post_id = created.id, author_id, ?parent_id, "Post created");
        self.view(created.id).await
    }
}

#[async_trait]
impl<P, U, W> PostService for PostServiceImpl<P, U, W>
where
    P: PostRepository + 'static,
    U: UserRepository + 'static,
    W: UnitOfWork + 'static,
{
    async fn create_post(
        &self,
        author_id: i64,
        input: CreatePostDto,
    ) -> Result<PostView, PostError> {
        self.insert(author_id, None, input).await
    }

    async fn create_comment(
        &self,
        author_id: i64,
        parent_id: i64,
        input: CreatePostDto,
    ) -> Result<PostView, PostError> {
        validate_body(&input.body)?;
        if self.post_repo.find_by_id(parent_id).await?.is_none() {
            return Err(PostError::ParentNotFound);
        }
        self.insert(author_id, Some(parent_id), input).await
    }

    async fn edit_post(
        &self,
        user_id: i64,
        post_id: i64,
        input: CreatePostDto,
    ) -> Result<PostView, PostError> {
        validate_body(&input.body)?;
        let mut post = self.owned_post(user_id, post_id).await?;
        post.body = input.body;
        post.language = input.language;

        let mut tx = self.uow.begin().await?;
        self.post_repo.update_body(&mut tx, &post).await?;
        self.uow.commit(tx).await?;

        self.view(post_id).await
    }

    async fn delete_post(&self, user_id: i64, post_id: i64) -> Result<usize, PostError> {
        self.owned_post(user_id, post_id).await?;

        let mut tx = self.uow.begin().await?;
        let deleted = self.post_repo.delete_thread(&mut tx, post_id).await?;
        self.uow.commit(tx).await?;

        tracing::info!(post_id, deleted = deleted.len(), "Post thread deleted");
        Ok(deleted.len())
    }

    async fn get_post(&self, post_id: i64) -> Result<PostView, PostError> {
        self.view(post_id).await
    }

    async fn home_feed(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<PostView>, PostError> {
        let rows = self.post_repo.home_feed(user_id, page).await?;
        self.render_page(rows, page).await
    }

    async fn explore(&self, page: PageRequest) -> Result<Page<PostView>, PostError> {
        let rows = self.post_repo.explore(page).await?;
        self.render_page(rows, page).await
    }

    async fn user_posts(
        &self,
        username: &str,
        page: PageRequest,
    ) -> Result<Page<PostView>, PostError> {
        let author_id = self.author_id(username).await?;
        let rows = self.post_repo.posts_by_author(author_id, page).await?;
        self.render_page(rows, page).await
    }

    async fn user_comments(
        &self,
        username: &str,
        page: PageRequest,
    ) -> Result<Page<PostView>, PostError> {
        let author_id = self.author_id(username).await?;
        let rows = self.post_repo.comments_by_author(author_id, page).await?;
        self.render_page(rows, page).await
    }

    async fn liked_posts(
        &self,
        username: &str,
        page: PageRequest,
    ) -> Result<Page<PostView>, PostError> {
        let user_id = self.author_id(username).await?;
        let rows = self.post_repo.liked_by(user_id, page).await?;
        self.render_page(rows, page).await
    }

    async fn comments(&self, post_id: i64, page: PageRequest) -> Result<Page<PostView>, PostError> {
        if self.post_repo.find_by_id(post_id).await?.is_none() {
            return Err(PostError::NotFound);
        }
        let rows = self.post_repo.comments_of(post_id, page).await?;
        self.render_page(rows, page).await
    }

    async fn like(&self, user_id: i64, post_id: i64) -> Result<(), PostError> {
        if self.post_repo.find_by_id(post_id).await?.is_none() {
            return Err(PostError::NotFound);
        }
        if self.post_repo.like(user_id, post_id).await? {
            tracing::debug!(user_id, post_id, "Post liked");
        }
        Ok(())
    }

    async fn unlike(&self, user_id: i64, post_id: i64) -> Result<(), PostError> {
        if self.post_repo.find_by_id(post_id).await?.is_none() {
            return Err(PostError::NotFound);
        }
        if self.post_repo.unlike(user_id, post_id).await? {
            tracing::debug!(user_id, post_id, "Post unliked");
        }
        Ok(())
    }

    async fn likers(&self, post_id: i64, page: PageRequest) -> Result<Page<User>, PostError> {
        if self.post_repo.find_by_id(post_id).await?.is_none() {
            return Err(PostError::NotFound);
        }
        let rows = self.post_repo.likers(post_id, page).await?;
        Ok(Page::from_overfetch(rows, page))
    }
}

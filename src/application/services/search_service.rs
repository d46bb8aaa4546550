//! Search Service
//!
//! Full-text post search backed by the search index, plus index rebuilds.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::services::post_service::{render_listings, PostError, PostView};
use crate::domain::{Post, PostRepository, Searchable, UserRepository};
use crate::infrastructure::search::IndexSynchronizer;
use crate::shared::pagination::{Page, PageRequest};

#[async_trait]
pub trait SearchService: Send + Sync {
    /// Posts matching `expression`, in index relevance order.
    async fn search_posts(
        &self,
        expression: &str,
        page: PageRequest,
    ) -> Result<Page<PostView>, PostError>;

    /// Push every stored post into the index. Returns how many were indexed.
    async fn reindex(&self) -> Result<usize, PostError>;
}

pub struct SearchServiceImpl<P, U>
where
    P: PostRepository,
    U: UserRepository,
{
    post_repo: Arc<P>,
    user_repo: Arc<U>,
    synchronizer: Arc<IndexSynchronizer>,
}

impl<P, U> SearchServiceImpl<P, U>
where
    P: PostRepository,
    U: UserRepository,
{
    pub fn new(post_repo: Arc<P>, user_repo: Arc<U>, synchronizer: Arc<IndexSynchronizer>) -> Self {
        Self {
            post_repo,
            user_repo,
            synchronizer,
        }
    }
}

#[async_trait]
impl<P, U> SearchService for SearchServiceImpl<P, U>
where
    P: PostRepository + 'static,
    U: UserRepository + 'static,
{
    async fn search_posts(
        &self,
        expression: &str,
        page: PageRequest,
    ) -> Result<Page<PostView>, PostError> {
        let hits = self.synchronizer.query(
            Post::COLLECTION,
            expression,
            page.page as usize,
            page.per_page as usize,
        );
        tracing::debug!(expression, total = hits.total, page = page.page, "Search executed");

        if hits.ids.is_empty() {
            return Ok(Page::from_total(Vec::new(), page, hits.total));
        }

        let listings = self.post_repo.find_listings_ordered(&hits.ids).await?;
        let views = render_listings(self.user_repo.as_ref(), listings).await?;
        Ok(Page::from_total(views, page, hits.total))
    }

    async fn reindex(&self) -> Result<usize, PostError> {
        let posts = self.post_repo.all().await?;
        Ok(self.synchronizer.reindex(&posts))
    }
}

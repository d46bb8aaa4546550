//! Application Startup
//!
//! Application building, shared state and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::{
    AuthServiceImpl, MessageServiceImpl, NotificationServiceImpl, PostServiceImpl,
    SearchService, SearchServiceImpl, UserServiceImpl,
};
use crate::config::Settings;
use crate::domain::SearchIndex;
use crate::infrastructure::database::{self, PgUnitOfWork};
use crate::infrastructure::repositories::{
    PgMessageRepository, PgNotificationRepository, PgPostRepository, PgUserRepository,
};
use crate::infrastructure::search::{self, IndexSynchronizer};
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging};
use crate::shared::pagination::PageRequest;
use crate::shared::snowflake::SnowflakeGenerator;

pub type PgAuthService = AuthServiceImpl<PgUserRepository, PgUnitOfWork>;
pub type PgUserService = UserServiceImpl<PgUserRepository, PgUnitOfWork>;
pub type PgPostService = PostServiceImpl<PgPostRepository, PgUserRepository, PgUnitOfWork>;
pub type PgMessageService = MessageServiceImpl<
    PgMessageRepository,
    PgNotificationRepository,
    PgUserRepository,
    PgUnitOfWork,
>;
pub type PgNotificationService = NotificationServiceImpl<PgNotificationRepository, PgUnitOfWork>;
pub type PgSearchService = SearchServiceImpl<PgPostRepository, PgUserRepository>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub synchronizer: Arc<IndexSynchronizer>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: PgPool, index: Arc<dyn SearchIndex>, settings: Settings) -> Self {
        let snowflake = Arc::new(SnowflakeGenerator::new(
            u64::from(settings.snowflake.machine_id),
            settings.snowflake.epoch,
        ));

        Self {
            db,
            snowflake,
            synchronizer: Arc::new(IndexSynchronizer::new(index)),
            settings: Arc::new(settings),
        }
    }

    /// Page request sized by `pagination.posts_per_page`.
    pub fn page(&self, page: Option<i64>) -> PageRequest {
        PageRequest::new(page, self.settings.pagination.posts_per_page)
    }

    fn uow(&self) -> Arc<PgUnitOfWork> {
        Arc::new(PgUnitOfWork::new(self.db.clone(), self.synchronizer.clone()))
    }

    fn user_repo(&self) -> Arc<PgUserRepository> {
        Arc::new(PgUserRepository::new(self.db.clone()))
    }

    fn post_repo(&self) -> Arc<PgPostRepository> {
        Arc::new(PgPostRepository::new(self.db.clone()))
    }

    fn notification_repo(&self) -> Arc<PgNotificationRepository> {
        Arc::new(PgNotificationRepository::new(self.db.clone()))
    }

    pub fn auth_service(&self) -> PgAuthService {
        AuthServiceImpl::new(
            self.user_repo(),
            self.uow(),
            self.snowflake.clone(),
            self.settings.jwt.clone(),
        )
    }

    pub fn user_service(&self) -> PgUserService {
        UserServiceImpl::new(self.user_repo(), self.uow())
    }

    pub fn post_service(&self) -> PgPostService {
        PostServiceImpl::new(
            self.post_repo(),
            self.user_repo(),
            self.uow(),
            self.snowflake.clone(),
        )
    }

    pub fn message_service(&self) -> PgMessageService {
        MessageServiceImpl::new(
            Arc::new(PgMessageRepository::new(self.db.clone())),
            self.notification_repo(),
            self.user_repo(),
            self.uow(),
            self.snowflake.clone(),
        )
    }

    pub fn notification_service(&self) -> PgNotificationService {
        NotificationServiceImpl::new(self.notification_repo(), self.uow(), self.snowflake.clone())
    }

    pub fn search_service(&self) -> PgSearchService {
        SearchServiceImpl::new(self.post_repo(), self.user_repo(), self.synchronizer.clone())
    }
}

/// Router with every middleware layer applied.
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);
    logging::add_tracing(routes::create_router(state)).layer(cors)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db).await?;
            tracing::info!("Database migrations applied");
        }

        let index = search::build_search_index(&settings.search)?;
        tracing::info!(
            path = settings.search.index_path.as_deref().unwrap_or("<memory>"),
            "Search index opened"
        );

        let reindex = settings.search.reindex_on_startup;
        let addr: SocketAddr = settings.server_addr().parse()?;
        let state = AppState::new(db, index, settings);

        if reindex {
            let indexed = state.search_service().reindex().await?;
            tracing::info!(indexed, "Search index rebuilt from database");
        }

        let router = build_router(state);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

//! Database Module
//!
//! PostgreSQL connection pool, migrations, and transaction management.

pub mod unit_of_work;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseSettings;

pub use unit_of_work::{PgUnitOfWork, TransactionContext, TransactionHandle, UnitOfWork};

/// Create a PostgreSQL connection pool
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    pool_options(settings).connect(&settings.url).await
}

/// Create a pool that connects on first use
pub fn create_lazy_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    pool_options(settings).connect_lazy(&settings.url)
}

fn pool_options(settings: &DatabaseSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout))
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

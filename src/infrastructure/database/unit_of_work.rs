//! Unit of Work Pattern Implementation
//!
//! Provides transactional boundaries for database operations and the commit
//! lifecycle that keeps the search index in step with the database.
//!
//! Repositories record every tracked write on the [`TransactionContext`].
//! Committing runs three phases:
//!
//! 1. before commit: the recorded [`ChangeSet`] is turned into pending index
//!    changes (no index I/O),
//! 2. the database commit itself,
//! 3. after commit: the pending changes are applied to the index, only if
//!    step 2 succeeded.
//!
//! The pending changes are a value moved from phase 1 to phase 3, so a failed
//! commit or a rollback simply drops them.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::domain::search::{ChangeSet, TrackedRecord};
use crate::infrastructure::search::IndexSynchronizer;
use crate::shared::error::AppError;

/// A database transaction that can be finished.
#[async_trait]
pub trait TransactionHandle: Send + Sized {
    async fn commit(self) -> Result<(), AppError>;

    async fn rollback(self) -> Result<(), AppError>;
}

#[async_trait]
impl TransactionHandle for Transaction<'static, Postgres> {
    async fn commit(self) -> Result<(), AppError> {
        Transaction::commit(self).await.map_err(AppError::Database)
    }

    async fn rollback(self) -> Result<(), AppError> {
        Transaction::rollback(self).await.map_err(AppError::Database)
    }
}

/// An open transaction plus the writes tracked in it.
pub struct TransactionContext<T = Transaction<'static, Postgres>> {
    tx: T,
    changes: ChangeSet,
}

impl<T: TransactionHandle> TransactionContext<T> {
    pub fn new(tx: T) -> Self {
        Self {
            tx,
            changes: ChangeSet::default(),
        }
    }

    /// The underlying transaction.
    pub fn handle(&mut self) -> &mut T {
        &mut self.tx
    }

    pub fn record_added(&mut self, record: impl Into<TrackedRecord>) {
        self.changes.added.push(record.into());
    }

    pub fn record_updated(&mut self, record: impl Into<TrackedRecord>) {
        self.changes.updated.push(record.into());
    }

    pub fn record_deleted(&mut self, record: impl Into<TrackedRecord>) {
        self.changes.deleted.push(record.into());
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Commit and, on success, forward tracked searchable writes to the index.
    ///
    /// Index failures are logged by the synchronizer and never undo the
    /// database commit.
    pub async fn commit(self, synchronizer: &IndexSynchronizer) -> Result<(), AppError> {
        let Self { tx, changes } = self;
        let pending = IndexSynchronizer::before_commit(changes);

        if let Err(e) = tx.commit().await {
            tracing::warn!(
                upserts = pending.upserts().len(),
                removals = pending.removals().len(),
                "Commit failed, discarding pending index changes"
            );
            return Err(e);
        }

        synchronizer.after_commit(pending);
        Ok(())
    }

    /// Roll back; tracked changes are discarded.
    pub async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await
    }
}

impl TransactionContext {
    /// Connection to run queries on inside this transaction.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

/// Unit of Work trait for managing database transactions.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Begin a new transaction.
    async fn begin(&self) -> Result<TransactionContext, AppError>;

    /// Commit the transaction and run the index hooks.
    async fn commit(&self, tx: TransactionContext) -> Result<(), AppError>;
}

/// PostgreSQL Unit of Work implementation.
#[derive(Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
    synchronizer: Arc<IndexSynchronizer>,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool, synchronizer: Arc<IndexSynchronizer>) -> Self {
        Self { pool, synchronizer }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn begin(&self) -> Result<TransactionContext, AppError> {
        let tx = self.pool.begin().await.map_err(AppError::Database)?;
        Ok(TransactionContext::new(tx))
    }

    async fn commit(&self, tx: TransactionContext) -> Result<(), AppError> {
        tx.commit(&self.synchronizer).await
    }
}

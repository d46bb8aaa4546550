//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database pool, migrations and the unit of work (PostgreSQL)
//! - Repositories
//! - The full-text search index and its synchronizer (Tantivy)
//! - Prometheus metrics

pub mod database;
pub mod metrics;
pub mod repositories;
pub mod search;

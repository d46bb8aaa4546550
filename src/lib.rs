//! # Microblog Library
//!
//! A small social network: users post short messages, follow each other,
//! comment, like and exchange private messages. Post bodies are rendered with
//! `@mention` segments, and posts are searchable through a Tantivy full-text
//! index that follows committed database writes.
//!
//! ## Architecture
//!
//! - **Domain Layer**: Entities, repository traits, mention parsing, search contracts
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: PostgreSQL repositories, unit of work, search index, metrics
//! - **Presentation Layer**: axum handlers and middleware
//!
//! ## Module Structure
//!
//! ```text
//! microblog/
//! +-- config/         Configuration management
//! +-- domain/         Entities, mention parser, search contracts
//! +-- application/    Services and DTOs
//! +-- infrastructure/ Database, repositories, search index, metrics
//! +-- presentation/   HTTP routes, handlers, middleware
//! +-- shared/         Errors, pagination, snowflake IDs, validation
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;
pub mod startup;
pub mod telemetry;

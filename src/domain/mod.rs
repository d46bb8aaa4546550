//! # Domain Layer
//!
//! The domain layer contains the core business logic of the microblog.
//!
//! ## Structure
//!
//! - **entities**: Core domain entities (User, Post, Message, Notification)
//! - **services**: Pure domain logic (mention parsing)
//! - **search**: Searchable records, change tracking and the search index contract
//!
//! ## Design Principles
//!
//! - Pure business logic and domain rules
//! - Repository traits define data access contracts
//! - Entities encapsulate domain behavior

pub mod entities;
pub mod search;
pub mod services;

// Re-export commonly used types
pub use entities::*;
pub use search::*;

//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod auth;
pub mod health;
pub mod message;
pub mod notification;
pub mod post;
pub mod search;
pub mod user;

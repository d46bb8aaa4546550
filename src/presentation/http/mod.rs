//! HTTP API
//!
//! REST handlers under `/api/v1` plus health and metrics endpoints.

pub mod handlers;
pub mod routes;

//! HTTP API layer for hearth.
//!
//! This crate provides the REST surface:
//!
//! - **Endpoints**: auth, posts (with events/activities), comments,
//!   reactions, interaction history and the admin surface
//! - **Extractors**: authentication and client origin metadata
//! - **Middleware**: bearer-token resolution into request extensions
//!
//! Built on Axum 0.8 with a Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};

//! API endpoints.

mod admin;
mod auth;
mod comments;
mod history;
mod posts;
mod reactions;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest(
            "/posts",
            posts::router()
                .merge(comments::router())
                .merge(reactions::router()),
        )
        .nest("/history", history::router())
        .nest("/admin", admin::router())
}

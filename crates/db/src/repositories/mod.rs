//! Repository layer.
//!
//! Each repository wraps the shared [`sea_orm::DatabaseConnection`] and
//! exposes the queries one entity needs. Services compose repositories;
//! no SQL leaks above this layer.

pub mod comment;
pub mod interaction;
pub mod post;
pub mod reaction;
pub mod user;

pub use comment::CommentRepository;
pub use interaction::{InteractionFilter, InteractionRepository, InteractionTypeCount};
pub use post::{PostFilter, PostRepository};
pub use reaction::ReactionRepository;
pub use user::{UserFilter, UserRepository};

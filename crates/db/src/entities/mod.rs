//! Database entities.

pub mod comment;
pub mod interaction;
pub mod post;
pub mod reaction;
pub mod user;

pub use comment::Entity as Comment;
pub use interaction::Entity as Interaction;
pub use post::Entity as Post;
pub use reaction::Entity as Reaction;
pub use user::Entity as User;

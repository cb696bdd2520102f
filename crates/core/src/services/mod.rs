//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod interaction;
pub mod post;
pub mod reaction;
pub mod user;

pub use comment::{CommentAuthor, CommentService, CommentView, CreateCommentInput};
pub use interaction::{ActivityStats, InteractionService, RecordInteraction};
pub use post::{
    CreatePostInput, PostService, PostStats, UpdatePostInput,
};
pub use reaction::{ReactionCounts, ReactionOutcome, ReactionResult, ReactionService};
pub use user::{
    AdminUpdateUserInput, ChangePasswordInput, LoginInput, RegisterInput, UpdateProfileInput,
    UserService, UserStats,
};

/// Maximum page size accepted by listing operations.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Whether a piece of content exists at all from this viewer's side.
///
/// Non-published content is only acknowledged to its author and to
/// admins; everyone else gets a not-found on any surface that touches
/// it, so a draft's id cannot be probed through comments or reactions.
pub(crate) fn visible_to(
    post: &hearth_db::entities::post::Model,
    viewer: Option<&hearth_db::entities::user::Model>,
) -> bool {
    post.is_published() || viewer.is_some_and(|u| u.id == post.author_id || u.is_admin())
}

/// Clamp raw page/limit query values and turn them into an offset.
///
/// Pages are 1-based; anything below 1 is treated as the first page.
#[must_use]
pub fn page_window(page: u64, limit: u64) -> (u64, u64) {
    let page = page.max(1);
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    (limit, (page - 1) * limit)
}

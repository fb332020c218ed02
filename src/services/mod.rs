pub mod comments;
pub mod feed;
pub mod moderation;
pub mod slug;

pub use comments::CommentService;
pub use feed::{CreatedPost, FeedCursor, FeedService, MediaUpload};

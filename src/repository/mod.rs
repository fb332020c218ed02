pub mod clubs;
pub mod comment_likes;
pub mod comments;
pub mod members;
pub mod post_likes;
pub mod posts;
pub mod traits;

pub use clubs::ClubRepository;
pub use comment_likes::CommentLikeRepository;
pub use comments::CommentRepository;
pub use members::MemberRepository;
pub use post_likes::PostLikeRepository;
pub use posts::PostRepository;
pub use traits::{ClubStore, CommentLikeLedger, CommentStore, MemberStore, PostLikeLedger, PostStore};

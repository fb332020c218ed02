pub mod models;
pub mod views;

pub use models::{Actor, Club, Comment, Member, Post, PostType, Role};
pub use views::{AuthorView, CommentView, PostView};

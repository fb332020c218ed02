use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Board post kind. `News` is readable by anyone; `Post` is gated on club
/// membership for read, like and comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostType {
    Post,
    News,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Post => "Post",
            PostType::News => "News",
        }
    }

    /// Whether reading/liking/commenting requires club membership.
    pub fn requires_membership(&self) -> bool {
        matches!(self, PostType::Post)
    }
}

impl std::str::FromStr for PostType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Post" => Ok(PostType::Post),
            "News" => Ok(PostType::News),
            other => Err(AppError::Validation(format!("unknown post type: {}", other))),
        }
    }
}

/// Actor role as resolved by the upstream identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Student" => Ok(Role::Student),
            "Faculty" => Ok(Role::Faculty),
            "Admin" => Ok(Role::Admin),
            other => Err(AppError::Unauthorized(format!("unknown role: {}", other))),
        }
    }
}

/// Pre-validated identity context attached to every request by the
/// upstream gateway. The service trusts it as already verified.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub member_id: Option<Uuid>,
    pub role: Role,
    pub club_id: Option<Uuid>,
}

/// Post entity - one board post inside a club
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub club_id: Uuid,
    pub author_id: Uuid,
    pub slug: String,
    pub post_type: String,
    pub title: String,
    pub body: Option<String>,
    pub flair_id: Option<Uuid>,
    pub media_refs: Vec<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn kind(&self) -> PostType {
        // post_type is CHECK-constrained to the two known values
        if self.post_type == "News" {
            PostType::News
        } else {
            PostType::Post
        }
    }
}

/// Comment entity - a node in a post's reply tree. The tree is an
/// adjacency list over `parent_comment_id`; a comment is top-level iff it
/// has no parent.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub club_id: Uuid,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub is_top_level: bool,
    pub body: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Club entity - only the fields the board needs (moderator list for the
/// deletion predicate)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Club {
    pub id: Uuid,
    pub name: String,
    pub moderators: Vec<Uuid>,
}

/// Member entity - a user's membership in one club
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: Uuid,
    pub club_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn post_type_membership_gate() {
        assert!(PostType::Post.requires_membership());
        assert!(!PostType::News.requires_membership());
    }

    #[test]
    fn post_type_round_trips() {
        assert_eq!(PostType::from_str("News").unwrap(), PostType::News);
        assert_eq!(PostType::from_str("Post").unwrap(), PostType::Post);
        assert!(PostType::from_str("Rumor").is_err());
    }
}

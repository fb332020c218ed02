/// Response projections. Handlers and services answer with these shapes,
/// never with raw storage rows - embedded like sets in particular stay
/// server-side and are reduced to a count plus a per-actor flag.
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{Comment, Member, Post};

/// Number of reply levels eagerly expanded below each returned comment.
pub const REPLY_TREE_DEPTH: usize = 3;

/// Feed / full-post projection of a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub author: Uuid,
    pub club: Uuid,
    pub slug: String,
    pub title: String,
    pub body: Option<String>,
    #[serde(rename = "type")]
    pub post_type: String,
    pub flair: Option<Uuid>,
    pub media_urls: Vec<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub posted_on: DateTime<Utc>,
    pub is_liked: bool,
    pub is_deleted: bool,
}

/// Comment author identity carried by every node of the reply tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorView {
    pub member_id: Uuid,
    pub username: String,
}

/// One node of the reply tree, expanded to [`REPLY_TREE_DEPTH`] levels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub club: Uuid,
    pub author: Option<AuthorView>,
    pub post: Uuid,
    pub body: String,
    pub is_top_level: bool,
    pub is_deleted: bool,
    pub like_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<CommentView>,
}

/// Project a post row for a given viewer.
pub fn project_post(
    post: &Post,
    comment_count: i64,
    like_count: i64,
    is_liked: bool,
    media_base_url: &str,
) -> PostView {
    PostView {
        id: post.id,
        author: post.author_id,
        club: post.club_id,
        slug: post.slug.clone(),
        title: post.title.clone(),
        body: post.body.clone(),
        post_type: post.post_type.clone(),
        flair: post.flair_id,
        media_urls: post
            .media_refs
            .iter()
            .map(|r| format!("{}/{}", media_base_url.trim_end_matches('/'), r))
            .collect(),
        like_count,
        comment_count,
        posted_on: post.created_at,
        is_liked,
        is_deleted: post.is_deleted,
    }
}

/// Per-comment decoration needed to project a reply tree.
#[derive(Debug, Default)]
pub struct CommentDecorations {
    /// member_id -> author identity
    pub authors: HashMap<Uuid, AuthorView>,
    /// comment_id -> like count (absent means zero)
    pub like_counts: HashMap<Uuid, i64>,
    /// comment ids liked by the viewing actor
    pub liked_by_actor: HashSet<Uuid>,
}

impl CommentDecorations {
    pub fn author_of(&self, comment: &Comment) -> Option<AuthorView> {
        self.authors.get(&comment.author_id).cloned()
    }

    pub fn from_members(members: Vec<Member>) -> Self {
        let authors = members
            .into_iter()
            .map(|m| {
                (
                    m.id,
                    AuthorView {
                        member_id: m.id,
                        username: m.username,
                    },
                )
            })
            .collect();
        Self {
            authors,
            ..Default::default()
        }
    }
}

/// Assemble a reply tree from flat comment rows.
///
/// `roots` are the comments to return (a page of top-level comments, or
/// the direct replies of an expansion parent); `descendants` hold every
/// deeper row fetched by the bounded breadth-first expansion. Children
/// attach to their parent in the given row order (the stores return
/// replies in insertion order) and expansion stops `depth` levels below
/// a root - [`REPLY_TREE_DEPTH`] for top-level roots, one less when the
/// roots are themselves replies of an expansion parent. Soft-deleted
/// comments stay in the tree as flagged placeholders with the body
/// suppressed.
pub fn build_comment_tree(
    roots: Vec<Comment>,
    descendants: Vec<Comment>,
    decorations: &CommentDecorations,
    depth: usize,
) -> Vec<CommentView> {
    let mut children: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for comment in descendants {
        if let Some(parent) = comment.parent_comment_id {
            children.entry(parent).or_default().push(comment);
        }
    }

    roots
        .into_iter()
        .map(|root| project_node(root, &mut children, decorations, depth))
        .collect()
}

fn project_node(
    comment: Comment,
    children: &mut HashMap<Uuid, Vec<Comment>>,
    decorations: &CommentDecorations,
    remaining_depth: usize,
) -> CommentView {
    let replies = if remaining_depth == 0 {
        Vec::new()
    } else {
        children
            .remove(&comment.id)
            .unwrap_or_default()
            .into_iter()
            .map(|child| project_node(child, children, decorations, remaining_depth - 1))
            .collect()
    };

    let body = if comment.is_deleted {
        String::new()
    } else {
        comment.body.clone()
    };

    CommentView {
        id: comment.id,
        club: comment.club_id,
        author: decorations.author_of(&comment),
        post: comment.post_id,
        body,
        is_top_level: comment.is_top_level,
        is_deleted: comment.is_deleted,
        like_count: decorations
            .like_counts
            .get(&comment.id)
            .copied()
            .unwrap_or(0),
        is_liked: decorations.liked_by_actor.contains(&comment.id),
        created_at: comment.created_at,
        replies,
    }
}

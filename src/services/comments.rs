/// Comment service - creation, bounded reply-tree retrieval and the
/// like/unlike and deletion operations on comments.
use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::models::{Actor, Comment, Member};
use crate::domain::views::{
    build_comment_tree, AuthorView, CommentDecorations, CommentView, REPLY_TREE_DEPTH,
};
use crate::error::{AppError, Result};
use crate::repository::{ClubStore, CommentLikeLedger, CommentStore, MemberStore, PostStore};
use crate::services::feed::FeedCursor;
use crate::services::moderation::can_moderate;

/// Page size for top-level comment threads
pub const COMMENT_PAGE_SIZE: i64 = 10;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentStore>,
    posts: Arc<dyn PostStore>,
    members: Arc<dyn MemberStore>,
    clubs: Arc<dyn ClubStore>,
    comment_likes: Arc<dyn CommentLikeLedger>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentStore>,
        posts: Arc<dyn PostStore>,
        members: Arc<dyn MemberStore>,
        clubs: Arc<dyn ClubStore>,
        comment_likes: Arc<dyn CommentLikeLedger>,
    ) -> Self {
        Self {
            comments,
            posts,
            members,
            clubs,
            comment_likes,
        }
    }

    /// Add a comment, optionally as a reply. The result is a fully-formed
    /// view (author identity, empty reply list, zero likes) so clients can
    /// render it without a round trip.
    pub async fn add_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        body: &str,
        reply_to: Option<Uuid>,
    ) -> Result<CommentView> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post does not exist".to_string()))?;

        let member = self.require_member_of(actor, post.club_id).await?;

        if let Some(parent_id) = reply_to {
            let parent = self
                .comments
                .get_comment_any(parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound("No such comment exists".to_string()))?;
            if parent.post_id != post_id {
                return Err(AppError::Validation(
                    "reply target belongs to a different post".to_string(),
                ));
            }
        }

        let comment = self
            .comments
            .create_comment(post.club_id, member.id, post_id, body, reply_to)
            .await?;

        Ok(Self::echo_view(comment, member))
    }

    /// Retrieve a reply tree. With `parent_id` this returns the parent's
    /// replies; without it, one page of the post's top-level threads. In
    /// both cases the deepest node returned sits [`REPLY_TREE_DEPTH`]
    /// levels below the point the caller asked about.
    pub async fn fetch_comment_tree(
        &self,
        actor: &Actor,
        post_id: Uuid,
        parent_id: Option<Uuid>,
        cursor: FeedCursor,
    ) -> Result<Vec<CommentView>> {
        // Comments outlive their post's soft-deletion, so the post lookup
        // includes deleted rows; the membership gate still applies.
        let post = self
            .posts
            .find_by_id_any(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post does not exist".to_string()))?;

        if post.kind().requires_membership()
            && !self.members.is_member(post.club_id, actor.user_id).await?
        {
            return Err(AppError::PermissionDenied(
                "User is not part of club".to_string(),
            ));
        }

        // Roots queried by parent are already one level into the tree, so
        // they expand one level less than top-level roots do; either way
        // the deepest node returned is REPLY_TREE_DEPTH levels below the
        // point the caller asked about.
        let (roots, depth) = match parent_id {
            Some(parent_id) => {
                let parent = self
                    .comments
                    .get_comment_any(parent_id)
                    .await?
                    .filter(|c| c.post_id == post_id)
                    .ok_or_else(|| AppError::NotFound("No such comment exists".to_string()))?;
                let replies = self.comments.replies_of(&[parent.id]).await?;
                (replies, REPLY_TREE_DEPTH - 1)
            }
            None => {
                let (before, before_id) = cursor.bounds();
                let page = self
                    .comments
                    .top_level_page(post_id, before, before_id, COMMENT_PAGE_SIZE)
                    .await?;
                (page, REPLY_TREE_DEPTH)
            }
        };

        // Bounded breadth-first expansion: one query per level.
        let mut descendants: Vec<Comment> = Vec::new();
        let mut frontier: Vec<Uuid> = roots.iter().map(|c| c.id).collect();
        for _ in 0..depth {
            let level = self.comments.replies_of(&frontier).await?;
            frontier = level.iter().map(|c| c.id).collect();
            descendants.extend(level);
            if frontier.is_empty() {
                break;
            }
        }

        let decorations = self.decorations_for(actor, &roots, &descendants).await?;
        Ok(build_comment_tree(roots, descendants, &decorations, depth))
    }

    /// Like a comment. Membership in the comment's club is required
    /// regardless of the post type; a repeated like is a no-op.
    pub async fn like_comment(&self, actor: &Actor, comment_id: Uuid) -> Result<i64> {
        let comment = self
            .comments
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment does not exist".to_string()))?;

        if !self.members.is_member(comment.club_id, actor.user_id).await? {
            return Err(AppError::PermissionDenied(
                "You need to be a member to like this comment".to_string(),
            ));
        }

        self.comment_likes.add(comment_id, actor.user_id).await?;
        self.comment_likes.count(comment_id).await
    }

    /// Remove a like. Unliking a never-liked comment is a validation error.
    pub async fn unlike_comment(&self, actor: &Actor, comment_id: Uuid) -> Result<i64> {
        self.comments
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment does not exist".to_string()))?;

        let removed = self.comment_likes.remove(comment_id, actor.user_id).await?;
        if !removed {
            return Err(AppError::Validation(
                "You have not given this comment a like".to_string(),
            ));
        }

        self.comment_likes.count(comment_id).await
    }

    /// Soft-delete a comment under the shared moderation predicate. The
    /// node stays in the tree as a flagged placeholder.
    pub async fn delete_comment(&self, actor: &Actor, comment_id: Uuid) -> Result<()> {
        let comment = self
            .comments
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No such comment exists".to_string()))?;

        let club = self
            .clubs
            .get_club(comment.club_id)
            .await?
            .ok_or_else(|| AppError::Internal("comment references missing club".to_string()))?;

        if !can_moderate(actor, comment.author_id, &club.moderators) {
            return Err(AppError::PermissionDenied("Invalid permissions".to_string()));
        }

        self.comments.soft_delete(comment_id).await?;
        Ok(())
    }

    async fn decorations_for(
        &self,
        actor: &Actor,
        roots: &[Comment],
        descendants: &[Comment],
    ) -> Result<CommentDecorations> {
        let comment_ids: Vec<Uuid> = roots
            .iter()
            .chain(descendants.iter())
            .map(|c| c.id)
            .collect();
        let author_ids: Vec<Uuid> = roots
            .iter()
            .chain(descendants.iter())
            .map(|c| c.author_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let members = self.members.get_members(&author_ids).await?;
        let mut decorations = CommentDecorations::from_members(members);
        decorations.like_counts = self.comment_likes.counts_for(&comment_ids).await?;
        decorations.liked_by_actor = self
            .comment_likes
            .liked_among(actor.user_id, &comment_ids)
            .await?;

        Ok(decorations)
    }

    async fn require_member_of(&self, actor: &Actor, club_id: Uuid) -> Result<Member> {
        let member_id = actor.member_id.ok_or_else(|| {
            AppError::PermissionDenied(
                "You need to be a member to comment on this post".to_string(),
            )
        })?;

        self.members
            .get_member(member_id)
            .await?
            .filter(|m| m.club_id == club_id)
            .ok_or_else(|| {
                AppError::PermissionDenied(
                    "You need to be a member to comment on this post".to_string(),
                )
            })
    }

    fn echo_view(comment: Comment, member: Member) -> CommentView {
        CommentView {
            id: comment.id,
            club: comment.club_id,
            author: Some(AuthorView {
                member_id: member.id,
                username: member.username,
            }),
            post: comment.post_id,
            body: comment.body,
            is_top_level: comment.is_top_level,
            is_deleted: false,
            like_count: 0,
            is_liked: false,
            created_at: comment.created_at,
            replies: Vec::new(),
        }
    }
}

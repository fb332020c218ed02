/// Store interfaces consumed by the services.
///
/// Each trait is the contract of one store; the sqlx repositories are the
/// Postgres implementations and tests supply in-memory ones.
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::{Club, Comment, Member, Post, PostType};
use crate::error::Result;

/// Post store: persistence, slug uniqueness and soft-delete state
#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a new post; a slug collision surfaces as a conflict
    #[allow(clippy::too_many_arguments)]
    async fn create_post(
        &self,
        club_id: Uuid,
        author_id: Uuid,
        slug: &str,
        post_type: PostType,
        title: &str,
        body: Option<&str>,
        media_refs: &[String],
        flair_id: Option<Uuid>,
    ) -> Result<Post>;

    /// Find a post by slug, excluding soft-deleted rows
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// Find a post by slug including soft-deleted rows (moderation path)
    async fn find_by_slug_any(&self, slug: &str) -> Result<Option<Post>>;

    /// Find a post by ID, excluding soft-deleted rows
    async fn find_by_id(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Find a post by ID including soft-deleted rows
    async fn find_by_id_any(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// One keyset page of a club feed, `(created_at, id)` descending
    async fn fetch_feed_page(
        &self,
        club_id: Uuid,
        post_type: PostType,
        before: DateTime<Utc>,
        before_id: Uuid,
        author_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Post>>;

    /// Soft delete; false if already deleted or absent
    async fn soft_delete(&self, post_id: Uuid) -> Result<bool>;
}

/// Comment store: the nested-reply arena
#[async_trait::async_trait]
pub trait CommentStore: Send + Sync {
    async fn create_comment(
        &self,
        club_id: Uuid,
        author_id: Uuid,
        post_id: Uuid,
        body: &str,
        parent_comment_id: Option<Uuid>,
    ) -> Result<Comment>;

    /// Get a comment, excluding soft-deleted rows (mutation paths)
    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>>;

    /// Get a comment including soft-deleted rows (tree structure)
    async fn get_comment_any(&self, comment_id: Uuid) -> Result<Option<Comment>>;

    /// One keyset page of top-level comments, `(created_at, id)` descending
    async fn top_level_page(
        &self,
        post_id: Uuid,
        before: DateTime<Utc>,
        before_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Comment>>;

    /// Direct replies of a set of parents, in insertion order
    async fn replies_of(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>>;

    /// Non-deleted comment count for a post
    async fn count_for_post(&self, post_id: Uuid) -> Result<i64>;

    /// Batch comment counts keyed by post id
    async fn counts_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>>;

    /// Soft delete; false if already deleted or absent
    async fn soft_delete(&self, comment_id: Uuid) -> Result<bool>;
}

/// Post like ledger: atomic add-if-absent / remove-if-present
#[async_trait::async_trait]
pub trait PostLikeLedger: Send + Sync {
    /// Add a like if absent; true if a new entry was created
    async fn add(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Remove a like if present; false if the user had no entry
    async fn remove(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn count(&self, post_id: Uuid) -> Result<i64>;

    async fn contains(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Batch like counts keyed by post id
    async fn counts_for(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>>;

    /// Which of the given posts the user has liked
    async fn liked_among(&self, user_id: Uuid, post_ids: &[Uuid]) -> Result<HashSet<Uuid>>;
}

/// Comment like ledger, same contract keyed by comment
#[async_trait::async_trait]
pub trait CommentLikeLedger: Send + Sync {
    async fn add(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn remove(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn count(&self, comment_id: Uuid) -> Result<i64>;

    /// Batch like counts keyed by comment id
    async fn counts_for(&self, comment_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>>;

    /// Which of the given comments the user has liked
    async fn liked_among(&self, user_id: Uuid, comment_ids: &[Uuid]) -> Result<HashSet<Uuid>>;
}

/// Membership lookups
#[async_trait::async_trait]
pub trait MemberStore: Send + Sync {
    async fn is_member(&self, club_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn get_member(&self, member_id: Uuid) -> Result<Option<Member>>;

    async fn get_members(&self, member_ids: &[Uuid]) -> Result<Vec<Member>>;
}

/// Club lookups (moderator list for the deletion predicate)
#[async_trait::async_trait]
pub trait ClubStore: Send + Sync {
    async fn get_club(&self, club_id: Uuid) -> Result<Option<Club>>;
}

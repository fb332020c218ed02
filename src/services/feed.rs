/// Feed service - orchestrates the post store, comment store and like
/// ledger to answer feed and full-post queries and to execute create,
/// like and delete operations under authorization. Handlers only ever see
/// formatted projections, never raw storage rows.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::models::{Actor, PostType};
use crate::domain::views::{project_post, PostView};
use crate::error::{AppError, Result};
use crate::media::MediaStore;
use crate::repository::{ClubStore, CommentStore, MemberStore, PostLikeLedger, PostStore};
use crate::services::moderation::can_moderate;
use crate::services::slug::generate_slug;

/// Feed page size
pub const FEED_PAGE_SIZE: i64 = 5;

/// Keyset cursor over `(created_at, id)` descending. The caller passes the
/// last returned item's timestamp and id to get the next page; omitting
/// both starts at "now". The id component is what keeps pages complete and
/// duplicate-free when timestamps tie.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedCursor {
    pub before: Option<DateTime<Utc>>,
    pub before_id: Option<Uuid>,
}

impl FeedCursor {
    /// Bounds for the `(created_at, id) < (before, before_id)` key
    /// comparison. With no cursor at all the page starts at "now" and the
    /// id bound is `Uuid::max()` so nothing is excluded. A timestamp with
    /// no id must collapse to a strict `created_at < before`: the id bound
    /// becomes `Uuid::nil()`, otherwise rows sharing the boundary
    /// timestamp would be returned again on every page.
    pub fn bounds(&self) -> (DateTime<Utc>, Uuid) {
        match (self.before, self.before_id) {
            (Some(before), Some(id)) => (before, id),
            (Some(before), None) => (before, Uuid::nil()),
            (None, _) => (Utc::now(), Uuid::max()),
        }
    }
}

/// One inline image attached to a post at creation time
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Creation result: the new post's id and its public slug
#[derive(Debug, Clone, Serialize)]
pub struct CreatedPost {
    pub id: Uuid,
    pub slug: String,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostStore>,
    comments: Arc<dyn CommentStore>,
    post_likes: Arc<dyn PostLikeLedger>,
    members: Arc<dyn MemberStore>,
    clubs: Arc<dyn ClubStore>,
    media: Arc<dyn MediaStore>,
    media_base_url: String,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostStore>,
        comments: Arc<dyn CommentStore>,
        post_likes: Arc<dyn PostLikeLedger>,
        members: Arc<dyn MemberStore>,
        clubs: Arc<dyn ClubStore>,
        media: Arc<dyn MediaStore>,
        media_base_url: String,
    ) -> Self {
        Self {
            posts,
            comments,
            post_likes,
            members,
            clubs,
            media,
            media_base_url,
        }
    }

    /// One page of a club's feed, most recent first. `Post`-type feeds are
    /// member-only; `News` is open.
    pub async fn fetch_feed(
        &self,
        actor: &Actor,
        club_id: Uuid,
        post_type: PostType,
        cursor: FeedCursor,
        author_filter: Option<Uuid>,
    ) -> Result<Vec<PostView>> {
        if post_type.requires_membership()
            && !self.members.is_member(club_id, actor.user_id).await?
        {
            return Err(AppError::PermissionDenied(
                "User is not part of club".to_string(),
            ));
        }

        let (before, before_id) = cursor.bounds();
        let page = self
            .posts
            .fetch_feed_page(
                club_id,
                post_type,
                before,
                before_id,
                author_filter,
                FEED_PAGE_SIZE,
            )
            .await?;

        let ids: Vec<Uuid> = page.iter().map(|p| p.id).collect();
        let comment_counts = self.comments.counts_for_posts(&ids).await?;
        let like_counts = self.post_likes.counts_for(&ids).await?;
        let liked = self.post_likes.liked_among(actor.user_id, &ids).await?;

        Ok(page
            .iter()
            .map(|post| {
                project_post(
                    post,
                    comment_counts.get(&post.id).copied().unwrap_or(0),
                    like_counts.get(&post.id).copied().unwrap_or(0),
                    liked.contains(&post.id),
                    &self.media_base_url,
                )
            })
            .collect())
    }

    /// Full post by slug. Soft-deleted posts answer `NotFound` on this
    /// path; moderation tooling goes through
    /// [`FeedService::fetch_post_for_moderation`].
    pub async fn fetch_full_post(&self, actor: &Actor, slug: &str) -> Result<PostView> {
        let post = self
            .posts
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("No such post exists".to_string()))?;

        if post.kind().requires_membership()
            && !self.members.is_member(post.club_id, actor.user_id).await?
        {
            return Err(AppError::PermissionDenied(
                "User is not part of club".to_string(),
            ));
        }

        self.decorate(actor, &post).await
    }

    /// Moderation-only accessor: sees soft-deleted posts, gated on the
    /// same predicate as deletion.
    pub async fn fetch_post_for_moderation(&self, actor: &Actor, slug: &str) -> Result<PostView> {
        let post = self
            .posts
            .find_by_slug_any(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("No such post exists".to_string()))?;

        let club = self
            .clubs
            .get_club(post.club_id)
            .await?
            .ok_or_else(|| AppError::Internal("post references missing club".to_string()))?;

        if !can_moderate(actor, post.author_id, &club.moderators) {
            return Err(AppError::PermissionDenied("Invalid permissions".to_string()));
        }

        self.decorate(actor, &post).await
    }

    /// Create a post. Media is persisted first; creation fails entirely if
    /// any upload fails. Slug collisions surface as `Conflict` at write
    /// time - there is no uniqueness pre-check.
    pub async fn create_post(
        &self,
        actor: &Actor,
        club_id: Uuid,
        post_type: PostType,
        title: &str,
        body: Option<&str>,
        flair_id: Option<Uuid>,
        media: Vec<MediaUpload>,
    ) -> Result<CreatedPost> {
        let member = self.require_member_of(actor, club_id).await?;

        let mut media_refs = Vec::with_capacity(media.len());
        for upload in &media {
            let reference = self.media.put(&upload.bytes, &upload.mime_type).await?;
            media_refs.push(reference);
        }

        let slug = generate_slug(title);
        let created = self
            .posts
            .create_post(
                club_id,
                member.id,
                &slug,
                post_type,
                title,
                body,
                &media_refs,
                flair_id,
            )
            .await;

        match created {
            Ok(post) => Ok(CreatedPost {
                id: post.id,
                slug: post.slug,
            }),
            Err(err) => {
                // Uploads that preceded the failed insert are orphaned;
                // accepted as a best-effort leak.
                if !media_refs.is_empty() {
                    tracing::warn!(?media_refs, "post insert failed after media upload");
                }
                Err(err)
            }
        }
    }

    /// Soft-delete a post. Associated media removal is best-effort: a
    /// cleanup failure is logged and never rolls the deletion back.
    pub async fn delete_post(&self, actor: &Actor, slug: &str) -> Result<()> {
        let post = self
            .posts
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let club = self
            .clubs
            .get_club(post.club_id)
            .await?
            .ok_or_else(|| AppError::Internal("post references missing club".to_string()))?;

        if !can_moderate(actor, post.author_id, &club.moderators) {
            return Err(AppError::PermissionDenied("Invalid permissions".to_string()));
        }

        self.posts.soft_delete(post.id).await?;

        for reference in &post.media_refs {
            if let Err(err) = self.media.delete(reference).await {
                tracing::warn!(post_id = %post.id, reference, "media cleanup failed: {}", err);
            }
        }

        Ok(())
    }

    /// Like a post. Idempotent: a repeated like is a no-op and the
    /// returned count is unchanged.
    pub async fn like_post(&self, actor: &Actor, post_id: Uuid) -> Result<i64> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post does not exist".to_string()))?;

        if post.kind().requires_membership()
            && !self.members.is_member(post.club_id, actor.user_id).await?
        {
            return Err(AppError::PermissionDenied(
                "You need to be a member to like this post".to_string(),
            ));
        }

        self.post_likes.add(post_id, actor.user_id).await?;
        self.post_likes.count(post_id).await
    }

    /// Remove a like. Unliking a never-liked post is a validation error.
    pub async fn unlike_post(&self, actor: &Actor, post_id: Uuid) -> Result<i64> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post does not exist".to_string()))?;

        let removed = self.post_likes.remove(post_id, actor.user_id).await?;
        if !removed {
            return Err(AppError::Validation(
                "You have not given this post a like".to_string(),
            ));
        }

        self.post_likes.count(post_id).await
    }

    async fn decorate(&self, actor: &Actor, post: &crate::domain::models::Post) -> Result<PostView> {
        let comment_count = self.comments.count_for_post(post.id).await?;
        let like_count = self.post_likes.count(post.id).await?;
        let is_liked = self.post_likes.contains(post.id, actor.user_id).await?;

        Ok(project_post(
            post,
            comment_count,
            like_count,
            is_liked,
            &self.media_base_url,
        ))
    }

    async fn require_member_of(
        &self,
        actor: &Actor,
        club_id: Uuid,
    ) -> Result<crate::domain::models::Member> {
        let member_id = actor.member_id.ok_or_else(|| {
            AppError::PermissionDenied("You need to be a member of this club".to_string())
        })?;

        let member = self
            .members
            .get_member(member_id)
            .await?
            .filter(|m| m.club_id == club_id)
            .ok_or_else(|| {
                AppError::PermissionDenied("You need to be a member of this club".to_string())
            })?;

        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_cursor_admits_everything_up_to_now() {
        let (before, before_id) = FeedCursor::default().bounds();
        assert!(before >= Utc::now() - chrono::Duration::seconds(1));
        assert_eq!(before_id, Uuid::max());
    }

    #[test]
    fn timestamp_only_cursor_excludes_the_boundary_row() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let cursor = FeedCursor {
            before: Some(ts),
            before_id: None,
        };
        let (before, before_id) = cursor.bounds();

        // A row carrying the cursor timestamp must not satisfy
        // (created_at, id) < (before, before_id), whatever its id.
        assert_eq!(before, ts);
        assert_eq!(before_id, Uuid::nil());
        let boundary_row = (ts, Uuid::new_v4());
        assert!(boundary_row >= (before, before_id));
    }

    #[test]
    fn full_cursor_passes_both_components_through() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let id = Uuid::new_v4();
        let cursor = FeedCursor {
            before: Some(ts),
            before_id: Some(id),
        };
        assert_eq!(cursor.bounds(), (ts, id));
    }
}

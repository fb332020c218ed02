use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::Comment;
use crate::error::Result;
use crate::repository::traits::CommentStore;

const COMMENT_COLUMNS: &str = "id, club_id, author_id, post_id, parent_comment_id, is_top_level, \
                               body, is_deleted, created_at, updated_at";

/// Repository for the comment store. Owns the nested-reply graph: comments
/// form an arena keyed by id, children point at their parent through
/// `parent_comment_id`, and reply order is insertion order
/// `(created_at, id)` ascending.
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CommentStore for CommentRepository {

    /// Create a new comment. Linking into the parent's reply list is the
    /// insert itself; there is no separate list to update.
    async fn create_comment(
        &self,
        club_id: Uuid,
        author_id: Uuid,
        post_id: Uuid,
        body: &str,
        parent_comment_id: Option<Uuid>,
    ) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (club_id, author_id, post_id, body, parent_comment_id, is_top_level)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COMMENT_COLUMNS}
            "#,
        ))
        .bind(club_id)
        .bind(author_id)
        .bind(post_id)
        .bind(body)
        .bind(parent_comment_id)
        .bind(parent_comment_id.is_none())
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Get a single comment, excluding soft-deleted rows (mutation paths)
    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        ))
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Get a single comment including soft-deleted rows. Tree expansion
    /// uses this so deleted placeholders keep their subtrees reachable.
    async fn get_comment_any(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE id = $1
            "#,
        ))
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    /// One page of top-level comments for a post, keyset-paginated on
    /// `(created_at, id)` descending. Soft-deleted comments remain in the
    /// page as placeholders so their reply subtrees stay reachable.
    async fn top_level_page(
        &self,
        post_id: Uuid,
        before: DateTime<Utc>,
        before_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE post_id = $1
              AND is_top_level = TRUE
              AND (created_at, id) < ($2, $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#,
        ))
        .bind(post_id)
        .bind(before)
        .bind(before_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Direct replies of a set of parents, in insertion order. This is one
    /// level of the bounded breadth-first tree expansion.
    async fn replies_of(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let comments = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE parent_comment_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        ))
        .bind(parent_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Comment count for a post, excluding soft-deleted comments
    async fn count_for_post(&self, post_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM comments
            WHERE post_id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Batch comment counts for a feed page, keyed by post id
    async fn counts_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT post_id, COUNT(*)
            FROM comments
            WHERE post_id = ANY($1) AND is_deleted = FALSE
            GROUP BY post_id
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Soft delete a comment. The row stays in the arena so already
    /// rendered reply trees keep their referential integrity.
    async fn soft_delete(&self, comment_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET is_deleted = TRUE, updated_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(comment_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::repository::traits::CommentLikeLedger;

/// Repository for the comment like ledger. Same shape and atomicity
/// contract as the post ledger, keyed by `(comment_id, user_id)`.
#[derive(Clone)]
pub struct CommentLikeRepository {
    pool: PgPool,
}

impl CommentLikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CommentLikeLedger for CommentLikeRepository {

    /// Add a like if absent. Returns true if a new entry was created.
    async fn add(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO comment_likes (comment_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (comment_id, user_id) DO NOTHING
            "#,
        )
        .bind(comment_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a like if present. Returns false if the user had no entry.
    async fn remove(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM comment_likes
            WHERE comment_id = $1 AND user_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Like count for a comment
    async fn count(&self, comment_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM comment_likes
            WHERE comment_id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Batch like counts for a reply tree, keyed by comment id
    async fn counts_for(&self, comment_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        if comment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT comment_id, COUNT(*)
            FROM comment_likes
            WHERE comment_id = ANY($1)
            GROUP BY comment_id
            "#,
        )
        .bind(comment_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Batch check which of the given comments the user has liked
    async fn liked_among(&self, user_id: Uuid, comment_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        if comment_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let liked: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT comment_id
            FROM comment_likes
            WHERE user_id = $1 AND comment_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(comment_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(liked.into_iter().collect())
    }
}

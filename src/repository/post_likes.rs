use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::repository::traits::PostLikeLedger;

/// Repository for the post like ledger: a per-post set of
/// `(user, liked_on)` entries keyed by user. Insertion and removal are
/// single atomic statements at the storage layer, never a read-modify-write
/// of the whole document, so concurrent likes from different users cannot
/// lose updates.
#[derive(Clone)]
pub struct PostLikeRepository {
    pool: PgPool,
}

impl PostLikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PostLikeLedger for PostLikeRepository {

    /// Add a like if absent. Returns true if a new entry was created;
    /// a repeated like is a no-op.
    async fn add(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a like if present. Returns false if the user had no entry.
    async fn remove(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM post_likes
            WHERE post_id = $1 AND user_id = $2
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Like count for a post
    async fn count(&self, post_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM post_likes
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Whether the user has liked the post
    async fn contains(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM post_likes
                WHERE post_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Batch like counts for a feed page, keyed by post id
    async fn counts_for(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT post_id, COUNT(*)
            FROM post_likes
            WHERE post_id = ANY($1)
            GROUP BY post_id
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Batch check which of the given posts the user has liked
    async fn liked_among(&self, user_id: Uuid, post_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let liked: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT post_id
            FROM post_likes
            WHERE user_id = $1 AND post_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(liked.into_iter().collect())
    }
}

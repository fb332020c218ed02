use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::{Post, PostType};
use crate::error::Result;
use crate::repository::traits::PostStore;

const POST_COLUMNS: &str = "id, club_id, author_id, slug, post_type, title, body, flair_id, \
                            media_refs, is_deleted, created_at, updated_at";

/// Repository for the post store. Owns slug uniqueness (enforced by the
/// unique index, surfaced as a conflict at write time) and soft-delete
/// state.
#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PostStore for PostRepository {
    /// Insert a new post. A slug collision trips the unique index and
    /// surfaces as `AppError::Conflict`; there is no pre-check.
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
    ) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (club_id, author_id, slug, post_type, title, body, media_refs, flair_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {POST_COLUMNS}
            "#,
        ))
        .bind(club_id)
        .bind(author_id)
        .bind(slug)
        .bind(post_type.as_str())
        .bind(title)
        .bind(body)
        .bind(media_refs)
        .bind(flair_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    /// Find a post by slug, excluding soft-deleted rows (regular read path)
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE slug = $1 AND is_deleted = FALSE
            "#,
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Find a post by slug including soft-deleted rows (moderation path)
    async fn find_by_slug_any(&self, slug: &str) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE slug = $1
            "#,
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Find a post by ID including soft-deleted rows. Comment-tree reads
    /// use this: comments outlive their post's deletion.
    async fn find_by_id_any(&self, post_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE id = $1
            "#,
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Find a post by ID, excluding soft-deleted rows
    async fn find_by_id(&self, post_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// One page of a club feed: non-deleted posts of the given type,
    /// keyset-paginated on `(created_at, id)` descending so that ties on
    /// identical timestamps can neither skip nor duplicate items.
    async fn fetch_feed_page(
        &self,
        club_id: Uuid,
        post_type: PostType,
        before: DateTime<Utc>,
        before_id: Uuid,
        author_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE club_id = $1
              AND post_type = $2
              AND is_deleted = FALSE
              AND (created_at, id) < ($3, $4)
              AND ($5::uuid IS NULL OR author_id = $5)
            ORDER BY created_at DESC, id DESC
            LIMIT $6
            "#,
        ))
        .bind(club_id)
        .bind(post_type.as_str())
        .bind(before)
        .bind(before_id)
        .bind(author_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Soft delete a post. Returns false if it was already deleted or absent.
    async fn soft_delete(&self, post_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET is_deleted = TRUE, updated_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::Member;
use crate::error::Result;
use crate::repository::traits::MemberStore;

/// Repository for club membership lookups. Admission rules live elsewhere;
/// the board only asks "is this user a member" and resolves author
/// identities for comment trees.
#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MemberStore for MemberRepository {

    /// Whether the user belongs to the club
    async fn is_member(&self, club_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM members
                WHERE club_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(club_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Get a member by ID
    async fn get_member(&self, member_id: Uuid) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, club_id, user_id, username
            FROM members
            WHERE id = $1
            "#,
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Batch fetch members by ID (author identities for a reply tree)
    async fn get_members(&self, member_ids: &[Uuid]) -> Result<Vec<Member>> {
        if member_ids.is_empty() {
            return Ok(Vec::new());
        }

        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, club_id, user_id, username
            FROM members
            WHERE id = ANY($1)
            "#,
        )
        .bind(member_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }
}

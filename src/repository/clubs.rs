use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::Club;
use crate::error::Result;
use crate::repository::traits::ClubStore;

/// Repository for the club lookups the board needs (the moderator list
/// feeding the deletion predicate). Club lifecycle itself lives elsewhere.
#[derive(Clone)]
pub struct ClubRepository {
    pool: PgPool,
}

impl ClubRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ClubStore for ClubRepository {

    /// Get a club by ID
    async fn get_club(&self, club_id: Uuid) -> Result<Option<Club>> {
        let club = sqlx::query_as::<_, Club>(
            r#"
            SELECT id, name, moderators
            FROM clubs
            WHERE id = $1
            "#,
        )
        .bind(club_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(club)
    }
}

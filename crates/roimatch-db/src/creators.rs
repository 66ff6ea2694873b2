//! Database operations for the `creators` table.

use chrono::{DateTime, Utc};
use roimatch_core::Creator;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `creators` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CreatorRow {
    pub creator_id: i64,
    pub username: String,
    pub follower_count: i64,
    pub niche: String,
    pub platform: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CreatorRow> for Creator {
    type Error = DbError;

    fn try_from(row: CreatorRow) -> Result<Self, Self::Error> {
        Ok(Creator {
            id: row.creator_id,
            username: row.username,
            follower_count: u64::try_from(row.follower_count).map_err(|_| {
                DbError::InvalidRow(format!(
                    "creator {} has negative follower_count",
                    row.creator_id
                ))
            })?,
            niche: row.niche,
            platform: row.platform.parse()?,
            bio: row.bio,
        })
    }
}

/// Insert creators in one transaction. A `(username, platform)` pair that
/// already exists keeps its first-seen row.
///
/// Returns the number of rows actually inserted. The provisional `id` on
/// each [`Creator`] is ignored; the database assigns `creator_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; nothing is committed.
pub async fn insert_creators(pool: &PgPool, creators: &[Creator]) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for c in creators {
        let result = sqlx::query(
            "INSERT INTO creators (username, follower_count, niche, platform, bio) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (username, platform) DO NOTHING",
        )
        .bind(&c.username)
        .bind(i64::try_from(c.follower_count).unwrap_or(i64::MAX))
        .bind(&c.niche)
        .bind(c.platform.as_str())
        .bind(&c.bio)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// All creators, ordered by `creator_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// if a stored platform is not a known value.
pub async fn list_creators(pool: &PgPool) -> Result<Vec<Creator>, DbError> {
    let rows = sqlx::query_as::<_, CreatorRow>(
        "SELECT creator_id, username, follower_count, niche, platform, bio, created_at \
         FROM creators \
         ORDER BY creator_id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Creator::try_from).collect()
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_creators(pool: &PgPool) -> Result<i64, DbError> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM creators")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

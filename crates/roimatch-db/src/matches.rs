//! Database operations for the `matches` table.

use chrono::{DateTime, Utc};
use roimatch_core::Match;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `matches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
    pub match_id: i64,
    pub creator_id: i64,
    pub match_method: String,
    pub actual_roi: f64,
    pub outcome: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MatchRow> for Match {
    type Error = DbError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        Ok(Match {
            id: row.match_id,
            creator_id: row.creator_id,
            method: row.match_method.parse()?,
            actual_roi: row.actual_roi,
            outcome: row.outcome.parse()?,
        })
    }
}

/// Insert matches in one transaction. Every `creator_id` must already exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails, including a foreign-key
/// violation; nothing is committed.
pub async fn insert_matches(pool: &PgPool, matches: &[Match]) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for m in matches {
        let result = sqlx::query(
            "INSERT INTO matches (creator_id, match_method, actual_roi, outcome) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(m.creator_id)
        .bind(m.method.to_string())
        .bind(m.actual_roi)
        .bind(m.outcome.to_string())
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// All matches, ordered by `match_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// for an unknown method or outcome.
pub async fn list_matches(pool: &PgPool) -> Result<Vec<Match>, DbError> {
    let rows = sqlx::query_as::<_, MatchRow>(
        "SELECT match_id, creator_id, match_method, actual_roi, outcome, created_at \
         FROM matches \
         ORDER BY match_id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Match::try_from).collect()
}

/// Delete all matches, campaigns, and creators in one transaction, for a
/// full reload.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any delete fails; nothing is committed.
pub async fn clear_match_tables(pool: &PgPool) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM matches").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM campaigns").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM creators").execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(())
}

//! Database operations for the `campaigns` table.

use chrono::{DateTime, Utc};
use roimatch_core::Campaign;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `campaigns` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignRow {
    pub campaign_id: i64,
    pub brand_name: String,
    pub product_category: String,
    pub budget: i64,
    pub content_requirements: String,
    pub created_at: DateTime<Utc>,
}

impl From<CampaignRow> for Campaign {
    fn from(row: CampaignRow) -> Self {
        Campaign {
            id: row.campaign_id,
            brand_name: row.brand_name,
            product_category: row.product_category,
            budget: row.budget,
            content_requirements: row.content_requirements,
        }
    }
}

/// Insert campaigns in one transaction. A repeated `brand_name` keeps the
/// first-seen row.
///
/// Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; nothing is committed.
pub async fn insert_campaigns(pool: &PgPool, campaigns: &[Campaign]) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for c in campaigns {
        let result = sqlx::query(
            "INSERT INTO campaigns (brand_name, product_category, budget, content_requirements) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (brand_name) DO NOTHING",
        )
        .bind(&c.brand_name)
        .bind(&c.product_category)
        .bind(c.budget)
        .bind(&c.content_requirements)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// All campaigns, ordered by `campaign_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_campaigns(pool: &PgPool) -> Result<Vec<Campaign>, DbError> {
    let rows = sqlx::query_as::<_, CampaignRow>(
        "SELECT campaign_id, brand_name, product_category, budget, content_requirements, created_at \
         FROM campaigns \
         ORDER BY campaign_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Campaign::from).collect())
}

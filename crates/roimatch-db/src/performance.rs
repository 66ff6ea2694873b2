//! Database operations for the `campaign_performance` table.

use chrono::NaiveDate;
use roimatch_core::{HistoricalFilter, PerformanceRecord, Platform};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `campaign_performance` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PerformanceRow {
    pub id: i64,
    pub campaign_id: String,
    pub platform: String,
    pub influencer_category: String,
    pub campaign_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub engagements: Option<i64>,
    pub estimated_reach: Option<i64>,
    pub product_sales: Option<f64>,
    pub budget: Option<i64>,
    pub campaign_duration_days: Option<i32>,
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<PerformanceRow> for PerformanceRecord {
    type Error = DbError;

    fn try_from(row: PerformanceRow) -> Result<Self, Self::Error> {
        Ok(PerformanceRecord {
            campaign_id: row.campaign_id,
            platform: row.platform.parse()?,
            influencer_category: row.influencer_category,
            campaign_type: row.campaign_type,
            start_date: row.start_date,
            engagements: row.engagements,
            estimated_reach: row.estimated_reach,
            product_sales: row.product_sales,
            budget: row.budget,
            duration_days: row.campaign_duration_days,
            end_date: row.end_date,
        })
    }
}

/// Replace the whole table with `records` in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the truncate or any insert fails; the
/// previous contents are kept in that case.
pub async fn replace_performance_records(
    pool: &PgPool,
    records: &[PerformanceRecord],
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    sqlx::query("TRUNCATE campaign_performance RESTART IDENTITY")
        .execute(&mut *tx)
        .await?;

    let mut inserted = 0u64;
    for r in records {
        let result = sqlx::query(
            "INSERT INTO campaign_performance \
                 (campaign_id, platform, influencer_category, campaign_type, start_date, \
                  engagements, estimated_reach, product_sales, budget, \
                  campaign_duration_days, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&r.campaign_id)
        .bind(r.platform.as_str())
        .bind(&r.influencer_category)
        .bind(&r.campaign_type)
        .bind(r.start_date)
        .bind(r.engagements)
        .bind(r.estimated_reach)
        .bind(r.product_sales)
        .bind(r.budget)
        .bind(r.duration_days)
        .bind(r.end_date)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// All performance records in load order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// for an unknown platform.
pub async fn list_performance_records(pool: &PgPool) -> Result<Vec<PerformanceRecord>, DbError> {
    let rows = sqlx::query_as::<_, PerformanceRow>(
        "SELECT id, campaign_id, platform, influencer_category, campaign_type, start_date, \
                engagements, estimated_reach, product_sales, budget, \
                campaign_duration_days, end_date \
         FROM campaign_performance \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(PerformanceRecord::try_from).collect()
}

/// Performance records that pass `filter`, in load order. Missing sales and
/// engagements compare as zero.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// for an unknown platform.
pub async fn list_performance_matching(
    pool: &PgPool,
    filter: &HistoricalFilter,
) -> Result<Vec<PerformanceRecord>, DbError> {
    let rows = sqlx::query_as::<_, PerformanceRow>(
        "SELECT id, campaign_id, platform, influencer_category, campaign_type, start_date, \
                engagements, estimated_reach, product_sales, budget, \
                campaign_duration_days, end_date \
         FROM campaign_performance \
         WHERE ($1::TEXT IS NULL OR campaign_type = $1) \
           AND ($2::TEXT IS NULL OR influencer_category = $2) \
           AND ($3::TEXT IS NULL OR platform = $3) \
           AND COALESCE(product_sales, 0) >= $4 \
           AND COALESCE(engagements, 0) >= $5 \
         ORDER BY id",
    )
    .bind(filter.campaign_type.as_deref())
    .bind(filter.influencer_category.as_deref())
    .bind(filter.platform.map(Platform::as_str))
    .bind(filter.min_product_sales)
    .bind(filter.min_engagements)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(PerformanceRecord::try_from).collect()
}

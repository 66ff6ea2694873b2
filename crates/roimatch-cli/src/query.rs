//! Read-only commands: model-driven recommendations and heuristic
//! historical rankings.

use roimatch_core::{AppConfig, Recommendation};
use roimatch_model::{
    rank_by_kpis, HistoricalFilter, HistoricalPick, Ranked, RecommendationRequest,
    RecommendationService,
};

pub(crate) fn format_recommendations(recs: &[Recommendation]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<4} {:<10} {:<6} {:>10} {:>14} {:>9}",
        "rank", "platform", "tier", "budget", "pred_sales", "roi_%"
    )];
    lines.extend(recs.iter().map(|r| {
        format!(
            "{:<4} {:<10} {:<6} {:>10} {:>14.2} {:>9.2}",
            r.rank,
            r.platform.to_string(),
            r.influencer_tier.to_string(),
            r.budget,
            r.predicted_sales,
            r.predicted_roi
        )
    }));
    lines
}

pub(crate) fn format_top_campaigns(ranked: &[Ranked<HistoricalPick>]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<4} {:<16} {:<10} {:<14} {:>12} {:>9}",
        "rank", "campaign", "platform", "category", "kpi_score", "roi_%"
    )];
    lines.extend(ranked.iter().map(|r| {
        let record = &r.item.record;
        format!(
            "{:<4} {:<16} {:<10} {:<14} {:>12.1} {:>9.2}",
            r.rank,
            record.campaign_id,
            record.platform.to_string(),
            record.influencer_category,
            r.score,
            r.item.historical_roi
        )
    }));
    lines
}

/// Load the sales model from the configured path and print ranked
/// placements.
pub(crate) fn run_recommend(config: &AppConfig, req: &RecommendationRequest) -> anyhow::Result<()> {
    let service = RecommendationService::from_config(config);
    let status = service.warm();
    tracing::debug!(
        roi_model = status.roi_model,
        sales_model = status.sales_model,
        "models warmed"
    );

    let recs = service.recommend(req)?;
    if recs.is_empty() {
        println!("no candidates match the given platform/tier filters");
        return Ok(());
    }
    for line in format_recommendations(&recs) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) async fn run_top_campaigns(
    pool: &sqlx::PgPool,
    filter: &HistoricalFilter,
    limit: usize,
) -> anyhow::Result<()> {
    let records = roimatch_db::list_performance_matching(pool, filter).await?;
    let ranked = rank_by_kpis(&records, filter, limit);
    if ranked.is_empty() {
        println!("no campaigns match the given filters; `ingest performance` loads history");
        return Ok(());
    }
    for line in format_top_campaigns(&ranked) {
        println!("{line}");
    }
    Ok(())
}

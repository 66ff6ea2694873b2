//! Ordering scored items: model-predicted sales for candidates, or a
//! weighted KPI score over historical performance rows.

use std::cmp::Ordering;

use roimatch_core::{Candidate, HistoricalFilter, PerformanceRecord, Recommendation};
use serde::Serialize;

use crate::error::RecommendError;

const ENGAGEMENT_WEIGHT: f64 = 0.4;
const REACH_WEIGHT: f64 = 0.3;
const SALES_WEIGHT: f64 = 0.3;

/// An item with its score and 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub rank: usize,
    pub score: f64,
    pub item: T,
}

/// Sort descending by score and keep the first `top_k`.
///
/// The sort is stable, so equal scores keep their input order. NaN scores
/// sort after every number.
///
/// # Errors
///
/// Returns [`RecommendError::LengthMismatch`] if `items` and `scores`
/// differ in length.
pub fn rank<T>(
    items: Vec<T>,
    scores: &[f64],
    top_k: usize,
) -> Result<Vec<Ranked<T>>, RecommendError> {
    if items.len() != scores.len() {
        return Err(RecommendError::LengthMismatch {
            items: items.len(),
            scores: scores.len(),
        });
    }

    let mut scored: Vec<(f64, T)> = scores.iter().copied().zip(items).collect();
    scored.sort_by(|a, b| descending_nan_last(a.0, b.0));

    Ok(scored
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(i, (score, item))| Ranked {
            rank: i + 1,
            score,
            item,
        })
        .collect())
}

fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// `(sales - budget) / budget * 100`.
///
/// # Errors
///
/// Returns [`RecommendError::InvalidBudget`] if `budget <= 0`; the formula
/// is never evaluated in that case.
pub fn roi_percent(sales: f64, budget: i64) -> Result<f64, RecommendError> {
    if budget <= 0 {
        return Err(RecommendError::InvalidBudget(budget));
    }
    #[allow(clippy::cast_precision_loss)]
    let budget = budget as f64;
    Ok((sales - budget) / budget * 100.0)
}

/// Rank candidates by predicted sales and attach predicted ROI.
///
/// # Errors
///
/// Returns [`RecommendError::LengthMismatch`] if the prediction count is
/// wrong, or [`RecommendError::InvalidBudget`] for a candidate with a
/// non-positive budget.
pub fn rank_by_model(
    candidates: Vec<Candidate>,
    predicted_sales: &[f64],
    top_k: usize,
) -> Result<Vec<Recommendation>, RecommendError> {
    if let Some(bad) = candidates.iter().find(|c| c.budget <= 0) {
        return Err(RecommendError::InvalidBudget(bad.budget));
    }
    rank(candidates, predicted_sales, top_k)?
        .into_iter()
        .map(|r| {
            Ok(Recommendation {
                rank: r.rank,
                predicted_roi: roi_percent(r.score, r.item.budget)?,
                predicted_sales: r.score,
                platform: r.item.platform,
                influencer_tier: r.item.influencer_tier,
                budget: r.item.budget,
            })
        })
        .collect()
}

/// A historical row chosen by KPI ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalPick {
    #[serde(flatten)]
    pub record: PerformanceRecord,
    pub historical_roi: f64,
}

/// `0.4·engagements + 0.3·estimated_reach + 0.3·product_sales`, missing
/// values as zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn kpi_score(r: &PerformanceRecord) -> f64 {
    ENGAGEMENT_WEIGHT * r.engagements.unwrap_or(0) as f64
        + REACH_WEIGHT * r.estimated_reach.unwrap_or(0) as f64
        + SALES_WEIGHT * r.product_sales.unwrap_or(0.0)
}

/// Filter historical rows, score them by KPIs, and keep the best `top_n`.
#[must_use]
pub fn rank_by_kpis(
    records: &[PerformanceRecord],
    filter: &HistoricalFilter,
    top_n: usize,
) -> Vec<Ranked<HistoricalPick>> {
    let (picks, scores): (Vec<HistoricalPick>, Vec<f64>) = records
        .iter()
        .filter(|r| filter.accepts(r))
        .map(|r| {
            (
                HistoricalPick {
                    record: r.clone(),
                    historical_roi: r.historical_roi(),
                },
                kpi_score(r),
            )
        })
        .unzip();

    // Lengths come from the same iterator.
    rank(picks, &scores, top_n).unwrap_or_default()
}

#[cfg(test)]
#[path = "ranking_test.rs"]
mod tests;

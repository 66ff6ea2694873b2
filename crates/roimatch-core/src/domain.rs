//! Typed records shared by the ingestion, training, and serving layers.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{CoreError, Platform, Tier};

/// A content-publishing account, normalized from a raw profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub id: i64,
    pub username: String,
    pub follower_count: u64,
    /// Niche name from the configured keyword sets, e.g. `"Beauty"`.
    pub niche: String,
    pub platform: Platform,
    /// At most 500 characters.
    pub bio: String,
}

/// A brand campaign, normalized from a raw brand profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub brand_name: String,
    pub product_category: String,
    /// Always positive.
    pub budget: i64,
    /// At most 200 characters.
    pub content_requirements: String,
}

/// One row of the historical campaign performance dataset.
///
/// Numeric KPIs are optional because the source CSV has gaps; consumers
/// decide whether a gap means "zero" or "exclude".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub campaign_id: String,
    pub platform: Platform,
    pub influencer_category: String,
    pub campaign_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub engagements: Option<i64>,
    pub estimated_reach: Option<i64>,
    pub product_sales: Option<f64>,
    pub budget: Option<i64>,
    pub duration_days: Option<i32>,
    pub end_date: Option<NaiveDate>,
}

impl PerformanceRecord {
    /// Returns the budget only when it is strictly positive.
    #[must_use]
    pub fn positive_budget(&self) -> Option<i64> {
        self.budget.filter(|b| *b > 0)
    }

    /// Observed ROI as a percentage of budget.
    ///
    /// Returns `0.0` when the budget is missing or not positive, and treats
    /// missing sales as zero.
    #[must_use]
    pub fn historical_roi(&self) -> f64 {
        match self.positive_budget() {
            #[allow(clippy::cast_precision_loss)]
            Some(budget) => {
                let budget = budget as f64;
                (self.product_sales.unwrap_or(0.0) - budget) / budget * 100.0
            }
            None => 0.0,
        }
    }
}

/// Equality and threshold filters over historical performance rows.
/// Missing numeric values count as zero against the thresholds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalFilter {
    pub campaign_type: Option<String>,
    pub influencer_category: Option<String>,
    pub platform: Option<Platform>,
    pub min_product_sales: f64,
    pub min_engagements: i64,
}

impl HistoricalFilter {
    #[must_use]
    pub fn accepts(&self, r: &PerformanceRecord) -> bool {
        if let Some(t) = &self.campaign_type {
            if r.campaign_type.as_deref() != Some(t.as_str()) {
                return false;
            }
        }
        if let Some(c) = &self.influencer_category {
            if &r.influencer_category != c {
                return false;
            }
        }
        if self.platform.is_some_and(|p| p != r.platform) {
            return false;
        }
        r.product_sales.unwrap_or(0.0) >= self.min_product_sales
            && r.engagements.unwrap_or(0) >= self.min_engagements
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Observed,
    Synthetic,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::Observed => write!(f, "observed"),
            MatchMethod::Synthetic => write!(f, "synthetic"),
        }
    }
}

impl FromStr for MatchMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "observed" => Ok(MatchMethod::Observed),
            "synthetic" => Ok(MatchMethod::Synthetic),
            _ => Err(CoreError::InvalidMatchMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    Completed,
}

impl std::fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchOutcome::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for MatchOutcome {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(MatchOutcome::Completed),
            _ => Err(CoreError::InvalidMatchOutcome(s.to_string())),
        }
    }
}

/// A sponsored-content outcome linked to a creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub creator_id: i64,
    pub method: MatchMethod,
    pub actual_roi: f64,
    pub outcome: MatchOutcome,
}

/// One hypothetical platform + tier + budget combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub platform: Platform,
    pub influencer_tier: Tier,
    pub budget: i64,
}

/// A scored candidate with its position in the ranked output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub rank: usize,
    pub platform: Platform,
    pub influencer_tier: Tier,
    pub budget: i64,
    pub predicted_sales: f64,
    /// `(predicted_sales - budget) / budget * 100`.
    pub predicted_roi: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(budget: Option<i64>, sales: Option<f64>) -> PerformanceRecord {
        PerformanceRecord {
            campaign_id: "c-1".to_string(),
            platform: Platform::Instagram,
            influencer_category: "Beauty".to_string(),
            campaign_type: None,
            start_date: None,
            engagements: None,
            estimated_reach: None,
            product_sales: sales,
            budget,
            duration_days: None,
            end_date: None,
        }
    }

    #[test]
    fn historical_roi_uses_sales_over_budget() {
        let r = record(Some(5_000), Some(20_000.0));
        assert!((r.historical_roi() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn historical_roi_is_zero_without_positive_budget() {
        assert_eq!(record(None, Some(100.0)).historical_roi(), 0.0);
        assert_eq!(record(Some(0), Some(100.0)).historical_roi(), 0.0);
        assert_eq!(record(Some(-10), Some(100.0)).historical_roi(), 0.0);
    }

    #[test]
    fn match_method_round_trips_through_display() {
        for method in [MatchMethod::Observed, MatchMethod::Synthetic] {
            assert_eq!(method.to_string().parse::<MatchMethod>().unwrap(), method);
        }
        assert!("Synthetic_Random".parse::<MatchMethod>().is_err());
    }

    #[test]
    fn recommendation_serializes_platform_and_tier_names() {
        let rec = Recommendation {
            rank: 1,
            platform: Platform::TikTok,
            influencer_tier: Tier::Micro,
            budget: 5_000,
            predicted_sales: 20_000.0,
            predicted_roi: 300.0,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["platform"], "TikTok");
        assert_eq!(json["influencer_tier"], "Micro");
        assert_eq!(json["rank"], 1);
    }
}

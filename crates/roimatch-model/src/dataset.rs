//! Flattening typed records into feature tables and label vectors.

use std::collections::HashMap;

use roimatch_core::{Candidate, Creator, Match, MatchMethod, PerformanceRecord};

use crate::artifact::LabelSource;
use crate::error::ModelError;
use crate::table::{Column, FeatureSchema, FeatureTable};

pub const NICHE: &str = "niche";
pub const PLATFORM: &str = "platform";
pub const FOLLOWER_COUNT: &str = "follower_count";
pub const INFLUENCER_CATEGORY: &str = "influencer_category";
pub const BUDGET: &str = "budget";
pub const CAMPAIGN_TYPE: &str = "campaign_type";
pub const ESTIMATED_REACH: &str = "estimated_reach";

/// Placeholder category for a missing campaign type.
const UNKNOWN: &str = "unknown";

/// Features, labels, and the number of input rows left out.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub schema: FeatureSchema,
    pub table: FeatureTable,
    pub labels: Vec<f64>,
    pub excluded: usize,
    /// Provenance of the labels that made it into the table.
    pub label_source: LabelSource,
}

impl Dataset {
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[must_use]
pub fn creator_schema() -> FeatureSchema {
    FeatureSchema::new(&[NICHE, PLATFORM], &[FOLLOWER_COUNT])
}

/// Join matches to creators on `creator_id`. Matches whose creator is not in
/// `creators` are excluded and counted, never imputed.
///
/// # Errors
///
/// Only fails if the assembled columns disagree in length, which indicates a
/// bug rather than bad input.
#[allow(clippy::cast_precision_loss)]
pub fn build_creator_dataset(
    creators: &[Creator],
    matches: &[Match],
) -> Result<Dataset, ModelError> {
    let by_id: HashMap<i64, &Creator> = creators.iter().map(|c| (c.id, c)).collect();

    let mut niches = Vec::with_capacity(matches.len());
    let mut platforms = Vec::with_capacity(matches.len());
    let mut followers = Vec::with_capacity(matches.len());
    let mut labels = Vec::with_capacity(matches.len());
    let mut excluded = 0;

    let mut joined = Vec::with_capacity(matches.len());

    for m in matches {
        let Some(creator) = by_id.get(&m.creator_id) else {
            excluded += 1;
            continue;
        };
        if !m.actual_roi.is_finite() {
            excluded += 1;
            continue;
        }
        joined.push(m);
        niches.push(creator.niche.clone());
        platforms.push(creator.platform.to_string());
        followers.push(creator.follower_count as f64);
        labels.push(m.actual_roi);
    }

    let table = FeatureTable::new()
        .with(NICHE, Column::Categorical(niches))?
        .with(PLATFORM, Column::Categorical(platforms))?
        .with(FOLLOWER_COUNT, Column::Numeric(followers))?;

    Ok(Dataset {
        schema: creator_schema(),
        table,
        labels,
        excluded,
        label_source: label_source_for(joined),
    })
}

/// Which performance columns feed the sales model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerformanceFeatures {
    /// platform, influencer_category, budget.
    #[default]
    Basic,
    /// Basic plus campaign_type and estimated_reach.
    Extended,
}

impl PerformanceFeatures {
    #[must_use]
    pub fn schema(self) -> FeatureSchema {
        match self {
            PerformanceFeatures::Basic => {
                FeatureSchema::new(&[PLATFORM, INFLUENCER_CATEGORY], &[BUDGET])
            }
            PerformanceFeatures::Extended => FeatureSchema::new(
                &[PLATFORM, INFLUENCER_CATEGORY, CAMPAIGN_TYPE],
                &[BUDGET, ESTIMATED_REACH],
            ),
        }
    }
}

/// Flatten performance records into a sales dataset.
///
/// Records with a missing or non-positive budget or missing sales are
/// excluded. In [`PerformanceFeatures::Extended`] mode records without
/// `estimated_reach` are excluded too, and a missing campaign type becomes
/// `"unknown"`.
///
/// # Errors
///
/// Only fails if the assembled columns disagree in length.
#[allow(clippy::cast_precision_loss)]
pub fn build_performance_dataset(
    records: &[PerformanceRecord],
    features: PerformanceFeatures,
) -> Result<Dataset, ModelError> {
    let extended = features == PerformanceFeatures::Extended;

    let mut platforms = Vec::with_capacity(records.len());
    let mut categories = Vec::with_capacity(records.len());
    let mut budgets = Vec::with_capacity(records.len());
    let mut campaign_types = Vec::new();
    let mut reaches = Vec::new();
    let mut labels = Vec::with_capacity(records.len());
    let mut excluded = 0;

    for r in records {
        let (Some(budget), Some(sales)) = (r.positive_budget(), r.product_sales) else {
            excluded += 1;
            continue;
        };
        if !sales.is_finite() {
            excluded += 1;
            continue;
        }
        if extended {
            let Some(reach) = r.estimated_reach else {
                excluded += 1;
                continue;
            };
            reaches.push(reach as f64);
            campaign_types.push(
                r.campaign_type
                    .clone()
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            );
        }
        platforms.push(r.platform.to_string());
        categories.push(r.influencer_category.clone());
        budgets.push(budget as f64);
        labels.push(sales);
    }

    let mut table = FeatureTable::new()
        .with(PLATFORM, Column::Categorical(platforms))?
        .with(INFLUENCER_CATEGORY, Column::Categorical(categories))?
        .with(BUDGET, Column::Numeric(budgets))?;
    if extended {
        table.insert(CAMPAIGN_TYPE, Column::Categorical(campaign_types))?;
        table.insert(ESTIMATED_REACH, Column::Numeric(reaches))?;
    }

    Ok(Dataset {
        schema: features.schema(),
        table,
        labels,
        excluded,
        label_source: LabelSource::Historical,
    })
}

/// Feature rows for recommendation candidates. The tier name is presented
/// as the influencer category, matching the basic sales schema.
///
/// # Errors
///
/// Only fails if the assembled columns disagree in length.
#[allow(clippy::cast_precision_loss)]
pub fn candidate_table(candidates: &[Candidate]) -> Result<FeatureTable, ModelError> {
    FeatureTable::new()
        .with(
            PLATFORM,
            Column::Categorical(candidates.iter().map(|c| c.platform.to_string()).collect()),
        )?
        .with(
            INFLUENCER_CATEGORY,
            Column::Categorical(
                candidates
                    .iter()
                    .map(|c| c.influencer_tier.to_string())
                    .collect(),
            ),
        )?
        .with(
            BUDGET,
            Column::Numeric(candidates.iter().map(|c| c.budget as f64).collect()),
        )
}

/// Provenance of a set of match labels.
#[must_use]
pub fn label_source_for<'a>(matches: impl IntoIterator<Item = &'a Match>) -> LabelSource {
    let (total, observed) = matches.into_iter().fold((0usize, 0usize), |(total, observed), m| {
        (total + 1, observed + usize::from(m.method == MatchMethod::Observed))
    });
    match observed {
        0 => LabelSource::Synthetic,
        n if n == total => LabelSource::Observed,
        _ => LabelSource::Mixed,
    }
}

//! Linking sponsored-post observations to creators.
//!
//! Observations that carry a measured ROI are joined to their creator by
//! username. The rest get a synthetic ROI and a creator sampled uniformly
//! with replacement; sampling is independent of the post's author.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use rand::Rng;
use roimatch_core::{Creator, Match, MatchMethod, MatchOutcome};

use crate::error::LinkError;

/// One row of the post-info file.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub post_id: String,
    pub username: String,
    pub is_sponsored: bool,
    pub observed_roi: Option<f64>,
}

/// Result of a linkage run.
#[derive(Debug, Clone, Default)]
pub struct Linked {
    pub matches: Vec<Match>,
    pub observed: usize,
    pub synthetic: usize,
    /// Observed-ROI rows whose username matched no loaded creator.
    pub unresolved: usize,
}

#[derive(Debug, Clone)]
pub struct SyntheticLinker {
    limit: usize,
    roi_range: RangeInclusive<f64>,
}

impl Default for SyntheticLinker {
    fn default() -> Self {
        Self::new(2000, 5.0..=15.0)
    }
}

impl SyntheticLinker {
    /// `limit` caps how many sponsored observations are considered, in file
    /// order. `roi_range` bounds synthetic ROI draws.
    #[must_use]
    pub fn new(limit: usize, roi_range: RangeInclusive<f64>) -> Self {
        Self { limit, roi_range }
    }

    /// Produce matches for the sponsored observations.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::EmptyPopulation`] if `creators` is empty.
    pub fn link<R: Rng>(
        &self,
        observations: &[Observation],
        creators: &[Creator],
        rng: &mut R,
    ) -> Result<Linked, LinkError> {
        if creators.is_empty() {
            return Err(LinkError::EmptyPopulation);
        }

        let by_username: HashMap<&str, i64> = creators
            .iter()
            .map(|c| (c.username.as_str(), c.id))
            .collect();

        let mut linked = Linked::default();

        for obs in observations
            .iter()
            .filter(|o| o.is_sponsored)
            .take(self.limit)
        {
            let (creator_id, actual_roi, method) = if let Some(roi) = obs.observed_roi {
                let Some(&id) = by_username.get(obs.username.as_str()) else {
                    linked.unresolved += 1;
                    continue;
                };
                linked.observed += 1;
                (id, roi, MatchMethod::Observed)
            } else {
                let roi = round_one_decimal(rng.random_range(self.roi_range.clone()));
                let creator = &creators[rng.random_range(0..creators.len())];
                linked.synthetic += 1;
                (creator.id, roi, MatchMethod::Synthetic)
            };

            let id = i64::try_from(linked.matches.len()).map_or(i64::MAX, |n| n + 1);
            linked.matches.push(Match {
                id,
                creator_id,
                method,
                actual_roi,
                outcome: MatchOutcome::Completed,
            });
        }

        tracing::debug!(
            observed = linked.observed,
            synthetic = linked.synthetic,
            unresolved = linked.unresolved,
            "linked sponsored observations"
        );
        Ok(linked)
    }
}

fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

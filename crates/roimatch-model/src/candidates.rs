use roimatch_core::{Candidate, Platform, Tier};

use crate::error::RecommendError;

/// Every platform × tier combination at `budget`, platform-major.
///
/// The enumeration order is the tie-break order used by ranking.
///
/// # Errors
///
/// Returns [`RecommendError::InvalidBudget`] if `budget <= 0`.
pub fn generate(
    budget: i64,
    platforms: &[Platform],
    tiers: &[Tier],
) -> Result<Vec<Candidate>, RecommendError> {
    if budget <= 0 {
        return Err(RecommendError::InvalidBudget(budget));
    }
    Ok(platforms
        .iter()
        .flat_map(|&platform| {
            tiers.iter().map(move |&influencer_tier| Candidate {
                platform,
                influencer_tier,
                budget,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sets_give_sixteen_candidates() {
        let candidates = generate(5000, &Platform::CANDIDATES, &Tier::ALL).unwrap();
        assert_eq!(candidates.len(), 16);
        assert!(candidates.iter().all(|c| c.budget == 5000));
    }

    #[test]
    fn order_is_platform_major_tier_minor() {
        let candidates = generate(
            100,
            &[Platform::YouTube, Platform::TikTok],
            &[Tier::Nano, Tier::Mega],
        )
        .unwrap();
        let pairs: Vec<(Platform, Tier)> = candidates
            .iter()
            .map(|c| (c.platform, c.influencer_tier))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (Platform::YouTube, Tier::Nano),
                (Platform::YouTube, Tier::Mega),
                (Platform::TikTok, Tier::Nano),
                (Platform::TikTok, Tier::Mega),
            ]
        );
    }

    #[test]
    fn non_positive_budget_is_rejected() {
        assert!(matches!(
            generate(0, &Platform::CANDIDATES, &Tier::ALL),
            Err(RecommendError::InvalidBudget(0))
        ));
        assert!(matches!(
            generate(-5, &Platform::CANDIDATES, &Tier::ALL),
            Err(RecommendError::InvalidBudget(-5))
        ));
    }

    #[test]
    fn empty_sets_give_no_candidates() {
        assert!(generate(10, &[], &Tier::ALL).unwrap().is_empty());
    }
}

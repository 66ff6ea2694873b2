use rand::rngs::StdRng;
use rand::SeedableRng;
use roimatch_core::NicheConfig;

use super::*;

fn beauty_niches() -> NichesFile {
    NichesFile {
        niches: vec![
            NicheConfig {
                name: "Beauty".to_string(),
                product_category: "Beauty/Skincare".to_string(),
                keywords: vec!["beauty".into(), "skin".into(), "makeup".into()],
            },
            NicheConfig {
                name: "Fitness".to_string(),
                product_category: "Fitness/Supplements".to_string(),
                keywords: vec!["gym".into(), "skin".into()],
            },
        ],
    }
}

fn raw(identity: &str, followers: &str, bio: &str) -> RawProfile {
    RawProfile {
        identity: identity.to_string(),
        followers: followers.to_string(),
        bio: bio.to_string(),
        budget: None,
    }
}

fn creator_config(niches: &NichesFile) -> CreatorNormalizeConfig<'_> {
    CreatorNormalizeConfig {
        niches,
        platform: Platform::Instagram,
    }
}

#[test]
fn creators_keep_only_keyword_matches_and_assign_first_niche() {
    let niches = beauty_niches();
    let input = vec![
        raw("alice", "1200", "Daily SKIN routine"),
        raw("bob", "900", "Gym every day"),
        raw("carol", "50", "Cooking and travel"),
    ];
    let out = normalize_creators(&input, &creator_config(&niches));

    assert_eq!(out.records.len(), 2);
    assert_eq!(out.filtered, 1);
    assert_eq!(out.records[0].niche, "Beauty");
    assert_eq!(out.records[1].niche, "Fitness");
    assert_eq!(out.records[0].platform, Platform::Instagram);
}

#[test]
fn creator_duplicates_keep_first_seen() {
    let niches = beauty_niches();
    let input = vec![
        raw("alice", "100", "beauty one"),
        raw("alice", "999", "beauty two"),
    ];
    let out = normalize_creators(&input, &creator_config(&niches));

    assert_eq!(out.records.len(), 1);
    assert_eq!(out.duplicates, 1);
    assert_eq!(out.records[0].follower_count, 100);
    assert_eq!(out.records[0].bio, "beauty one");
}

#[test]
fn non_numeric_followers_coerce_to_zero() {
    let niches = beauty_niches();
    let input = vec![
        raw("a", "12k", "beauty"),
        raw("b", "-5", "beauty"),
        raw("c", "", "beauty"),
        raw("d", "99999999999999999999999", "beauty"),
        raw("e", "42", "beauty"),
    ];
    let out = normalize_creators(&input, &creator_config(&niches));
    let counts: Vec<u64> = out.records.iter().map(|c| c.follower_count).collect();
    assert_eq!(counts, vec![0, 0, 0, 0, 42]);
}

#[test]
fn empty_identity_is_malformed() {
    let niches = beauty_niches();
    let out = normalize_creators(&[raw("", "1", "beauty")], &creator_config(&niches));
    assert!(out.records.is_empty());
    assert_eq!(out.malformed, 1);
}

#[test]
fn bio_truncates_on_character_boundary() {
    let niches = beauty_niches();
    let bio = format!("beauty {}", "é".repeat(600));
    let out = normalize_creators(&[raw("a", "1", &bio)], &creator_config(&niches));
    let kept = &out.records[0].bio;
    assert_eq!(kept.chars().count(), MAX_BIO_CHARS);
    assert!(kept.starts_with("beauty "));
}

#[test]
fn creator_ids_are_provisional_sequence() {
    let niches = beauty_niches();
    let input = vec![
        raw("a", "1", "beauty"),
        raw("x", "1", "nothing"),
        raw("b", "1", "makeup"),
    ];
    let out = normalize_creators(&input, &creator_config(&niches));
    let ids: Vec<i64> = out.records.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn campaigns_take_category_from_matching_niche_and_dedup_by_brand() {
    let niches = beauty_niches();
    let mut rng = StdRng::seed_from_u64(42);
    let config = CampaignNormalizeConfig {
        niches: &niches,
        budget: BudgetPolicy::Simulate {
            min: 1000,
            max: 10_000,
        },
    };
    let input = vec![
        raw("GlowCo", "10", "Korean skincare and makeup"),
        raw("GlowCo", "10", "a second makeup listing"),
        raw("IronWorks", "10", "gym equipment"),
        raw("Bakery", "10", "bread"),
    ];
    let out = normalize_campaigns(&input, &config, &mut rng);

    assert_eq!(out.records.len(), 2);
    assert_eq!(out.duplicates, 1);
    assert_eq!(out.filtered, 1);
    assert_eq!(out.records[0].product_category, "Beauty/Skincare");
    assert_eq!(out.records[1].product_category, "Fitness/Supplements");
    for c in &out.records {
        assert!((1000..=10_000).contains(&c.budget), "budget {}", c.budget);
    }
}

#[test]
fn simulated_budgets_are_deterministic_for_a_seed() {
    let niches = beauty_niches();
    let config = CampaignNormalizeConfig {
        niches: &niches,
        budget: BudgetPolicy::Simulate {
            min: 1000,
            max: 10_000,
        },
    };
    let input: Vec<RawProfile> = (0..20)
        .map(|i| raw(&format!("brand{i}"), "1", "beauty"))
        .collect();

    let a = normalize_campaigns(&input, &config, &mut StdRng::seed_from_u64(7));
    let b = normalize_campaigns(&input, &config, &mut StdRng::seed_from_u64(7));
    let budgets_a: Vec<i64> = a.records.iter().map(|c| c.budget).collect();
    let budgets_b: Vec<i64> = b.records.iter().map(|c| c.budget).collect();
    assert_eq!(budgets_a, budgets_b);
}

#[test]
fn explicit_budget_wins_and_required_policy_skips_missing() {
    let niches = beauty_niches();
    let config = CampaignNormalizeConfig {
        niches: &niches,
        budget: BudgetPolicy::Require,
    };
    let mut with_budget = raw("Explicit", "1", "beauty");
    with_budget.budget = Some("2500".to_string());
    let mut zero_budget = raw("Zero", "1", "beauty");
    zero_budget.budget = Some("0".to_string());
    let input = vec![with_budget, raw("Missing", "1", "beauty"), zero_budget];

    let out = normalize_campaigns(&input, &config, &mut StdRng::seed_from_u64(1));
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].budget, 2500);
    assert_eq!(out.malformed, 2);
}

#[test]
fn content_requirements_truncate_to_200_chars() {
    let niches = beauty_niches();
    let config = CampaignNormalizeConfig {
        niches: &niches,
        budget: BudgetPolicy::Simulate { min: 1, max: 1 },
    };
    let long = format!("beauty {}", "x".repeat(400));
    let out = normalize_campaigns(&[raw("B", "1", &long)], &config, &mut StdRng::seed_from_u64(0));
    assert_eq!(
        out.records[0].content_requirements.chars().count(),
        MAX_CONTENT_REQUIREMENT_CHARS
    );
    assert_eq!(out.records[0].budget, 1);
}

#[test]
fn truncate_chars_leaves_short_strings_alone() {
    assert_eq!(truncate_chars("abc", 5), "abc");
    assert_eq!(truncate_chars("한국어입니다", 3), "한국어");
}

//! Normalization from raw profile lines to [`Creator`] and [`Campaign`]
//! records.
//!
//! Both normalizers are pure apart from the injected random source used for
//! budget simulation. Output ids are provisional (`1..=n` in output order);
//! persistence assigns the real ones.

use std::collections::HashSet;

use rand::Rng;
use roimatch_core::{Campaign, Creator, NichesFile, Platform};

use crate::source::RawProfile;

pub const MAX_BIO_CHARS: usize = 500;
pub const MAX_CONTENT_REQUIREMENT_CHARS: usize = 200;

/// Normalized output plus per-reason skip counters.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    /// Empty identity, unusable budget, or similar record-level defects.
    pub malformed: usize,
    /// Records whose text matched no configured niche.
    pub filtered: usize,
    /// Later occurrences of an already-seen key.
    pub duplicates: usize,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            malformed: 0,
            filtered: 0,
            duplicates: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CreatorNormalizeConfig<'a> {
    pub niches: &'a NichesFile,
    /// Platform the profile directory was collected from.
    pub platform: Platform,
}

/// How campaigns without an explicit budget field are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetPolicy {
    /// Draw uniformly from `min..=max`.
    Simulate { min: i64, max: i64 },
    /// Skip the record as malformed.
    Require,
}

#[derive(Debug, Clone, Copy)]
pub struct CampaignNormalizeConfig<'a> {
    pub niches: &'a NichesFile,
    pub budget: BudgetPolicy,
}

/// Normalize raw creator profiles.
///
/// Keeps profiles whose bio matches a niche keyword; the first matching niche
/// becomes the creator's niche. Deduplicates on `(username, platform)`, first
/// seen wins.
#[must_use]
pub fn normalize_creators(
    raw: &[RawProfile],
    config: &CreatorNormalizeConfig<'_>,
) -> Normalized<Creator> {
    let mut out = Normalized::default();
    let mut seen: HashSet<(String, Platform)> = HashSet::new();

    for profile in raw {
        if profile.identity.is_empty() {
            out.malformed += 1;
            continue;
        }

        let Some(niche) = config.niches.classify(&profile.bio) else {
            out.filtered += 1;
            continue;
        };

        if !seen.insert((profile.identity.clone(), config.platform)) {
            out.duplicates += 1;
            continue;
        }

        out.records.push(Creator {
            id: next_id(out.records.len()),
            username: profile.identity.clone(),
            follower_count: parse_follower_count(&profile.followers),
            niche: niche.name.clone(),
            platform: config.platform,
            bio: truncate_chars(&profile.bio, MAX_BIO_CHARS),
        });
    }

    out
}

/// Normalize raw brand profiles into campaigns.
///
/// Keeps profiles whose description matches any niche keyword and takes
/// `product_category` from that niche. Deduplicates on brand name, first seen
/// wins. Budget draws happen only for records that survive filtering and
/// deduplication, so the random sequence depends on kept records alone.
pub fn normalize_campaigns<R: Rng>(
    raw: &[RawProfile],
    config: &CampaignNormalizeConfig<'_>,
    rng: &mut R,
) -> Normalized<Campaign> {
    let mut out = Normalized::default();
    let mut seen: HashSet<String> = HashSet::new();

    for profile in raw {
        if profile.identity.is_empty() {
            out.malformed += 1;
            continue;
        }

        let Some(niche) = config.niches.classify(&profile.bio) else {
            out.filtered += 1;
            continue;
        };

        if seen.contains(&profile.identity) {
            out.duplicates += 1;
            continue;
        }

        let explicit = profile
            .budget
            .as_deref()
            .and_then(|b| b.parse::<i64>().ok())
            .filter(|b| *b > 0);

        let budget = match (explicit, config.budget) {
            (Some(b), _) => b,
            (None, BudgetPolicy::Simulate { min, max }) => rng.random_range(min..=max),
            (None, BudgetPolicy::Require) => {
                out.malformed += 1;
                continue;
            }
        };

        seen.insert(profile.identity.clone());
        out.records.push(Campaign {
            id: next_id(out.records.len()),
            brand_name: profile.identity.clone(),
            product_category: niche.product_category.clone(),
            budget,
            content_requirements: truncate_chars(&profile.bio, MAX_CONTENT_REQUIREMENT_CHARS),
        });
    }

    out
}

/// All-ASCII-digit strings parse as a count; anything else (including
/// overflow) coerces to zero.
fn parse_follower_count(raw: &str) -> u64 {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.parse().unwrap_or(0)
    } else {
        0
    }
}

/// Truncate to at most `max` characters without splitting a code point.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

fn next_id(len: usize) -> i64 {
    i64::try_from(len).map_or(i64::MAX, |n| n + 1)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

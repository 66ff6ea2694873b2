//! `ingest` subcommands: raw profile directories, post observations, and
//! historical performance CSVs into the database.

use std::path::Path;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use roimatch_core::{AppConfig, Campaign, Creator, NichesFile, Platform};
use roimatch_db::RunType;
use roimatch_ingest::{
    load_profile_batch_or_empty, normalize_campaigns, normalize_creators, read_post_info,
    BudgetPolicy, CampaignNormalizeConfig, CreatorNormalizeConfig, Normalized, ObservationBatch,
    SyntheticLinker,
};

use crate::runs::{record_count, tracked};

pub(crate) fn budget_policy(simulation_mode: bool, min: i64, max: i64) -> BudgetPolicy {
    if simulation_mode {
        BudgetPolicy::Simulate { min, max }
    } else {
        BudgetPolicy::Require
    }
}

/// Read and normalize a creator profile directory. A missing directory
/// yields an empty result.
pub(crate) fn prepare_creators(
    dir: &Path,
    platform: Platform,
    niches: &NichesFile,
    max_files: usize,
) -> Normalized<Creator> {
    let batch = load_profile_batch_or_empty(dir, max_files);
    let mut normalized =
        normalize_creators(&batch.records, &CreatorNormalizeConfig { niches, platform });
    normalized.malformed += batch.malformed;
    tracing::info!(
        dir = %dir.display(),
        kept = normalized.records.len(),
        malformed = normalized.malformed,
        filtered = normalized.filtered,
        duplicates = normalized.duplicates,
        "normalized creator profiles"
    );
    normalized
}

/// Read and normalize a brand profile directory into campaigns.
pub(crate) fn prepare_campaigns(
    dir: &Path,
    niches: &NichesFile,
    budget: BudgetPolicy,
    max_files: usize,
    seed: u64,
) -> Normalized<Campaign> {
    let batch = load_profile_batch_or_empty(dir, max_files);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut normalized = normalize_campaigns(
        &batch.records,
        &CampaignNormalizeConfig { niches, budget },
        &mut rng,
    );
    normalized.malformed += batch.malformed;
    tracing::info!(
        dir = %dir.display(),
        kept = normalized.records.len(),
        malformed = normalized.malformed,
        filtered = normalized.filtered,
        duplicates = normalized.duplicates,
        "normalized brand profiles"
    );
    normalized
}

pub(crate) fn summary_line<T>(label: &str, normalized: &Normalized<T>) -> String {
    format!(
        "{label}: {} kept, {} malformed, {} filtered, {} duplicate(s)",
        normalized.records.len(),
        normalized.malformed,
        normalized.filtered,
        normalized.duplicates
    )
}

fn load_niches(config: &AppConfig) -> anyhow::Result<NichesFile> {
    roimatch_core::load_niches(&config.niches_path)
        .with_context(|| format!("loading niches from {}", config.niches_path.display()))
}

pub(crate) async fn run_ingest_creators(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    dir: &Path,
    platform: Platform,
    dry_run: bool,
) -> anyhow::Result<()> {
    let niches = load_niches(config)?;
    let normalized = prepare_creators(dir, platform, &niches, config.creator_file_limit);
    println!("{}", summary_line("creators", &normalized));

    if dry_run {
        println!("dry run: nothing written");
        return Ok(());
    }

    let inserted = tracked(pool, RunType::Creators, async {
        let n = roimatch_db::insert_creators(pool, &normalized.records).await?;
        Ok((n, record_count(n)))
    })
    .await?;
    println!("inserted {inserted} creator(s)");
    Ok(())
}

pub(crate) async fn run_ingest_campaigns(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    dir: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let niches = load_niches(config)?;
    let policy = budget_policy(
        config.simulation_mode,
        config.campaign_budget_min,
        config.campaign_budget_max,
    );
    let normalized = prepare_campaigns(
        dir,
        &niches,
        policy,
        config.campaign_file_limit,
        config.seed,
    );
    println!("{}", summary_line("campaigns", &normalized));

    if dry_run {
        println!("dry run: nothing written");
        return Ok(());
    }

    let inserted = tracked(pool, RunType::Campaigns, async {
        let n = roimatch_db::insert_campaigns(pool, &normalized.records).await?;
        Ok((n, record_count(n)))
    })
    .await?;
    println!("inserted {inserted} campaign(s)");
    Ok(())
}

/// Link sponsored posts to the creators already stored.
///
/// An unreadable post file is logged and treated as empty; an empty creator
/// table fails the run.
pub(crate) async fn run_ingest_matches(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    posts: &Path,
) -> anyhow::Result<()> {
    let batch = read_post_info(posts).unwrap_or_else(|e| {
        tracing::warn!(path = %posts.display(), error = %e, "post source unavailable; continuing with empty batch");
        ObservationBatch::default()
    });
    let linker = SyntheticLinker::new(
        config.link_limit,
        config.synthetic_roi_min..=config.synthetic_roi_max,
    );
    let mut rng = StdRng::seed_from_u64(config.seed);

    let inserted = tracked(pool, RunType::Matches, async {
        let creators = roimatch_db::list_creators(pool).await?;
        let linked = linker.link(&batch.observations, &creators, &mut rng)?;
        tracing::info!(
            observations = batch.observations.len(),
            malformed = batch.malformed,
            observed = linked.observed,
            synthetic = linked.synthetic,
            unresolved = linked.unresolved,
            "linked sponsored posts"
        );
        let n = roimatch_db::insert_matches(pool, &linked.matches).await?;
        Ok((n, record_count(n)))
    })
    .await?;
    println!("inserted {inserted} match(es)");
    Ok(())
}

/// Replace `campaign_performance` with the rows of `csv`.
///
/// Unlike the profile readers, a missing CSV is an error here: treating it as
/// empty would truncate the table.
pub(crate) async fn run_ingest_performance(
    pool: &sqlx::PgPool,
    csv: &Path,
    reach_budget_rate: f64,
) -> anyhow::Result<()> {
    if !(reach_budget_rate.is_finite() && reach_budget_rate > 0.0) {
        anyhow::bail!("--reach-budget-rate must be a positive number, got {reach_budget_rate}");
    }
    let batch = roimatch_ingest::read_performance_csv(csv, reach_budget_rate)?;
    tracing::info!(
        path = %csv.display(),
        records = batch.records.len(),
        malformed = batch.malformed,
        derived_budgets = batch.derived_budgets,
        "parsed performance csv"
    );

    let inserted = tracked(pool, RunType::Performance, async {
        let n = roimatch_db::replace_performance_records(pool, &batch.records).await?;
        Ok((n, record_count(n)))
    })
    .await?;
    println!(
        "loaded {inserted} performance record(s); {} malformed, {} budget(s) derived from reach",
        batch.malformed, batch.derived_budgets
    );
    Ok(())
}

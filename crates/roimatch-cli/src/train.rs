//! `train` subcommands. Each reads its training rows from the database,
//! fits with a seeded holdout split, and writes an artifact atomically.

use std::path::Path;

use chrono::Utc;
use roimatch_core::AppConfig;
use roimatch_db::RunType;
use roimatch_model::{
    build_creator_dataset, build_performance_dataset, save_artifact, train_with_holdout,
    ArtifactMetadata, Dataset, ModelKind, PerformanceFeatures, TrainOptions, TrainingReport,
};

use crate::runs::{record_count, tracked};

/// Fit `dataset`, then save the model with its provenance to `path`.
pub(crate) fn train_and_save(
    dataset: &Dataset,
    kind: ModelKind,
    seed: u64,
    path: &Path,
) -> anyhow::Result<TrainingReport> {
    if dataset.is_empty() {
        anyhow::bail!("no training rows for the {kind} model");
    }
    if dataset.excluded > 0 {
        tracing::warn!(excluded = dataset.excluded, %kind, "rows excluded from training set");
    }

    let (model, report) = train_with_holdout(
        &dataset.schema,
        &dataset.table,
        &dataset.labels,
        &TrainOptions::with_seed(seed),
    )?;
    let metadata = ArtifactMetadata {
        kind,
        trained_at: Utc::now(),
        label_source: dataset.label_source,
        report: report.clone(),
    };
    save_artifact(&model, &metadata, path)?;
    Ok(report)
}

fn print_report(kind: ModelKind, path: &Path, report: &TrainingReport) {
    let metric = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"));
    println!(
        "{kind}: trained on {} of {} row(s), held out {}; mse={} r2={}",
        report.train_rows,
        report.rows,
        report.test_rows,
        metric(report.mse),
        metric(report.r2)
    );
    println!("artifact written to {}", path.display());
}

pub(crate) async fn run_train_roi(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    path: &Path,
) -> anyhow::Result<()> {
    let report = tracked(pool, RunType::TrainRoi, async {
        let creators = roimatch_db::list_creators(pool).await?;
        let matches = roimatch_db::list_matches(pool).await?;
        let dataset = build_creator_dataset(&creators, &matches)?;
        let report = train_and_save(&dataset, ModelKind::CreatorRoi, config.seed, path)?;
        let rows = record_count(report.rows);
        Ok((report, rows))
    })
    .await?;

    print_report(ModelKind::CreatorRoi, path, &report);
    Ok(())
}

pub(crate) async fn run_train_sales(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    path: &Path,
    extended: bool,
) -> anyhow::Result<()> {
    let features = if extended {
        PerformanceFeatures::Extended
    } else {
        PerformanceFeatures::Basic
    };

    let report = tracked(pool, RunType::TrainSales, async {
        let records = roimatch_db::list_performance_records(pool).await?;
        let dataset = build_performance_dataset(&records, features)?;
        let report = train_and_save(&dataset, ModelKind::CampaignSales, config.seed, path)?;
        let rows = record_count(report.rows);
        Ok((report, rows))
    })
    .await?;

    println!("features: {features:?}");
    print_report(ModelKind::CampaignSales, path, &report);
    Ok(())
}

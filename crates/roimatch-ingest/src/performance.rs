//! Reader for the historical campaign performance CSV.

use std::path::Path;

use chrono::NaiveDate;
use roimatch_core::{PerformanceRecord, Platform};
use serde::Deserialize;

use crate::error::IngestError;

/// Rate applied to `estimated_reach` when the CSV carries no budget column.
pub const DEFAULT_REACH_BUDGET_RATE: f64 = 0.03;

#[derive(Debug, Clone, Default)]
pub struct PerformanceBatch {
    pub records: Vec<PerformanceRecord>,
    /// Rows that failed to deserialize, named an unknown platform, or
    /// carried a negative or non-finite metric.
    pub malformed: usize,
    /// Rows whose budget was derived from reach.
    pub derived_budgets: usize,
}

#[derive(Debug, Deserialize)]
struct PerformanceRow {
    campaign_id: String,
    platform: String,
    influencer_category: String,
    #[serde(default)]
    campaign_type: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    engagements: Option<f64>,
    #[serde(default)]
    estimated_reach: Option<f64>,
    #[serde(default)]
    product_sales: Option<f64>,
    #[serde(default)]
    budget: Option<f64>,
    #[serde(default)]
    campaign_duration_days: Option<i32>,
    #[serde(default)]
    end_date: Option<String>,
}

impl PerformanceRow {
    /// First metric that is NaN, infinite, or negative.
    fn invalid_metric(&self) -> Option<&'static str> {
        let metrics = [
            ("engagements", self.engagements),
            ("estimated_reach", self.estimated_reach),
            ("product_sales", self.product_sales),
            ("budget", self.budget),
        ];
        let bad_metric = metrics
            .into_iter()
            .find(|(_, v)| v.is_some_and(|v| !v.is_finite() || v < 0.0))
            .map(|(name, _)| name);
        bad_metric.or_else(|| {
            self.campaign_duration_days
                .is_some_and(|d| d < 0)
                .then_some("campaign_duration_days")
        })
    }
}

/// Read a performance CSV from disk.
///
/// # Errors
///
/// Returns [`IngestError::SourceUnavailable`] if the file cannot be opened,
/// or [`IngestError::Csv`] if the header row is unreadable.
pub fn read_performance_csv(
    path: &Path,
    reach_budget_rate: f64,
) -> Result<PerformanceBatch, IngestError> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::SourceUnavailable {
        path: path.display().to_string(),
        source,
    })?;
    parse_performance_csv(file, reach_budget_rate).map_err(|source| IngestError::Csv {
        path: path.display().to_string(),
        source,
    })
}

/// Parse performance rows from any reader with a header row.
///
/// When a row has no budget, it is derived as `estimated_reach * rate`,
/// truncated toward zero.
///
/// # Errors
///
/// Returns a [`csv::Error`] only if the header row cannot be read; bad data
/// rows are counted in [`PerformanceBatch::malformed`].
pub fn parse_performance_csv<R: std::io::Read>(
    reader: R,
    reach_budget_rate: f64,
) -> Result<PerformanceBatch, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    rdr.headers()?;

    let mut batch = PerformanceBatch::default();
    for row in rdr.deserialize::<PerformanceRow>() {
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed performance row");
                batch.malformed += 1;
                continue;
            }
        };

        let Ok(platform) = row.platform.parse::<Platform>() else {
            batch.malformed += 1;
            continue;
        };
        if let Some(field) = row.invalid_metric() {
            tracing::debug!(
                campaign_id = %row.campaign_id,
                field,
                "skipping performance row with a negative or non-finite metric"
            );
            batch.malformed += 1;
            continue;
        }

        let estimated_reach = row.estimated_reach.map(truncate_to_i64);
        let budget = match row.budget {
            Some(b) => Some(truncate_to_i64(b)),
            None => estimated_reach.map(|reach| {
                batch.derived_budgets += 1;
                budget_from_reach(reach, reach_budget_rate)
            }),
        };

        batch.records.push(PerformanceRecord {
            campaign_id: row.campaign_id,
            platform,
            influencer_category: row.influencer_category,
            campaign_type: row.campaign_type.filter(|s| !s.is_empty()),
            start_date: row.start_date.as_deref().and_then(parse_date),
            engagements: row.engagements.map(truncate_to_i64),
            estimated_reach,
            product_sales: row.product_sales,
            budget,
            duration_days: row.campaign_duration_days,
            end_date: row.end_date.as_deref().and_then(parse_date),
        });
    }

    Ok(batch)
}

#[allow(clippy::cast_precision_loss)]
fn budget_from_reach(reach: i64, rate: f64) -> i64 {
    truncate_to_i64(reach as f64 * rate)
}

#[allow(clippy::cast_possible_truncation)]
fn truncate_to_i64(v: f64) -> i64 {
    // `as` saturates and maps NaN to 0.
    v.trunc() as i64
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "campaign_id,platform,influencer_category,campaign_type,start_date,engagements,estimated_reach,product_sales,campaign_duration_days,end_date";

    #[test]
    fn derives_budget_from_reach_when_column_missing() {
        let csv = format!(
            "{HEADER}\n\
             C1,Instagram,Beauty,Product Launch,2023-01-05,1200,100000,5400.5,30,2023-02-04\n\
             C2,tiktok,Fitness,Awareness,2023-03-01,800,33333,,14,2023-03-15\n"
        );
        let batch = parse_performance_csv(csv.as_bytes(), DEFAULT_REACH_BUDGET_RATE).unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.malformed, 0);
        assert_eq!(batch.derived_budgets, 2);
        assert_eq!(batch.records[0].budget, Some(3000));
        assert_eq!(batch.records[1].budget, Some(999));
        assert_eq!(batch.records[1].platform, Platform::TikTok);
        assert_eq!(batch.records[1].product_sales, None);
        assert_eq!(
            batch.records[0].start_date,
            NaiveDate::from_ymd_opt(2023, 1, 5)
        );
    }

    #[test]
    fn explicit_budget_column_is_used() {
        let csv = "campaign_id,platform,influencer_category,estimated_reach,product_sales,budget\n\
                   C1,YouTube,Tech,50000,2000,1234\n";
        let batch = parse_performance_csv(csv.as_bytes(), DEFAULT_REACH_BUDGET_RATE).unwrap();
        assert_eq!(batch.records[0].budget, Some(1234));
        assert_eq!(batch.derived_budgets, 0);
        assert_eq!(batch.records[0].campaign_type, None);
    }

    #[test]
    fn unknown_platform_and_bad_numbers_are_malformed() {
        let csv = format!(
            "{HEADER}\n\
             C1,MySpace,Beauty,Launch,2023-01-05,1,1,1,1,2023-01-06\n\
             C2,Instagram,Beauty,Launch,2023-01-05,lots,1,1,1,2023-01-06\n\
             C3,Facebook,Beauty,Launch,not-a-date,5,100,10,1,\n"
        );
        let batch = parse_performance_csv(csv.as_bytes(), DEFAULT_REACH_BUDGET_RATE).unwrap();
        assert_eq!(batch.malformed, 2);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].start_date, None);
        assert_eq!(batch.records[0].end_date, None);
    }

    #[test]
    fn non_finite_and_negative_metrics_are_malformed() {
        let csv = format!(
            "{HEADER}\n\
             C1,Instagram,Beauty,Launch,2023-01-05,10,100,NaN,1,\n\
             C2,Instagram,Beauty,Launch,2023-01-05,10,inf,50,1,\n\
             C3,Instagram,Beauty,Launch,2023-01-05,-4,100,50,1,\n\
             C4,Instagram,Beauty,Launch,2023-01-05,10,100,-0.5,1,\n\
             C5,Instagram,Beauty,Launch,2023-01-05,10,100,50,-3,\n\
             C6,Instagram,Beauty,Launch,2023-01-05,10,100,50,1,\n"
        );
        let batch = parse_performance_csv(csv.as_bytes(), DEFAULT_REACH_BUDGET_RATE).unwrap();
        assert_eq!(batch.malformed, 5);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].campaign_id, "C6");
        assert_eq!(batch.records[0].product_sales, Some(50.0));
    }

    #[test]
    fn negative_explicit_budget_is_malformed() {
        let csv = "campaign_id,platform,influencer_category,product_sales,budget\n\
                   C1,YouTube,Tech,200,-100\n\
                   C2,YouTube,Tech,200,100\n";
        let batch = parse_performance_csv(csv.as_bytes(), DEFAULT_REACH_BUDGET_RATE).unwrap();
        assert_eq!(batch.malformed, 1);
        assert_eq!(batch.records[0].budget, Some(100));
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = read_performance_csv(Path::new("/no/such/file.csv"), 0.03).unwrap_err();
        assert!(matches!(err, IngestError::SourceUnavailable { .. }));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf.csv");
        std::fs::write(
            &path,
            "campaign_id,platform,influencer_category,product_sales,budget\nC9,Twitter,Gaming,10,5\n",
        )
        .unwrap();
        let batch = read_performance_csv(&path, 0.03).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].platform, Platform::Twitter);
    }
}

//! Pipeline-run bookkeeping shared by ingestion and training commands.

use std::future::Future;

use roimatch_db::RunType;

const TRIGGER_SOURCE: &str = "cli";

/// Create a run, mark it running, drive `work`, and record the outcome.
///
/// `work` resolves to its output plus the number of records processed. A
/// failure to mark the run as failed is logged and never masks the original
/// error.
pub(crate) async fn tracked<T, F>(
    pool: &sqlx::PgPool,
    run_type: RunType,
    work: F,
) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<(T, i32)>>,
{
    let run = roimatch_db::create_pipeline_run(pool, run_type, TRIGGER_SOURCE).await?;

    if let Err(err) = roimatch_db::start_pipeline_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, run_type, format!("{err:#}")).await;
        return Err(err.into());
    }

    match work.await {
        Ok((output, records)) => {
            if let Err(err) = roimatch_db::complete_pipeline_run(pool, run.id, records).await {
                fail_run_best_effort(pool, run.id, run_type, format!("{err:#}")).await;
                return Err(err.into());
            }
            tracing::info!(run_id = run.id, %run_type, records, "pipeline run succeeded");
            Ok(output)
        }
        Err(err) => {
            fail_run_best_effort(pool, run.id, run_type, format!("{err:#}")).await;
            Err(err)
        }
    }
}

/// Attempt to mark a pipeline run as failed, logging any secondary error.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, run_type: RunType, message: String) {
    if let Err(mark_err) = roimatch_db::fail_pipeline_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark {run_type} run as failed"
        );
    }
}

/// Saturating conversion for `records_processed`.
pub(crate) fn record_count<N: TryInto<i32>>(n: N) -> i32 {
    n.try_into().unwrap_or(i32::MAX)
}

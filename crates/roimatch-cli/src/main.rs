mod ingest;
mod query;
mod runs;
mod train;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use roimatch_core::{Platform, Tier};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "roimatch-cli")]
#[command(about = "Creator ROI matching: ingestion, training, and recommendations")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database connectivity and schema management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Load raw sources into the database
    Ingest {
        #[command(subcommand)]
        command: IngestCommands,
    },
    /// Train a model and write its artifact
    Train {
        #[command(subcommand)]
        command: TrainCommands,
    },
    /// Rank platform and tier placements for a budget
    Recommend {
        #[arg(long)]
        budget: i64,

        /// Number of placements to print (default: ROIMATCH_DEFAULT_TOP_K)
        #[arg(long)]
        top_k: Option<usize>,

        #[arg(long, value_parser = parse_platform)]
        platform: Option<Platform>,

        #[arg(long, value_parser = parse_tier)]
        tier: Option<Tier>,
    },
    /// Rank historical campaigns by engagement, reach, and sales
    TopCampaigns {
        #[arg(long)]
        campaign_type: Option<String>,

        #[arg(long)]
        influencer_category: Option<String>,

        #[arg(long, value_parser = parse_platform)]
        platform: Option<Platform>,

        #[arg(long, default_value_t = 0.0)]
        min_product_sales: f64,

        #[arg(long, default_value_t = 0)]
        min_engagements: i64,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Delete all creators, campaigns, and matches
    Reset,
}

#[derive(Debug, Subcommand)]
enum IngestCommands {
    /// Normalize creator profiles from a directory of profile files
    Creators {
        #[arg(long)]
        dir: PathBuf,

        /// Platform the profiles were collected from
        #[arg(long, value_parser = parse_platform, default_value = "Instagram")]
        platform: Platform,

        /// Report counts without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Normalize brand profiles into campaigns
    Campaigns {
        #[arg(long)]
        dir: PathBuf,

        #[arg(long)]
        dry_run: bool,
    },
    /// Link sponsored posts to stored creators
    Matches {
        #[arg(long)]
        posts: PathBuf,
    },
    /// Replace historical campaign performance from a CSV
    Performance {
        #[arg(long)]
        csv: PathBuf,

        /// Budget = estimated_reach × rate when the CSV has no budget
        #[arg(long, default_value_t = roimatch_ingest::performance::DEFAULT_REACH_BUDGET_RATE)]
        reach_budget_rate: f64,
    },
}

#[derive(Debug, Subcommand)]
enum TrainCommands {
    /// Creator features → match ROI
    Roi {
        /// Artifact path (default: ROIMATCH_ROI_MODEL_PATH)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Campaign features → product sales
    Sales {
        /// Also use campaign_type and estimated_reach. Recommendations
        /// cannot use such a model, so it must be written elsewhere.
        #[arg(long, requires = "output")]
        extended: bool,

        /// Artifact path (default: ROIMATCH_SALES_MODEL_PATH)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    /// `recommend` reads model artifacts only and never connects.
    fn uses_database(&self) -> bool {
        !matches!(self, Commands::Recommend { .. })
    }
}

fn parse_platform(raw: &str) -> Result<Platform, String> {
    raw.parse().map_err(|e: roimatch_core::CoreError| e.to_string())
}

fn parse_tier(raw: &str) -> Result<Tier, String> {
    raw.parse().map_err(|e: roimatch_core::CoreError| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("roimatch-cli ready; run with --help to list commands");
        return Ok(());
    };

    let config = if command.uses_database() {
        roimatch_core::load_app_config()?
    } else {
        roimatch_core::load_app_config_without_database()?
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Recommend {
            budget,
            top_k,
            platform,
            tier,
        } => query::run_recommend(
            &config,
            &roimatch_model::RecommendationRequest {
                budget,
                platform,
                tier,
                top_k,
            },
        ),
        other => {
            let pool_config = roimatch_db::PoolConfig::from_app_config(&config);
            let pool = roimatch_db::connect_pool(&config.database_url, pool_config).await?;
            run_with_pool(&pool, &config, other).await
        }
    }
}

async fn run_with_pool(
    pool: &sqlx::PgPool,
    config: &roimatch_core::AppConfig,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Db { command } => run_db(pool, command).await?,
        Commands::Ingest { command } => match command {
            IngestCommands::Creators {
                dir,
                platform,
                dry_run,
            } => ingest::run_ingest_creators(pool, config, &dir, platform, dry_run).await?,
            IngestCommands::Campaigns { dir, dry_run } => {
                ingest::run_ingest_campaigns(pool, config, &dir, dry_run).await?;
            }
            IngestCommands::Matches { posts } => {
                ingest::run_ingest_matches(pool, config, &posts).await?;
            }
            IngestCommands::Performance {
                csv,
                reach_budget_rate,
            } => ingest::run_ingest_performance(pool, &csv, reach_budget_rate).await?,
        },
        Commands::Train { command } => match command {
            TrainCommands::Roi { output } => {
                let path = output.unwrap_or_else(|| config.roi_model_path.clone());
                train::run_train_roi(pool, config, &path).await?;
            }
            TrainCommands::Sales { extended, output } => {
                let path = output.unwrap_or_else(|| config.sales_model_path.clone());
                train::run_train_sales(pool, config, &path, extended).await?;
            }
        },
        Commands::Recommend { .. } => {
            anyhow::bail!("recommend does not use the database");
        }
        Commands::TopCampaigns {
            campaign_type,
            influencer_category,
            platform,
            min_product_sales,
            min_engagements,
            limit,
        } => {
            let filter = roimatch_model::HistoricalFilter {
                campaign_type,
                influencer_category,
                platform,
                min_product_sales,
                min_engagements,
            };
            query::run_top_campaigns(pool, &filter, limit).await?;
        }
    }

    Ok(())
}

async fn run_db(pool: &sqlx::PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            roimatch_db::health_check(pool).await?;
            println!("database reachable");
        }
        DbCommands::Migrate => {
            let applied = roimatch_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::Reset => {
            roimatch_db::clear_match_tables(pool).await?;
            println!("cleared creators, campaigns, and matches");
        }
    }
    Ok(())
}

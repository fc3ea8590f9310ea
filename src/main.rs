use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use weekly_activity_recap::batch::{BatchOptions, BatchOrchestrator};
use weekly_activity_recap::db;
use weekly_activity_recap::fetch::{PgRecordFetcher, RecordFetcher};
use weekly_activity_recap::window::{self, WeekWindow};

#[derive(Parser)]
#[command(name = "weekly-activity-recap")]
#[command(about = "Weekly exercise/diet check-in aggregation pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import check-in records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Aggregate a 7-day window across the active users (or one user)
    Run {
        /// First day of the window, YYYY-MM-DD
        #[arg(long)]
        week_start: String,
        /// Scope the run to a single user
        #[arg(long)]
        user: Option<Uuid>,
        #[arg(long, default_value_t = 10)]
        group_size: usize,
        #[arg(long, default_value_t = 100)]
        inter_group_delay_ms: u64,
        #[arg(long, default_value_t = 3)]
        minimum_record_count: usize,
        #[arg(long, default_value_t = 3)]
        minimum_distinct_days: usize,
        #[arg(long, default_value_t = 500)]
        max_content_length: usize,
        /// Write the full batch result as JSON for the report generator
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} records from {}.", csv.display());
        }
        Commands::Run {
            week_start,
            user,
            group_size,
            inter_group_delay_ms,
            minimum_record_count,
            minimum_distinct_days,
            max_content_length,
            out,
        } => {
            let week_start = window::parse_date(&week_start)?;
            let window = WeekWindow::from_start(week_start);

            let fetcher = Arc::new(PgRecordFetcher::new(pool));
            let options = BatchOptions {
                group_size,
                inter_group_delay: Duration::from_millis(inter_group_delay_ms),
                minimum_record_count,
                minimum_distinct_days,
                max_content_length,
            };
            let orchestrator = BatchOrchestrator::new(fetcher.clone(), options)?;

            let user_ids = match user {
                Some(id) => vec![id],
                None => fetcher.list_user_ids_active_in_window(&window).await?,
            };
            if user_ids.is_empty() {
                println!("No active users in this window.");
                return Ok(());
            }

            let cancel = CancellationToken::new();
            let cancel_on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel_on_ctrl_c.cancel();
                }
            });

            let result = orchestrator
                .aggregate_batch(&user_ids, window.start(), window.end(), &cancel)
                .await;

            println!(
                "Aggregated {} of {} users across {} groups ({} failed).",
                result.succeeded.len(),
                user_ids.len(),
                result.groups,
                result.failed.len()
            );
            for aggregate in &result.succeeded {
                println!(
                    "- {}: {} check-ins, consistency {}, minimum data: {}",
                    aggregate.nickname,
                    aggregate.stats.total_count,
                    aggregate.stats.consistency_score,
                    if aggregate.has_minimum_data { "yes" } else { "no" }
                );
            }
            for failed in &result.failed {
                println!(
                    "- {} failed ({}): {}",
                    failed.user_id,
                    failed.error_kind.as_str(),
                    failed.message
                );
            }

            if let Some(out) = out {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&out, json)?;
                println!("Batch result written to {}.", out.display());
            }
        }
    }

    Ok(())
}

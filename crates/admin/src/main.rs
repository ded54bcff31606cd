//! `marketplace-admin` -- operator tool for the marketplace database.
//!
//! Applies migrations, lists briefs in their serialized form, copies briefs
//! and checks that the SQL status predicates agree with the statuses
//! derived in process.
//!
//! # Environment variables
//!
//! | Variable             | Required | Default                 | Description                  |
//! |----------------------|----------|-------------------------|------------------------------|
//! | `DATABASE_URL`       | yes      | --                      | PostgreSQL connection string |
//! | `DB_MAX_CONNECTIONS` | no       | `20`                    | Pool size                    |
//! | `API_BASE_URL`       | no       | `http://localhost:5000` | Prefix for rendered links    |
//! | `LOG_FORMAT`         | no       | `pretty`                | `pretty` or `json`           |
//! | `RUST_LOG`           | no       | `marketplace_admin=info,marketplace_db=info` | Log filter |

mod commands;
mod config;

use clap::{Parser, Subcommand};
use marketplace_core::brief::BriefStatus;
use marketplace_core::types::DbId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{AdminConfig, LogFormat};

#[derive(Parser, Debug)]
#[command(
    name = "marketplace-admin",
    about = "Operate the digital marketplace database",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Print briefs as JSON, in listing order
    ListBriefs {
        /// Only briefs in this status (repeatable)
        #[arg(long = "status")]
        statuses: Vec<BriefStatus>,
        /// Only briefs on this framework slug (repeatable)
        #[arg(long = "framework")]
        frameworks: Vec<String>,
    },
    /// Check the SQL status predicates against every stored row
    VerifyStatuses,
    /// Copy a brief into a new draft on the live framework of its family
    CopyBrief {
        /// Id of the brief to copy
        id: DbId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(config::log_format_from_env()?);

    let cli = Cli::parse();
    let config = AdminConfig::from_env()?;

    let pool = marketplace_db::create_pool(&config.database_url, config.max_connections).await?;
    marketplace_db::health_check(&pool).await?;
    tracing::info!(max_connections = config.max_connections, "Database connection established");

    match cli.command {
        Command::Migrate => commands::migrate(&pool).await,
        Command::ListBriefs {
            statuses,
            frameworks,
        } => commands::list_briefs(&pool, &config, statuses, frameworks).await,
        Command::VerifyStatuses => commands::verify_statuses(&pool).await,
        Command::CopyBrief { id } => commands::copy_brief(&pool, &config, id).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketplace_admin=info,marketplace_db=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

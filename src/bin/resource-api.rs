//! `resource-api migrate` builds (and optionally applies) the schema for a resources directory;
//! `resource-api serve` runs the read API over it.

use clap::{Parser, Subcommand};
use resource_api::{apply_migrations, app, build_migrations, load_catalog, AppState, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "resource-api", version, about = "Declarative resources on PostgreSQL")]
struct Cli {
    /// Directory of YAML/JSON resource declarations
    #[arg(long, global = true)]
    resources: Option<PathBuf>,

    /// PostgreSQL connection string
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the migration batch and apply it in one transaction.
    Migrate {
        /// Only print the statements.
        #[arg(long)]
        dry_run: bool,
    },
    /// Serve the versioned read API.
    Serve {
        /// Listen address
        #[arg(long)]
        bind: Option<String>,
        /// API major version
        #[arg(long)]
        api_version: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("resource_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Some(dir) = cli.resources {
        settings.resources_dir = dir;
    }
    if let Some(url) = cli.database_url {
        settings.database_url = url;
    }

    let catalog = load_catalog(&settings.resources_dir).await?;

    match cli.command {
        Command::Migrate { dry_run } => {
            let plan = build_migrations(catalog.resources())?;
            println!("{}", plan.to_sql());
            if dry_run {
                return Ok(());
            }
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(1)
                .connect(&settings.database_url)
                .await?;
            apply_migrations(&pool, &plan).await?;
        }
        Command::Serve { bind, api_version } => {
            if let Some(bind) = bind {
                settings.bind_addr = bind;
            }
            if let Some(v) = api_version {
                settings.api_version = v;
            }
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&settings.database_url)
                .await?;
            let state = AppState::new(Arc::new(pool), catalog, settings.api_version);
            let listener = TcpListener::bind(&settings.bind_addr).await?;
            tracing::info!("listening on {}", listener.local_addr()?);
            axum::serve(listener, app(state)).await?;
        }
    }
    Ok(())
}

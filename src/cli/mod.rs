//! CLI parsing and the sequential scrape-reconcile batch driver.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::input;
use crate::repository::{CatalogRepository, DbPool};
use crate::scrapers::{self, ProxyClient};

#[derive(Parser)]
#[command(name = "asinscrape")]
#[command(about = "Scrape product info and reviews for a list of ASINs into a database")]
#[command(version)]
pub struct Cli {
    /// Scraper API key
    #[arg(short = 'k', long, env = "SCRAPER_API_KEY")]
    api_key: String,

    /// Database user name
    #[arg(short = 'u', long, env = "DB_USER")]
    db_user: String,

    /// Database user password
    #[arg(short = 'p', long, env = "DB_PASSWORD")]
    db_password: String,

    /// Database name
    #[arg(short = 'd', long, env = "DB_NAME")]
    db_name: String,

    /// CSV file with ASINs: a header-named `asin` column, or bare tokens
    #[arg(short = 'i', long, default_value = "asins.csv")]
    input: PathBuf,

    /// Drop and recreate the tables before scraping
    #[arg(long)]
    reset: bool,
}

impl Cli {
    /// PostgreSQL on localhost with the default port stores the scraped
    /// records.
    fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@localhost:5432/{}",
            self.db_user, self.db_password, self.db_name
        )
    }
}

/// Parse arguments and run the batch.
///
/// Bad invocations print usage and exit with status 1; fatal upstream
/// failures (proxy or database connectivity) propagate as errors and
/// leave already-committed reconciliations in place.
pub async fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };

    let tokens = input::read_tokens(&cli.input)?;
    let asins = input::normalize(&tokens);
    info!("{} valid ASINs to process", asins.len());

    let client = ProxyClient::connect(&cli.api_key).await?;

    let pool = DbPool::from_url(&cli.database_url()).context("database connection error")?;
    let repo = CatalogRepository::new(pool);
    if cli.reset {
        repo.drop_schema().await.context("database connection error")?;
    }
    repo.ensure_schema()
        .await
        .context("database connection error")?;

    for asin in &asins {
        let record = scrapers::assemble(&client, asin).await?;
        repo.reconcile(&record, asin)
            .await
            .context("database connection error")?;
    }

    Ok(())
}

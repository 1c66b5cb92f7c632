//! asinscrape - Amazon product metadata and review scraper.
//!
//! Scrapes product info and review summaries for a list of ASINs through
//! a scraping proxy and stores them in a relational database.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asinscrape=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    asinscrape::cli::run().await
}

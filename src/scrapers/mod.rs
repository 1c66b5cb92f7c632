//! Scraping pipeline: proxied fetch, field extraction, record assembly.

mod client;
mod extract;

pub use client::{classify, FetchOutcome, ProxyClient, ScrapeError};
pub use extract::{
    extract, prepare_text, product_fields, review_fields, ExtractMode, ExtractionRule,
    PRODUCT_RULES,
};

use tracing::info;

use crate::models::{Asin, ReviewFields, ScrapedRecord};

/// Base URL of the target site. Pages are reached through the proxy.
pub const BASE_URL: &str = "https://www.amazon.com/";

/// Product-detail page URL for an identifier.
pub fn product_url(asin: &Asin) -> String {
    format!("{BASE_URL}dp/{asin}")
}

/// Reviews page URL for an identifier.
pub fn reviews_url(asin: &Asin) -> String {
    format!("{BASE_URL}product-reviews/{asin}")
}

/// Fetch and extract both pages for one identifier.
///
/// An unobtainable product page yields the full-failure sentinel and the
/// reviews page is not fetched. An unobtainable reviews page degrades
/// the review fields only; the product data is still written.
pub async fn assemble(client: &ProxyClient, asin: &Asin) -> Result<ScrapedRecord, ScrapeError> {
    info!("getting product info, ASIN: {asin}");
    let Some(product_page) = client.fetch_page(&product_url(asin), asin).await? else {
        return Ok(ScrapedRecord::failure());
    };
    let product = product_fields(&product_page);
    drop(product_page);

    info!("getting reviews, ASIN: {asin}");
    let reviews = match client.fetch_page(&reviews_url(asin), asin).await? {
        Some(reviews_page) => review_fields(&reviews_page),
        None => ReviewFields::default(),
    };

    Ok(ScrapedRecord {
        asin: Some(asin.clone()),
        product,
        reviews,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_urls_embed_the_identifier() {
        let asin = Asin::parse("B000TESTAB").unwrap();
        assert_eq!(product_url(&asin), "https://www.amazon.com/dp/B000TESTAB");
        assert_eq!(
            reviews_url(&asin),
            "https://www.amazon.com/product-reviews/B000TESTAB"
        );
    }
}

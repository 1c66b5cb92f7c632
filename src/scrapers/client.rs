//! Scraping proxy client with fetch-failure classification.

use std::time::Duration;

use reqwest::{redirect, Client, StatusCode};
use scraper::Html;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::Asin;

/// Every page fetch is routed through the proxy, so the target site sees
/// the proxy's egress rather than the operator's.
const PROXY_ENDPOINT: &str = "http://api.scraperapi.com/";
const ACCOUNT_ENDPOINT: &str = "https://api.scraperapi.com/account";

/// Marker text served on anti-automation verification pages.
const BOT_CHALLENGE_MARKER: &str = "Enter characters you see below";

/// The proxy retries upstream internally; give it time before calling
/// the transport dead.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(70);

/// Fatal fetch-capability failures. Per-page anomalies are not errors;
/// they surface as `Ok(None)` from [`ProxyClient::fetch_page`].
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The proxy could not be reached at the transport level. Aborts the
    /// whole batch: the fetch capability is unusable.
    #[error("scraper API connection error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The proxy rejected the configured API key.
    #[error("scraper API key error")]
    ApiKey,
}

/// Account endpoint response; only the error marker matters here.
#[derive(Debug, Default, Deserialize)]
struct AccountStatus {
    error: Option<String>,
}

/// Classification of a proxied page response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Ok,
    /// Non-success status. Redirects are not followed, so they land here
    /// as their 3xx status.
    NotFound,
    BotChallenge,
}

/// Classify a page response by status and body content.
pub fn classify(status: StatusCode, body: &str) -> FetchOutcome {
    if !status.is_success() {
        return FetchOutcome::NotFound;
    }
    if body.contains(BOT_CHALLENGE_MARKER) {
        return FetchOutcome::BotChallenge;
    }
    FetchOutcome::Ok
}

/// HTTP client that fetches rendered pages through the scraping proxy.
pub struct ProxyClient {
    client: Client,
    api_key: String,
}

impl ProxyClient {
    /// Build a client and verify the API key against the account
    /// endpoint before any page is fetched.
    pub async fn connect(api_key: &str) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        let proxy = Self {
            client,
            api_key: api_key.to_string(),
        };
        proxy.verify_account().await?;
        Ok(proxy)
    }

    /// Check the account endpoint; an error body means a bad key.
    async fn verify_account(&self) -> Result<(), ScrapeError> {
        let response = self
            .client
            .get(ACCOUNT_ENDPOINT)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let account: AccountStatus = response.json().await.unwrap_or_default();
        if !status.is_success() || account.error.is_some() {
            return Err(ScrapeError::ApiKey);
        }
        Ok(())
    }

    /// Fetch one page through the proxy and classify the outcome.
    ///
    /// `Ok(None)` covers not-found, redirect, and bot-challenge
    /// responses; the batch continues past those. A transport failure is
    /// returned as `Err` and aborts the batch. No automatic retries.
    pub async fn fetch_page(&self, url: &str, asin: &Asin) -> Result<Option<Html>, ScrapeError> {
        let page_type = if url.contains("/product-reviews/") {
            "product reviews"
        } else {
            "product"
        };
        debug!("accessing {page_type} page, ASIN: {asin}");

        let response = self
            .client
            .get(PROXY_ENDPOINT)
            .query(&[("api_key", self.api_key.as_str()), ("url", url)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match classify(status, &body) {
            FetchOutcome::Ok => Ok(Some(Html::parse_document(&body))),
            FetchOutcome::NotFound => {
                info!("product page not found, ASIN: {asin}");
                Ok(None)
            }
            FetchOutcome::BotChallenge => {
                warn!("CAPTCHA page displayed, ASIN: {asin}");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_is_ok() {
        assert_eq!(
            classify(StatusCode::OK, "<html><body>product</body></html>"),
            FetchOutcome::Ok
        );
    }

    #[test]
    fn non_success_status_is_not_found() {
        assert_eq!(classify(StatusCode::NOT_FOUND, ""), FetchOutcome::NotFound);
        assert_eq!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, ""),
            FetchOutcome::NotFound
        );
    }

    #[test]
    fn redirect_status_is_not_found() {
        assert_eq!(
            classify(StatusCode::MOVED_PERMANENTLY, ""),
            FetchOutcome::NotFound
        );
    }

    #[test]
    fn bot_challenge_marker_is_detected() {
        let body = "<html><body>Enter characters you see below</body></html>";
        assert_eq!(classify(StatusCode::OK, body), FetchOutcome::BotChallenge);
    }
}

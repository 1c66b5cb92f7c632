//! Domain models: catalog identifiers and scraped records.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// An ASIN is exactly 10 alphanumeric characters.
fn asin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[A-Za-z0-9]{10}$").expect("valid ASIN pattern"))
}

/// A validated catalog identifier.
///
/// The identifier is the primary key joining all persisted tables, so it
/// can only be constructed through [`Asin::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asin(String);

impl Asin {
    /// Validate a raw token. Returns `None` for anything that is not
    /// exactly 10 alphanumeric characters.
    pub fn parse(token: &str) -> Option<Self> {
        asin_pattern()
            .is_match(token)
            .then(|| Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields extracted from a product-detail page.
///
/// `None` marks a fragment that was absent or unparseable; the writer
/// substitutes column defaults for those.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFields {
    pub name: Option<String>,
    pub number_of_ratings: Option<i32>,
    pub average_rating: Option<f64>,
    pub number_of_questions: Option<i32>,
}

/// Fields extracted from a product-reviews page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewFields {
    pub number_of_reviews: Option<i32>,
    pub top_positive: Option<String>,
    pub top_critical: Option<String>,
}

/// One identifier's assembled extraction result.
///
/// `asin: None` is the full-failure sentinel: the product page itself was
/// unobtainable, and reconciliation must delete the identifier's rows
/// rather than update them. A missing reviews page is not a full failure;
/// it only leaves the review fields `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedRecord {
    pub asin: Option<Asin>,
    pub product: ProductFields,
    pub reviews: ReviewFields,
}

impl ScrapedRecord {
    /// The full-failure sentinel: no identifier, no data.
    pub fn failure() -> Self {
        Self::default()
    }

    pub fn is_failure(&self) -> bool {
        self.asin.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_asin_parses() {
        let asin = Asin::parse("B000TESTAB").unwrap();
        assert_eq!(asin.as_str(), "B000TESTAB");
        assert_eq!(asin.to_string(), "B000TESTAB");
    }

    #[test]
    fn invalid_asins_rejected() {
        assert!(Asin::parse("short").is_none());
        assert!(Asin::parse("").is_none());
        assert!(Asin::parse("ELEVENCHARSX").is_none());
        assert!(Asin::parse("B000TEST-B").is_none());
        assert!(Asin::parse("B000 ESTAB").is_none());
    }

    #[test]
    fn sentinel_carries_nothing() {
        let record = ScrapedRecord::failure();
        assert!(record.is_failure());
        assert_eq!(record.product, ProductFields::default());
        assert_eq!(record.reviews, ReviewFields::default());
    }
}

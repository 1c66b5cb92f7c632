//! Declarative field extraction from product and review pages.
//!
//! Each scraped field is described by an [`ExtractionRule`] consumed by
//! one generic routine. Absent elements, absent children, and text that
//! fails normalization all degrade to `None`; extraction never fails.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::{ProductFields, ReviewFields};

/// How an element's text is normalized into a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Trimmed text, verbatim.
    TrimOnly,
    /// Leading numeral token, with thousands-separator commas and `+`
    /// suffixes stripped first.
    NumericPrefix,
}

/// Where to find one field and how to clean it.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRule {
    pub field: &'static str,
    /// Element id carrying the value.
    pub element_id: &'static str,
    pub mode: ExtractMode,
    /// Tag name of a nested child holding the text. When no such direct
    /// child exists the outer element's text is used instead.
    pub child_tag: Option<&'static str>,
}

/// Product-page rules, keyed by the element ids the site renders.
pub const PRODUCT_RULES: &[ExtractionRule] = &[
    ExtractionRule {
        field: "name",
        element_id: "productTitle",
        mode: ExtractMode::TrimOnly,
        child_tag: None,
    },
    ExtractionRule {
        field: "number_of_ratings",
        element_id: "acrCustomerReviewText",
        mode: ExtractMode::NumericPrefix,
        child_tag: None,
    },
    ExtractionRule {
        field: "average_rating",
        element_id: "acrPopover",
        mode: ExtractMode::NumericPrefix,
        child_tag: Some("span"),
    },
    ExtractionRule {
        field: "number_of_questions",
        element_id: "askATFLink",
        mode: ExtractMode::NumericPrefix,
        child_tag: Some("span"),
    },
];

const REVIEW_TITLE_SELECTOR: &str = "span.a-size-base.review-title.a-text-bold";
const REVIEW_BODY_SELECTOR: &str = "div.a-row.a-spacing-top-mini";

/// The "1234 global ratings | 987 global reviews" dual-count shape; the
/// review count is the segment after the delimiter.
fn dual_count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]+ global rating(s)? \| [0-9]+ global review(s)?")
            .expect("valid dual-count pattern")
    })
}

fn element_by_id<'a>(doc: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(&format!(r#"[id="{id}"]"#)).ok()?;
    doc.select(&selector).next()
}

fn first_child_element<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == tag)
}

fn first_descendant<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(tag).ok()?;
    element.select(&selector).next()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Normalize raw element text per the extraction mode.
pub fn prepare_text(raw: &str, mode: ExtractMode) -> Option<String> {
    match mode {
        ExtractMode::TrimOnly => Some(raw.trim().to_string()),
        ExtractMode::NumericPrefix => {
            let cleaned = raw.replace(',', "").replace('+', "");
            let cleaned = cleaned.trim();
            if dual_count_pattern().is_match(cleaned) {
                let tail = cleaned.split('|').nth(1)?;
                return tail.trim().split_whitespace().next().map(str::to_string);
            }
            cleaned.split_whitespace().next().map(str::to_string)
        }
    }
}

/// Run a rule table against a parsed document.
pub fn extract(doc: &Html, rules: &[ExtractionRule]) -> HashMap<&'static str, Option<String>> {
    let mut fields = HashMap::new();

    for rule in rules {
        let value = element_by_id(doc, rule.element_id).and_then(|element| {
            let target = rule
                .child_tag
                .and_then(|tag| first_child_element(element, tag))
                .unwrap_or(element);
            prepare_text(&element_text(target), rule.mode)
        });
        if value.is_none() {
            debug!("no value for field: {}", rule.field);
        }
        fields.insert(rule.field, value);
    }

    fields
}

/// Extract and type the product-page fields.
pub fn product_fields(doc: &Html) -> ProductFields {
    let mut fields = extract(doc, PRODUCT_RULES);
    let mut take = |field: &str| fields.remove(field).flatten();

    ProductFields {
        name: take("name"),
        number_of_ratings: take("number_of_ratings").and_then(|v| v.parse().ok()),
        average_rating: take("average_rating").and_then(|v| v.parse().ok()),
        number_of_questions: take("number_of_questions").and_then(|v| v.parse().ok()),
    }
}

/// Extract the reviews-page fields: the total review count plus the top
/// positive (first) and top critical (second) review blocks.
pub fn review_fields(doc: &Html) -> ReviewFields {
    ReviewFields {
        number_of_reviews: review_count(doc).and_then(|v| v.parse().ok()),
        top_positive: top_review(doc, 0),
        top_critical: top_review(doc, 1),
    }
}

fn review_count(doc: &Html) -> Option<String> {
    let section = element_by_id(doc, "filter-info-section")?;
    let span = first_descendant(section, "div").and_then(|div| first_descendant(div, "span"))?;
    prepare_text(&element_text(span), ExtractMode::NumericPrefix)
}

/// One top-review slot: title and body joined by a newline.
///
/// A missing index (fewer review blocks displayed) or a missing half
/// yields `None`, never a partial concatenation.
fn top_review(doc: &Html, index: usize) -> Option<String> {
    let title_selector = Selector::parse(REVIEW_TITLE_SELECTOR).ok()?;
    let body_selector = Selector::parse(REVIEW_BODY_SELECTOR).ok()?;

    let title = doc.select(&title_selector).nth(index)?;
    let body_row = doc.select(&body_selector).nth(index)?;
    let body = first_child_element(body_row, "span")?;

    let title = prepare_text(&element_text(title), ExtractMode::TrimOnly)?;
    let body = prepare_text(&element_text(body), ExtractMode::TrimOnly)?;
    Some(format!("{title}\n{body}"))
}

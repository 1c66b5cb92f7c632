//! asinscrape - Amazon product metadata and review scraper.
//!
//! Reads catalog identifiers (ASINs) from a CSV file, fetches each
//! product's detail and reviews pages through a scraping proxy, extracts
//! typed fields from the HTML, and reconciles the results into a
//! relational database so repeated runs refresh records in place.

pub mod cli;
pub mod input;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scrapers;

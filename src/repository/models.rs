//! Diesel row models for the catalog tables.

use diesel::prelude::*;

use crate::schema;

/// Product info row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::product_info)]
#[diesel(primary_key(asin))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite, diesel::pg::Pg))]
pub struct ProductInfoRecord {
    pub asin: String,
    /// RFC 3339 timestamp of the write that produced this row's values.
    pub created_at: String,
    pub name: String,
    pub number_of_ratings: i32,
    pub average_rating: f64,
    pub number_of_questions: i32,
}

/// Review summary row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::reviews)]
#[diesel(primary_key(asin))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite, diesel::pg::Pg))]
pub struct ReviewsRecord {
    pub asin: String,
    pub number_of_reviews: i32,
    pub top_positive_review: String,
    pub top_critical_review: String,
}

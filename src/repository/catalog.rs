//! Catalog repository: identifier registry, product info, and review
//! summary rows, with per-identifier reconciliation.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl, SimpleAsyncConnection};
use tracing::{debug, info};

use super::models::{ProductInfoRecord, ReviewsRecord};
use super::pool::{DbError, DbPool};
use crate::models::{Asin, ScrapedRecord};
use crate::schema::{asins, product_info, reviews};
use crate::with_conn;

/// Idempotent schema bootstrap. The registry row is the foreign-key
/// parent of both data tables; deleting it cascades.
const CREATE_TABLES: &str = "\
CREATE TABLE IF NOT EXISTS asins (
    asin TEXT PRIMARY KEY
);
CREATE TABLE IF NOT EXISTS product_info (
    asin TEXT PRIMARY KEY REFERENCES asins(asin) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL DEFAULT '',
    number_of_ratings INTEGER NOT NULL DEFAULT 0,
    average_rating DOUBLE PRECISION NOT NULL DEFAULT 0,
    number_of_questions INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS reviews (
    asin TEXT PRIMARY KEY REFERENCES asins(asin) ON DELETE CASCADE,
    number_of_reviews INTEGER NOT NULL DEFAULT 0,
    top_positive_review TEXT NOT NULL DEFAULT '',
    top_critical_review TEXT NOT NULL DEFAULT ''
);";

const DROP_TABLES: &str = "\
DROP TABLE IF EXISTS reviews;
DROP TABLE IF EXISTS product_info;
DROP TABLE IF EXISTS asins;";

/// Repository over the three catalog tables.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: DbPool,
}

impl CatalogRepository {
    /// Create a repository over an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), DbError> {
        with_conn!(self.pool, conn => conn.batch_execute(CREATE_TABLES).await)
    }

    /// Drop the tables, discarding all stored rows.
    pub async fn drop_schema(&self) -> Result<(), DbError> {
        info!("removing tables from database");
        with_conn!(self.pool, conn => conn.batch_execute(DROP_TABLES).await)
    }

    /// Apply one identifier's reconciliation.
    ///
    /// A record carrying an identifier is upserted; the full-failure
    /// sentinel deletes the identifier currently being processed, never a
    /// stale prior one, which is why the caller supplies it explicitly.
    pub async fn reconcile(&self, record: &ScrapedRecord, asin: &Asin) -> Result<(), DbError> {
        match record.asin.as_ref() {
            Some(key) => {
                info!("writing product info to database, ASIN: {key}");
                self.upsert(key, record).await
            }
            None => {
                info!("removing from database, ASIN: {asin}");
                self.purge(asin).await
            }
        }
    }

    /// Register the identifier and upsert both data rows in one
    /// transaction. Null extracted fields fall back to the column
    /// defaults instead of writing null.
    async fn upsert(&self, asin: &Asin, record: &ScrapedRecord) -> Result<(), DbError> {
        let key = asin.as_str().to_string();
        let created_at = Utc::now().to_rfc3339();
        let name = record.product.name.clone().unwrap_or_default();
        let number_of_ratings = record.product.number_of_ratings.unwrap_or(0);
        let average_rating = record.product.average_rating.unwrap_or(0.0);
        let number_of_questions = record.product.number_of_questions.unwrap_or(0);
        let number_of_reviews = record.reviews.number_of_reviews.unwrap_or(0);
        let top_positive = record.reviews.top_positive.clone().unwrap_or_default();
        let top_critical = record.reviews.top_critical.clone().unwrap_or_default();

        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                async move {
                    // Duplicate key on re-run is the expected case.
                    diesel::insert_into(asins::table)
                        .values(asins::asin.eq(&key))
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                    debug!("ASIN registered: {key}");

                    diesel::insert_into(product_info::table)
                        .values((
                            product_info::asin.eq(&key),
                            product_info::created_at.eq(&created_at),
                            product_info::name.eq(&name),
                            product_info::number_of_ratings.eq(number_of_ratings),
                            product_info::average_rating.eq(average_rating),
                            product_info::number_of_questions.eq(number_of_questions),
                        ))
                        .on_conflict(product_info::asin)
                        .do_update()
                        .set((
                            product_info::created_at.eq(&created_at),
                            product_info::name.eq(&name),
                            product_info::number_of_ratings.eq(number_of_ratings),
                            product_info::average_rating.eq(average_rating),
                            product_info::number_of_questions.eq(number_of_questions),
                        ))
                        .execute(conn)
                        .await?;

                    diesel::insert_into(reviews::table)
                        .values((
                            reviews::asin.eq(&key),
                            reviews::number_of_reviews.eq(number_of_reviews),
                            reviews::top_positive_review.eq(&top_positive),
                            reviews::top_critical_review.eq(&top_critical),
                        ))
                        .on_conflict(reviews::asin)
                        .do_update()
                        .set((
                            reviews::number_of_reviews.eq(number_of_reviews),
                            reviews::top_positive_review.eq(&top_positive),
                            reviews::top_critical_review.eq(&top_critical),
                        ))
                        .execute(conn)
                        .await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await
        })
    }

    /// Delete the registry row; the cascade removes both data rows.
    async fn purge(&self, asin: &Asin) -> Result<(), DbError> {
        with_conn!(self.pool, conn => {
            diesel::delete(asins::table.find(asin.as_str()))
                .execute(&mut conn)
                .await
                .map(|_| ())
        })
    }

    /// Whether the identifier is present in the registry.
    pub async fn is_registered(&self, asin: &Asin) -> Result<bool, DbError> {
        use diesel::dsl::count_star;

        with_conn!(self.pool, conn => {
            asins::table
                .filter(asins::asin.eq(asin.as_str()))
                .select(count_star())
                .first::<i64>(&mut conn)
                .await
                .map(|count| count > 0)
        })
    }

    /// Load the stored product info row, if any.
    pub async fn product(&self, asin: &Asin) -> Result<Option<ProductInfoRecord>, DbError> {
        with_conn!(self.pool, conn => {
            product_info::table
                .find(asin.as_str())
                .first::<ProductInfoRecord>(&mut conn)
                .await
                .optional()
        })
    }

    /// Load the stored review summary row, if any.
    pub async fn review_summary(&self, asin: &Asin) -> Result<Option<ReviewsRecord>, DbError> {
        with_conn!(self.pool, conn => {
            reviews::table
                .find(asin.as_str())
                .first::<ReviewsRecord>(&mut conn)
                .await
                .optional()
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::models::{ProductFields, ReviewFields};

    async fn setup() -> (CatalogRepository, DbPool, TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let pool = DbPool::from_url(&db_path.display().to_string()).unwrap();
        let repo = CatalogRepository::new(pool.clone());
        repo.ensure_schema().await.unwrap();
        (repo, pool, dir)
    }

    fn asin(key: &str) -> Asin {
        Asin::parse(key).unwrap()
    }

    fn full_record(key: &Asin) -> ScrapedRecord {
        ScrapedRecord {
            asin: Some(key.clone()),
            product: ProductFields {
                name: Some("Acme Wireless Mouse".to_string()),
                number_of_ratings: Some(1234),
                average_rating: Some(4.5),
                number_of_questions: Some(56),
            },
            reviews: ReviewFields {
                number_of_reviews: Some(987),
                top_positive: Some("Does the job\nSolid little mouse.".to_string()),
                top_critical: Some("Stopped working\nDied after two weeks.".to_string()),
            },
        }
    }

    async fn product_rows(pool: &DbPool) -> Result<i64, DbError> {
        use diesel::dsl::count_star;

        with_conn!(pool, conn => {
            product_info::table
                .select(count_star())
                .first::<i64>(&mut conn)
                .await
        })
    }

    #[tokio::test]
    async fn reconcile_inserts_then_updates_in_place() {
        let (repo, pool, _dir) = setup().await;
        let key = asin("B000TESTAB");

        repo.reconcile(&full_record(&key), &key).await.unwrap();
        let stored = repo.product(&key).await.unwrap().unwrap();
        assert_eq!(stored.name, "Acme Wireless Mouse");
        assert_eq!(stored.number_of_ratings, 1234);
        assert_eq!(stored.average_rating, 4.5);
        assert_eq!(stored.number_of_questions, 56);

        let mut second = full_record(&key);
        second.product.name = Some("Acme Wireless Mouse v2".to_string());
        second.reviews.number_of_reviews = Some(1000);
        repo.reconcile(&second, &key).await.unwrap();

        // Second write's values win, still one row per table.
        let stored = repo.product(&key).await.unwrap().unwrap();
        assert_eq!(stored.name, "Acme Wireless Mouse v2");
        let summary = repo.review_summary(&key).await.unwrap().unwrap();
        assert_eq!(summary.number_of_reviews, 1000);
        assert_eq!(product_rows(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn null_fields_fall_back_to_column_defaults() {
        let (repo, _pool, _dir) = setup().await;
        let key = asin("B000TESTAB");

        let record = ScrapedRecord {
            asin: Some(key.clone()),
            product: ProductFields::default(),
            reviews: ReviewFields::default(),
        };
        repo.reconcile(&record, &key).await.unwrap();

        let stored = repo.product(&key).await.unwrap().unwrap();
        assert_eq!(stored.name, "");
        assert_eq!(stored.number_of_ratings, 0);
        assert_eq!(stored.average_rating, 0.0);
        assert_eq!(stored.number_of_questions, 0);

        let summary = repo.review_summary(&key).await.unwrap().unwrap();
        assert_eq!(summary.number_of_reviews, 0);
        assert_eq!(summary.top_positive_review, "");
        assert_eq!(summary.top_critical_review, "");
    }

    #[tokio::test]
    async fn sentinel_purges_registry_and_cascades() {
        let (repo, _pool, _dir) = setup().await;
        let key = asin("B000TESTAB");

        repo.reconcile(&full_record(&key), &key).await.unwrap();
        assert!(repo.is_registered(&key).await.unwrap());

        repo.reconcile(&ScrapedRecord::failure(), &key).await.unwrap();
        assert!(!repo.is_registered(&key).await.unwrap());
        assert!(repo.product(&key).await.unwrap().is_none());
        assert!(repo.review_summary(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sentinel_for_unknown_identifier_is_a_no_op() {
        let (repo, _pool, _dir) = setup().await;
        let key = asin("B000NOSUCH");

        repo.reconcile(&ScrapedRecord::failure(), &key).await.unwrap();
        assert!(!repo.is_registered(&key).await.unwrap());
    }

    #[tokio::test]
    async fn drop_schema_discards_rows() {
        let (repo, _pool, _dir) = setup().await;
        let key = asin("B000TESTAB");

        repo.reconcile(&full_record(&key), &key).await.unwrap();
        repo.drop_schema().await.unwrap();
        repo.ensure_schema().await.unwrap();

        assert!(!repo.is_registered(&key).await.unwrap());
        assert!(repo.product(&key).await.unwrap().is_none());
    }
}

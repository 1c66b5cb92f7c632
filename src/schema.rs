// Diesel table definitions for the catalog store.
// Kept in sync with the DDL in `repository::catalog`.

diesel::table! {
    asins (asin) {
        asin -> Text,
    }
}

diesel::table! {
    product_info (asin) {
        asin -> Text,
        created_at -> Text,
        name -> Text,
        number_of_ratings -> Integer,
        average_rating -> Double,
        number_of_questions -> Integer,
    }
}

diesel::table! {
    reviews (asin) {
        asin -> Text,
        number_of_reviews -> Integer,
        top_positive_review -> Text,
        top_critical_review -> Text,
    }
}

diesel::joinable!(product_info -> asins (asin));
diesel::joinable!(reviews -> asins (asin));

diesel::allow_tables_to_appear_in_same_query!(asins, product_info, reviews);

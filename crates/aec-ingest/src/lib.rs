//! Product record ingestion.
//!
//! This crate loads construction-product records into [`ProductRecord`]s,
//! either from JSON files or from a paginated [`ProductPageSource`], and
//! reads normalized product tables saved as CSV.
//!
//! # Features
//!
//! - **JSON Loading**: product arrays or API page objects
//! - **CSV Tables**: normalized tables read through polars
//! - **Pagination**: page arithmetic over any page source
//! - **Filters**: query strings, option mappings, and open filter categories
//!
//! [`ProductRecord`]: aec_model::ProductRecord

mod error;
mod filters;
mod json;
mod pages;
mod table_csv;

// === Error Types ===
pub use error::{IngestError, Result};

// === JSON Loading ===
pub use json::{
    RESULTS_KEY, parse_products_str, products_from_value, read_products_file, read_products_json,
};

// === CSV Tables ===
pub use table_csv::{INFER_SCHEMA_ROWS, read_products_csv};

// === Pagination ===
pub use pages::{ITEMS_PER_PAGE, ProductPage, ProductPageSource, collect_products};

// === Filters ===
pub use filters::{
    FilterValue, OPEN_FILTER_KEYS, ProductFilters, build_filter_query, filter_mappings,
    open_filters,
};

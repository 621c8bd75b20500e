//! Tests for paginated product collection.

use aec_ingest::{
    IngestError, ProductFilters, ProductPage, ProductPageSource, Result, build_filter_query,
    collect_products,
};
use aec_model::ProductRecord;
use serde_json::json;

/// Serves `total` numbered products, 200 per page.
struct FakeCatalog {
    total: usize,
    requested: Vec<String>,
}

impl FakeCatalog {
    fn new(total: usize) -> Self {
        Self {
            total,
            requested: Vec::new(),
        }
    }
}

impl ProductPageSource for FakeCatalog {
    fn fetch_page(&mut self, page: usize, filters: &ProductFilters) -> Result<ProductPage> {
        self.requested.push(build_filter_query(page, filters));
        let start = (page - 1) * 200;
        let end = (start + 200).min(self.total);
        let results = (start..end)
            .map(|n| ProductRecord::from_value(json!({ "unique_product_uuid_v2": n })))
            .collect::<aec_model::Result<Vec<_>>>()
            .map_err(|e| IngestError::PageFetch {
                page,
                message: e.to_string(),
            })?;
        Ok(ProductPage {
            total_products: self.total,
            next: (end < self.total).then(|| format!("?page={}", page + 1)),
            results,
        })
    }
}

#[test]
fn collects_every_page() {
    let mut source = FakeCatalog::new(450);
    let filters = ProductFilters::new().with("product_type", "7");
    let products = collect_products(&mut source, &filters).unwrap();

    assert_eq!(products.len(), 450);
    assert_eq!(
        source.requested,
        vec![
            "page=1&product_type=7",
            "page=2&product_type=7",
            "page=3&product_type=7"
        ]
    );
}

#[test]
fn single_page_stops_without_next() {
    let mut source = FakeCatalog::new(12);
    let products = collect_products(&mut source, &ProductFilters::new()).unwrap();
    assert_eq!(products.len(), 12);
    assert_eq!(source.requested, vec!["page=1"]);
}

#[test]
fn empty_catalog_yields_no_products() {
    let mut source = FakeCatalog::new(0);
    let products = collect_products(&mut source, &ProductFilters::new()).unwrap();
    assert!(products.is_empty());
}

#[test]
fn page_deserializes_api_field_names() {
    let page: ProductPage = serde_json::from_value(json!({
        "TotalProducts": 2,
        "next": null,
        "results": [{"name": "a"}, {"name": "b"}]
    }))
    .unwrap();
    assert_eq!(page.total_products, 2);
    assert!(!page.has_next());
    assert_eq!(page.results.len(), 2);
}

//! Paginated product collection.

use aec_model::ProductRecord;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::filters::ProductFilters;

/// Products returned per page by the catalog API.
pub const ITEMS_PER_PAGE: usize = 200;

/// One page of the product listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(rename = "TotalProducts")]
    pub total_products: usize,
    /// Link to the following page; absent on the last page.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<ProductRecord>,
}

impl ProductPage {
    pub fn has_next(&self) -> bool {
        self.next.as_deref().is_some_and(|next| !next.is_empty())
    }

    /// Number of pages needed for `total_products`.
    pub fn total_pages(&self) -> usize {
        self.total_products.div_ceil(ITEMS_PER_PAGE)
    }
}

/// Anything that can deliver pages of products, such as an HTTP client.
pub trait ProductPageSource {
    /// Fetch page `page` (1-based) with the given filters applied.
    fn fetch_page(&mut self, page: usize, filters: &ProductFilters) -> Result<ProductPage>;
}

/// Fetch every page from `source` and concatenate the results.
///
/// The page count comes from the first page's `TotalProducts`; collection
/// also stops early once a page has no `next` link.
pub fn collect_products<S>(source: &mut S, filters: &ProductFilters) -> Result<Vec<ProductRecord>>
where
    S: ProductPageSource + ?Sized,
{
    if filters.is_empty() {
        warn!("retrieving all products without filters; this will take a while");
    }

    let mut page = 1;
    let mut response = source.fetch_page(page, filters)?;
    let total_pages = response.total_pages();
    if total_pages > 1 {
        info!(total_products = response.total_products, total_pages, "fetching products");
    }

    let mut products = Vec::with_capacity(response.total_products);
    while page <= total_pages {
        let has_next = response.has_next();
        products.append(&mut response.results);
        if total_pages > 1 {
            info!(page, total_pages, "finished fetching page");
        }
        page += 1;
        if !has_next {
            break;
        }
        response = source.fetch_page(page, filters)?;
    }
    Ok(products)
}

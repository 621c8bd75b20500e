//! Loading product records from JSON.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use aec_model::ProductRecord;
use aec_model::record::json_kind;
use serde_json::Value;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Key holding the product list in a page object.
pub const RESULTS_KEY: &str = "results";

/// Parse products from a JSON string.
///
/// Accepts a bare array of product objects or a page object with a
/// `results` array.
pub fn parse_products_str(input: &str) -> Result<Vec<ProductRecord>> {
    let value: Value = serde_json::from_str(input)?;
    products_from_value(value)
}

/// Parse products from any reader.
pub fn read_products_json<R: Read>(reader: R) -> Result<Vec<ProductRecord>> {
    let value: Value = serde_json::from_reader(reader)?;
    products_from_value(value)
}

/// Read products from a JSON file.
pub fn read_products_file(path: &Path) -> Result<Vec<ProductRecord>> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let products = read_products_json(BufReader::new(file))?;
    debug!(path = %path.display(), products = products.len(), "loaded product file");
    Ok(products)
}

/// Interpret a JSON document as a product list.
pub fn products_from_value(value: Value) -> Result<Vec<ProductRecord>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(RESULTS_KEY) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(IngestError::UnsupportedPayload {
                    found: "object without a results array".to_string(),
                });
            }
        },
        other => {
            return Err(IngestError::UnsupportedPayload {
                found: json_kind(&other).to_string(),
            });
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            ProductRecord::from_value(item)
                .map_err(|source| IngestError::InvalidProduct { index, source })
        })
        .collect()
}

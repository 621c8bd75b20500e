//! Product records paired with their flat table.

use std::collections::{BTreeMap, BTreeSet};

use aec_model::catalog::IDENTIFIER_COLUMN;
use aec_model::record::json_kind;
use aec_model::{AecError, CellValue, FlatTable, ProductRecord, Result, UnitTarget};
use polars::prelude::{DataFrame, PolarsResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::filter::{RowFilters, filter_table};
use crate::frame::to_dataframe;
use crate::normalize::{denormalize, normalize, prepare_records};
use crate::units::{self, Conversion};

/// Target unit and quantity for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductScale {
    pub id: String,
    #[serde(default)]
    pub unit: UnitTarget,
    #[serde(default = "default_amount")]
    pub amount: f64,
}

fn default_amount() -> f64 {
    1.0
}

impl ProductScale {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unit: UnitTarget::DeclaredUnit,
            amount: 1.0,
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<UnitTarget>) -> Self {
        self.unit = unit.into();
        self
    }

    #[must_use]
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }
}

/// A set of products held both as nested records and as a flat table.
///
/// Records get a declared-unit scaling factor when they have none. Both
/// views are kept in sync at construction and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductData {
    records: Vec<ProductRecord>,
    table: FlatTable,
}

impl ProductData {
    pub fn from_records(records: Vec<ProductRecord>) -> Self {
        let records = prepare_records(records);
        let table = normalize(&records);
        Self { records, table }
    }

    /// Wrap an existing table; records are rebuilt from its rows.
    pub fn from_table(table: FlatTable) -> Self {
        let records = denormalize(&table);
        Self { records, table }
    }

    /// Accept a JSON array of product objects or a serialized table
    /// (`{"columns": [...], "rows": [[...]]}`).
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                let records = items
                    .into_iter()
                    .map(ProductRecord::from_value)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::from_records(records))
            }
            Value::Object(map) if map.contains_key("columns") && map.contains_key("rows") => {
                let table: TableRepr = serde_json::from_value(Value::Object(map))?;
                Ok(Self::from_table(FlatTable::from_rows(table.columns, table.rows)))
            }
            other => Err(AecError::UnsupportedInputType {
                found: json_kind(&other).to_string(),
            }),
        }
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn table(&self) -> &FlatTable {
        &self.table
    }

    pub fn into_table(self) -> FlatTable {
        self.table
    }

    pub fn len(&self) -> usize {
        self.table.height()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn available_units(&self) -> BTreeSet<String> {
        units::available_units(&self.table)
    }

    pub fn convert_to_unit(&self, target: &UnitTarget, amount: f64) -> Conversion {
        units::convert(&self.table, target, amount)
    }

    /// Rescale individual products, one output row per matched request.
    ///
    /// Unknown identifiers and failed conversions are logged and skipped.
    pub fn scale_products_by_unit_and_amount(&self, products: &[ProductScale]) -> Result<FlatTable> {
        if !self.table.has_column(IDENTIFIER_COLUMN) {
            return Err(AecError::MissingIdentifierColumn {
                column: IDENTIFIER_COLUMN.to_string(),
            });
        }
        let mut scaled = FlatTable::new(self.table.columns().to_vec());
        for request in products {
            let target = CellValue::from(request.id.as_str());
            let rows = self
                .table
                .filter_rows(|row| *row.get(IDENTIFIER_COLUMN) == target);
            if rows.is_empty() {
                warn!(id = %request.id, "product not found");
                continue;
            }
            match units::convert(&rows, &request.unit, request.amount) {
                Conversion::Converted(table) => scaled = scaled.concat(&table),
                Conversion::Unavailable { .. } => {
                    warn!(id = %request.id, unit = %request.unit, "scaling failed for product");
                }
            }
        }
        debug!(requested = products.len(), scaled = scaled.height(), "scaled products");
        Ok(scaled)
    }

    /// Sum of `field` per product label `"<name>\n(<id>)"` after scaling.
    ///
    /// Null and non-finite values contribute nothing.
    pub fn product_contributions(
        &self,
        products: &[ProductScale],
        field: &str,
    ) -> Result<BTreeMap<String, f64>> {
        let scaled = self.scale_products_by_unit_and_amount(products)?;
        for column in ["name", IDENTIFIER_COLUMN, field] {
            if !scaled.has_column(column) {
                return Err(AecError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }
        let mut contributions = BTreeMap::new();
        for row in scaled.iter_rows() {
            let (name, id) = (row.get("name"), row.get(IDENTIFIER_COLUMN));
            if name.is_null() || id.is_null() {
                continue;
            }
            let total = contributions
                .entry(format!("{name}\n({id})"))
                .or_insert(0.0);
            if let Some(value) = row.get(field).as_f64().filter(|v| v.is_finite()) {
                *total += value;
            }
        }
        Ok(contributions)
    }

    pub fn filter_rows(&self, filters: &RowFilters) -> Result<FlatTable> {
        filter_table(&self.table, filters)
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        to_dataframe(&self.table)
    }
}

#[derive(Deserialize)]
struct TableRepr {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<CellValue>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_rejects_scalars() {
        let err = ProductData::from_json(json!("products")).unwrap_err();
        assert!(matches!(err, AecError::UnsupportedInputType { .. }));
    }

    #[test]
    fn from_json_accepts_serialized_table() {
        let data = ProductData::from_json(json!({
            "columns": ["unique_product_uuid_v2", "name"],
            "rows": [["p1", "Brick"]]
        }))
        .unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.records()[0].get("name"), Some(&json!("Brick")));
    }

    #[test]
    fn from_json_reports_malformed_tables() {
        let err = ProductData::from_json(json!({"columns": "name", "rows": []})).unwrap_err();
        assert!(matches!(err, AecError::Json(_)));
    }

    #[test]
    fn scaling_requires_identifier() {
        let data = ProductData::from_json(json!([{"name": "x"}])).unwrap();
        let err = data
            .scale_products_by_unit_and_amount(&[ProductScale::new("p1")])
            .unwrap_err();
        assert!(matches!(err, AecError::MissingIdentifierColumn { .. }));
    }
}

//! Command stages shared by the CLI subcommands.
//!
//! 1. **Load**: read product records or a saved table and build the flat table
//! 2. **Transform**: convert units or compute grouped statistics
//! 3. **Output**: handled by the commands through `aec-output`

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span};

use aec_ingest::{read_products_csv, read_products_file};
use aec_model::catalog::{scaling_estimated_column, scaling_value_column, unit_category};
use aec_model::{FlatTable, StatisticsRequest, UnitTarget};
use aec_stats::ProductStatistics;
use aec_transform::{ProductData, from_dataframe};

/// Products offering one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
    pub unit: String,
    /// Primary unit of the unit's dimension, when known.
    pub category: Option<&'static str>,
    /// Products with a scaling factor to the unit.
    pub products: usize,
    /// Of those, products whose factor is estimated.
    pub estimated: usize,
}

/// Read a product file into normalized product data.
///
/// `.csv` files are normalized tables as written by `normalize`; anything
/// else is read as product JSON.
pub fn load_products(path: &Path) -> Result<ProductData> {
    let span = info_span!("load", path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();
    let data = if is_csv(path) {
        let frame = read_products_csv(path)
            .with_context(|| format!("read product table from {}", path.display()))?;
        ProductData::from_table(from_dataframe(&frame))
    } else {
        let records = read_products_file(path)
            .with_context(|| format!("read products from {}", path.display()))?;
        ProductData::from_records(records)
    };
    info!(
        products = data.len(),
        columns = data.table().width(),
        duration_ms = start.elapsed().as_millis(),
        "loaded products"
    );
    Ok(data)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Available units with product and estimate counts.
pub fn unit_overview(data: &ProductData) -> Vec<UnitSummary> {
    let table = data.table();
    data.available_units()
        .into_iter()
        .map(|unit| {
            let with_factor: Vec<usize> = table
                .column_values(&scaling_value_column(&unit))
                .map(|values| {
                    values
                        .enumerate()
                        .filter(|(_, value)| !value.is_null())
                        .map(|(row, _)| row)
                        .collect()
                })
                .unwrap_or_default();
            let estimated_column = scaling_estimated_column(&unit);
            let estimated = with_factor
                .iter()
                .filter(|&&row| table.cell(row, &estimated_column).as_bool() == Some(true))
                .count();
            UnitSummary {
                category: unit_category(&unit),
                products: with_factor.len(),
                estimated,
                unit,
            }
        })
        .collect()
}

/// Express every product in `unit`, multiplied by `amount`.
pub fn convert_products(data: &ProductData, unit: &UnitTarget, amount: f64) -> Result<FlatTable> {
    let span = info_span!("convert", unit = %unit, amount);
    let _guard = span.enter();
    let table = data
        .convert_to_unit(unit, amount)
        .into_result()
        .with_context(|| format!("convert products to {unit}"))?;
    debug!(rows = table.height(), "converted products");
    Ok(table)
}

/// Grouped statistics of the products expressed in `unit`.
pub fn compute_statistics(
    data: &ProductData,
    unit: UnitTarget,
    request: &StatisticsRequest,
) -> Result<FlatTable> {
    let span = info_span!("statistics", unit = %unit);
    let _guard = span.enter();
    let start = Instant::now();
    let statistics = ProductStatistics::new(data, unit).context("prepare products for statistics")?;
    let table = statistics
        .get_statistics(request)
        .context("compute grouped statistics")?;
    info!(
        groups = table.height(),
        duration_ms = start.elapsed().as_millis(),
        "computed statistics"
    );
    Ok(table)
}

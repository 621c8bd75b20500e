//! Conversion between nested product records and the flat product table.
//!
//! Forward normalization flattens every record, unions the columns in
//! first-appearance order and then fixes the column layout: identifier
//! first, other columns in source order, `material_facts` columns sorted
//! at the end. The inverse rebuilds nested records from table rows and
//! prunes nulls and stray `_estimated` flags.

use std::collections::HashSet;

use aec_model::catalog::{
    DECLARED_UNIT, ESTIMATED_SUFFIX, IDENTIFIER_COLUMN, MATERIAL_FACTS, SCALING_FACTORS,
};
use aec_model::{CellValue, FlatRecord, FlatTable, ProductRecord};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

/// Give a product without scaling factors an identity factor for its
/// declared unit. Returns whether the record was changed.
pub fn ensure_declared_scaling_factor(record: &mut ProductRecord) -> bool {
    let Some(Value::Object(facts)) = record.as_map_mut().get_mut(MATERIAL_FACTS) else {
        return false;
    };
    if facts.contains_key(SCALING_FACTORS) {
        return false;
    }
    let unit = match facts.get(DECLARED_UNIT) {
        Some(Value::String(unit)) if !unit.is_empty() => unit.clone(),
        _ => return false,
    };
    let mut factors = Map::new();
    factors.insert(unit, json!({ "value": 1, "estimated": false }));
    facts.insert(SCALING_FACTORS.to_string(), Value::Object(factors));
    true
}

/// Order columns: identifier first, other columns in their given order,
/// then `material_facts` columns sorted.
pub fn order_columns(columns: Vec<String>) -> Vec<String> {
    let (mut facts, others): (Vec<String>, Vec<String>) = columns
        .into_iter()
        .partition(|column| column.starts_with(MATERIAL_FACTS));
    facts.sort();

    let mut ordered = Vec::with_capacity(others.len() + facts.len());
    if others.iter().any(|column| column == IDENTIFIER_COLUMN) {
        ordered.push(IDENTIFIER_COLUMN.to_string());
    }
    ordered.extend(others.into_iter().filter(|column| column != IDENTIFIER_COLUMN));
    ordered.extend(facts);
    ordered
}

/// Flatten records into a table.
///
/// Records are taken as given; use [`prepare_records`] first to synthesize
/// missing scaling factors.
pub fn normalize(records: &[ProductRecord]) -> FlatTable {
    let flattened: Vec<FlatRecord> = records.iter().map(ProductRecord::flatten).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns = Vec::new();
    for flat in &flattened {
        for (path, _) in flat.entries() {
            if seen.insert(path.as_str()) {
                columns.push(path.clone());
            }
        }
    }
    let columns = order_columns(columns);

    let mut table = FlatTable::new(columns);
    for flat in &flattened {
        let row = table
            .columns()
            .iter()
            .map(|column| flat.get(column).cloned().unwrap_or_default())
            .collect();
        table.push_row(row);
    }
    debug!(rows = table.height(), columns = table.width(), "normalized product records");
    table
}

/// Synthesize missing scaling factors on owned records.
pub fn prepare_records(mut records: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let added = records
        .iter_mut()
        .map(ensure_declared_scaling_factor)
        .filter(|changed| *changed)
        .count();
    if added > 0 {
        debug!(added, "added declared-unit scaling factors");
    }
    records
}

/// Rebuild nested records from table rows.
///
/// Nulls and empty mappings are pruned, and `_estimated` flags whose base
/// value is absent or falsy are removed at every level. Cells that would
/// nest under a scalar are skipped with a warning.
pub fn denormalize(table: &FlatTable) -> Vec<ProductRecord> {
    table
        .iter_rows()
        .map(|row| {
            let flat: FlatRecord = row
                .entries()
                .map(|(column, cell)| (column.to_string(), cell.clone()))
                .collect();
            let rebuilt = flat.unflatten();
            for path in &rebuilt.conflicts {
                warn!(row = row.position(), path = %path, "skipping conflicting column path");
            }
            ProductRecord::new(prune_map(rebuilt.record.into_map()))
        })
        .collect()
}

/// Drop null values and empty mappings recursively, then stray estimate flags.
pub fn prune_map(map: Map<String, Value>) -> Map<String, Value> {
    let mut cleaned = Map::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Object(child) => {
                let child = prune_map(child);
                if !child.is_empty() {
                    cleaned.insert(key, Value::Object(child));
                }
            }
            other => {
                cleaned.insert(key, other);
            }
        }
    }
    prune_estimated(&mut cleaned);
    cleaned
}

/// Remove `<base>_estimated` keys whose `<base>` is absent or falsy.
pub fn prune_estimated(map: &mut Map<String, Value>) {
    let stale: Vec<String> = map
        .keys()
        .filter_map(|key| {
            let base = key.strip_suffix(ESTIMATED_SUFFIX)?;
            (!map.get(base).is_some_and(is_truthy)).then(|| key.clone())
        })
        .collect();
    if stale.is_empty() {
        return;
    }
    *map = std::mem::take(map)
        .into_iter()
        .filter(|(key, _)| !stale.contains(key))
        .collect();
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        other => CellValue::from_json(other).is_truthy(),
    }
}

//! Grouping domains and their Cartesian product.

use std::collections::BTreeSet;

use aec_model::{AecError, CellValue, FlatTable, Result};
use aec_transform::filter::{cell_matches, is_list_column};
use serde::Serialize;
use tracing::{debug, warn};

/// Above this many combinations a warning is logged.
pub const COMBINATION_WARN_THRESHOLD: usize = 10_000;

/// Distinct values of one grouping field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupingDomain {
    pub field: String,
    /// Whether the column holds lists; membership then counts as a match.
    pub list_column: bool,
    /// Sorted distinct values; null last when present.
    pub values: Vec<CellValue>,
}

impl GroupingDomain {
    /// Collect the domain of `field`.
    ///
    /// In a list-valued column the domain is the union of all list elements
    /// plus any scalar cells.
    pub fn from_table(table: &FlatTable, field: &str) -> Result<Self> {
        let cells = table
            .column_values(field)
            .ok_or_else(|| AecError::UnknownGroupingField {
                field: field.to_string(),
            })?;
        let list_column = is_list_column(table, field);
        let mut values = BTreeSet::new();
        for cell in cells {
            if list_column && cell.is_list() {
                values.extend(cell.list_cells());
            } else {
                values.insert(cell.clone());
            }
        }
        Ok(Self {
            field: field.to_string(),
            list_column,
            values: values.into_iter().collect(),
        })
    }
}

/// Domains of several grouping fields, in the given order.
pub fn grouping_domains<S: AsRef<str>>(table: &FlatTable, fields: &[S]) -> Result<Vec<GroupingDomain>> {
    fields
        .iter()
        .map(|field| GroupingDomain::from_table(table, field.as_ref()))
        .collect()
}

/// One populated combination of grouping values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCombination {
    /// `(field, value)` pairs in grouping-field order.
    pub values: Vec<(String, CellValue)>,
    /// Number of matching rows.
    pub count: usize,
    /// Positions of the matching rows.
    #[serde(skip)]
    pub rows: Vec<usize>,
}

/// Number of combinations the domains span, saturating.
pub fn combination_count(domains: &[GroupingDomain]) -> u128 {
    domains
        .iter()
        .fold(1u128, |acc, domain| acc.saturating_mul(domain.values.len() as u128))
}

/// Enumerate the Cartesian product of `domains`, first field outermost, and
/// keep the combinations matched by at least `min_count` rows.
///
/// Fails with [`AecError::TooManyCombinations`] when the product exceeds
/// `max_combinations`.
pub fn enumerate(
    table: &FlatTable,
    domains: &[GroupingDomain],
    min_count: usize,
    max_combinations: usize,
) -> Result<Vec<GroupCombination>> {
    let total = combination_count(domains);
    if total > max_combinations as u128 {
        return Err(AecError::TooManyCombinations {
            combinations: total,
            limit: max_combinations,
        });
    }
    if total > COMBINATION_WARN_THRESHOLD as u128 {
        warn!(combinations = %total, "large number of grouping combinations");
    }

    let mut found = Vec::new();
    let all_rows: Vec<usize> = (0..table.height()).collect();
    let mut prefix = Vec::with_capacity(domains.len());
    descend(table, domains, min_count, &all_rows, &mut prefix, &mut found);
    debug!(
        combinations = %total,
        kept = found.len(),
        min_count,
        "enumerated grouping combinations"
    );
    Ok(found)
}

fn descend(
    table: &FlatTable,
    domains: &[GroupingDomain],
    min_count: usize,
    rows: &[usize],
    prefix: &mut Vec<(String, CellValue)>,
    found: &mut Vec<GroupCombination>,
) {
    let Some((domain, rest)) = domains.split_first() else {
        found.push(GroupCombination {
            values: prefix.clone(),
            count: rows.len(),
            rows: rows.to_vec(),
        });
        return;
    };
    for value in &domain.values {
        let matching: Vec<usize> = rows
            .iter()
            .copied()
            .filter(|&row| cell_matches(table.cell(row, &domain.field), value, domain.list_column))
            .collect();
        // Deeper fields only narrow the match.
        if matching.len() < min_count {
            continue;
        }
        prefix.push((domain.field.clone(), value.clone()));
        descend(table, rest, min_count, &matching, prefix, found);
        prefix.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> FlatTable {
        FlatTable::from_rows(
            vec!["product_type".into(), "company".into()],
            vec![
                vec![CellValue::List(vec![json!("A"), json!("B")]), "x".into()],
                vec![CellValue::List(vec![json!("B")]), "y".into()],
                vec![CellValue::Null, "x".into()],
            ],
        )
    }

    #[test]
    fn list_domain_is_union_of_elements() {
        let domain = GroupingDomain::from_table(&table(), "product_type").unwrap();
        assert!(domain.list_column);
        assert_eq!(
            domain.values,
            vec![CellValue::from("A"), CellValue::from("B"), CellValue::Null]
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = GroupingDomain::from_table(&table(), "material_type").unwrap_err();
        assert!(matches!(err, AecError::UnknownGroupingField { .. }));
    }

    #[test]
    fn combinations_follow_field_order() {
        let table = table();
        let domains = grouping_domains(&table, &["product_type", "company"]).unwrap();
        let combos = enumerate(&table, &domains, 1, 100).unwrap();
        let keys: Vec<(String, String, usize)> = combos
            .iter()
            .map(|c| (c.values[0].1.to_string(), c.values[1].1.to_string(), c.count))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("A".into(), "x".into(), 1),
                ("B".into(), "x".into(), 1),
                ("B".into(), "y".into(), 1),
            ]
        );
    }

    #[test]
    fn cap_rejects_large_products() {
        let table = table();
        let domains = grouping_domains(&table, &["product_type", "company"]).unwrap();
        let err = enumerate(&table, &domains, 1, 5).unwrap_err();
        assert!(matches!(
            err,
            AecError::TooManyCombinations { combinations: 6, limit: 5 }
        ));
    }
}

//! Row filters over product tables.
//!
//! A column counts as list-valued when any of its cells is a list. In such a
//! column a row matches when its list contains the target or its scalar value
//! equals it. Null cells and null targets never match.

use aec_model::{AecError, CellValue, FlatTable, Result, RowView};
use serde::{Deserialize, Serialize};

/// Condition on a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    One(CellValue),
    /// Matches when any of the values matches.
    AnyOf(Vec<CellValue>),
}

impl Filter {
    pub fn targets(&self) -> &[CellValue] {
        match self {
            Self::One(target) => std::slice::from_ref(target),
            Self::AnyOf(targets) => targets,
        }
    }
}

impl From<CellValue> for Filter {
    fn from(value: CellValue) -> Self {
        Self::One(value)
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        Self::One(CellValue::from(value))
    }
}

impl From<Vec<CellValue>> for Filter {
    fn from(values: Vec<CellValue>) -> Self {
        Self::AnyOf(values)
    }
}

/// Conjunction of per-column filters, applied in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowFilters {
    entries: Vec<(String, Filter)>,
}

impl RowFilters {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, filter: impl Into<Filter>) -> Self {
        self.push(column, filter);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, filter: impl Into<Filter>) {
        self.entries.push((column.into(), filter.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.entries.iter().map(|(column, filter)| (column.as_str(), filter))
    }
}

impl FromIterator<(String, Filter)> for RowFilters {
    fn from_iter<I: IntoIterator<Item = (String, Filter)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Whether any cell of `column` holds a list.
pub fn is_list_column(table: &FlatTable, column: &str) -> bool {
    table
        .column_values(column)
        .is_some_and(|mut values| values.any(CellValue::is_list))
}

/// Match one cell against one target.
pub fn cell_matches(cell: &CellValue, target: &CellValue, list_column: bool) -> bool {
    if cell.is_null() || target.is_null() {
        return false;
    }
    match cell {
        CellValue::List(_) if list_column => cell.list_cells().iter().any(|item| item == target),
        _ => cell == target,
    }
}

/// Match a cell against a filter.
pub fn filter_matches(cell: &CellValue, filter: &Filter, list_column: bool) -> bool {
    filter
        .targets()
        .iter()
        .any(|target| cell_matches(cell, target, list_column))
}

/// Filters resolved against a table: column presence checked, list-valued
/// columns detected once.
#[derive(Debug)]
pub struct CompiledFilters<'a> {
    conditions: Vec<(&'a str, &'a Filter, bool)>,
}

impl<'a> CompiledFilters<'a> {
    pub fn compile(table: &FlatTable, filters: &'a RowFilters) -> Result<Self> {
        let conditions = filters
            .iter()
            .map(|(column, filter)| {
                if !table.has_column(column) {
                    return Err(AecError::MissingColumn {
                        column: column.to_string(),
                    });
                }
                Ok((column, filter, is_list_column(table, column)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { conditions })
    }

    pub fn matches(&self, row: RowView<'_>) -> bool {
        self.conditions
            .iter()
            .all(|(column, filter, list_column)| filter_matches(row.get(column), filter, *list_column))
    }
}

/// Rows of `table` matching every filter.
pub fn filter_table(table: &FlatTable, filters: &RowFilters) -> Result<FlatTable> {
    let compiled = CompiledFilters::compile(table, filters)?;
    Ok(table.filter_rows(|row| compiled.matches(row)))
}

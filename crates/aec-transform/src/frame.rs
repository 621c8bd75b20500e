//! Conversion between product tables and polars `DataFrame`s.

use aec_model::{CellValue, FlatTable};
use polars::prelude::{AnyValue, Column, DataFrame, NamedFrom, PolarsResult, Series};
use serde_json::Value;
use tracing::debug;

/// Storage type chosen for one table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

fn column_kind<'a>(cells: impl Iterator<Item = &'a CellValue>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for cell in cells {
        let cell_kind = match cell {
            CellValue::Null => continue,
            CellValue::Int(_) => ColumnKind::Int,
            CellValue::Float(_) => ColumnKind::Float,
            CellValue::Bool(_) => ColumnKind::Bool,
            CellValue::Text(_) | CellValue::List(_) => return ColumnKind::Text,
        };
        kind = Some(match (kind, cell_kind) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int | ColumnKind::Float), ColumnKind::Int | ColumnKind::Float) => {
                ColumnKind::Float
            }
            _ => return ColumnKind::Text,
        });
    }
    kind.unwrap_or(ColumnKind::Text)
}

/// Convert a table into a `DataFrame`.
///
/// Numeric columns become `Int64` or `Float64`, boolean columns `Boolean`.
/// Everything else is stored as strings, with lists as JSON text. Nulls stay
/// null.
pub fn to_dataframe(table: &FlatTable) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(table.width());
    for name in table.columns() {
        let cells: Vec<&CellValue> = table
            .column_values(name)
            .map(Iterator::collect)
            .unwrap_or_default();
        let series = match column_kind(cells.iter().copied()) {
            ColumnKind::Int => {
                let values: Vec<Option<i64>> = cells
                    .iter()
                    .map(|cell| match cell {
                        CellValue::Int(i) => Some(*i),
                        _ => None,
                    })
                    .collect();
                Series::new(name.as_str().into(), values)
            }
            ColumnKind::Float => {
                let values: Vec<Option<f64>> = cells.iter().map(|cell| cell.as_f64()).collect();
                Series::new(name.as_str().into(), values)
            }
            ColumnKind::Bool => {
                let values: Vec<Option<bool>> = cells.iter().map(|cell| cell.as_bool()).collect();
                Series::new(name.as_str().into(), values)
            }
            ColumnKind::Text => {
                let values: Vec<Option<String>> = cells
                    .iter()
                    .map(|cell| (!cell.is_null()).then(|| cell.to_string()))
                    .collect();
                Series::new(name.as_str().into(), values)
            }
        };
        columns.push(series.into());
    }
    DataFrame::new(columns)
}

/// Convert a `DataFrame` into a table.
///
/// Integers, floats and booleans keep their type. Strings holding a JSON
/// array become list cells, so lists written as JSON text come back whole.
pub fn from_dataframe(df: &DataFrame) -> FlatTable {
    let columns: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let mut table = FlatTable::new(columns);
    for row in 0..df.height() {
        let cells = df
            .get_columns()
            .iter()
            .map(|column| any_to_cell(column.get(row).unwrap_or(AnyValue::Null)))
            .collect();
        table.push_row(cells);
    }
    debug!(rows = table.height(), columns = table.width(), "converted frame to table");
    table
}

fn any_to_cell(value: AnyValue<'_>) -> CellValue {
    match value {
        AnyValue::Null => CellValue::Null,
        AnyValue::Boolean(b) => CellValue::Bool(b),
        AnyValue::Int32(v) => CellValue::Int(i64::from(v)),
        AnyValue::Int64(v) => CellValue::Int(v),
        AnyValue::UInt32(v) => CellValue::Int(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Int),
        AnyValue::Float32(v) => CellValue::Float(f64::from(v)),
        AnyValue::Float64(v) => CellValue::Float(v),
        AnyValue::String(text) => text_cell(text),
        AnyValue::StringOwned(text) => text_cell(text.as_str()),
        other => CellValue::Text(other.to_string()),
    }
}

fn text_cell(text: &str) -> CellValue {
    if text.starts_with('[')
        && let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text)
    {
        return CellValue::List(items);
    }
    CellValue::from(text)
}

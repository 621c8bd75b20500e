#![deny(unsafe_code)]

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::IDENTIFIER_COLUMN;
use crate::value::CellValue;

static NULL_CELL: CellValue = CellValue::Null;

/// Row-oriented table of flattened product records.
///
/// Every row holds exactly one cell per column, in column order. All
/// transformations return a new table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatTable {
    columns: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
}

impl FlatTable {
    pub fn new(columns: Vec<String>) -> Self {
        let index = build_index(&columns);
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows, padding short rows with nulls and truncating long ones.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Cell at `row` in column `name`; `Null` when the column is absent.
    pub fn cell(&self, row: usize, name: &str) -> &CellValue {
        match (self.rows.get(row), self.column_index(name)) {
            (Some(cells), Some(idx)) => &cells[idx],
            _ => &NULL_CELL,
        }
    }

    pub fn row(&self, row: usize) -> RowView<'_> {
        RowView { table: self, row }
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = RowView<'_>> {
        (0..self.rows.len()).map(move |row| RowView { table: self, row })
    }

    /// All cells of a column, or `None` if the column is absent.
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Identifier of a row: the product identifier when present, else the row position.
    pub fn row_id(&self, row: usize) -> CellValue {
        match self.cell(row, IDENTIFIER_COLUMN) {
            CellValue::Null => CellValue::Int(row as i64),
            id => id.clone(),
        }
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: CellValue) {
        if let Some(cells) = self.rows.get_mut(row)
            && column < cells.len()
        {
            cells[column] = value;
        }
    }

    /// Return a copy with `name` set to `values`, appending the column if new.
    pub fn with_column(&self, name: &str, values: Vec<CellValue>) -> Self {
        let mut table = self.clone();
        let idx = match table.column_index(name) {
            Some(idx) => idx,
            None => {
                table.columns.push(name.to_string());
                table.index.insert(name.to_string(), table.columns.len() - 1);
                for row in &mut table.rows {
                    row.push(CellValue::Null);
                }
                table.columns.len() - 1
            }
        };
        let mut values = values.into_iter();
        for row in &mut table.rows {
            row[idx] = values.next().unwrap_or_default();
        }
        table
    }

    /// Keep only the named columns that exist, in the given order.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Self {
        let picked: Vec<(String, usize)> = columns
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                self.column_index(name).map(|idx| (name.to_string(), idx))
            })
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| picked.iter().map(|(_, idx)| row[*idx].clone()).collect())
            .collect();
        Self::from_rows(picked.into_iter().map(|(name, _)| name).collect(), rows)
    }

    /// Keep the rows for which `keep` returns true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(RowView<'_>) -> bool,
    {
        let rows = (0..self.rows.len())
            .filter(|&row| keep(self.row(row)))
            .map(|row| self.rows[row].clone())
            .collect();
        Self::from_rows(self.columns.clone(), rows)
    }

    /// Keep the rows at the given positions, in that order.
    pub fn take_rows(&self, positions: &[usize]) -> Self {
        let rows = positions
            .iter()
            .filter_map(|&row| self.rows.get(row).cloned())
            .collect();
        Self::from_rows(self.columns.clone(), rows)
    }

    /// Append the rows of `other`, aligning by column name and adding new columns.
    pub fn concat(&self, other: &FlatTable) -> Self {
        let mut columns = self.columns.clone();
        for column in other.columns() {
            if !self.has_column(column) {
                columns.push(column.clone());
            }
        }
        let mut table = Self::new(columns);
        for source in [self, other] {
            for view in source.iter_rows() {
                let row = table
                    .columns
                    .iter()
                    .map(|column| view.get(column).clone())
                    .collect();
                table.rows.push(row);
            }
        }
        table
    }

    /// Drop every column for which every cell is null.
    pub fn drop_null_columns(&self) -> Self {
        let keep: Vec<&String> = self
            .columns
            .iter()
            .filter(|column| {
                self.column_values(column)
                    .is_some_and(|mut values| values.any(|value| !value.is_null()))
            })
            .collect();
        self.select(&keep)
    }

    /// Stable sort by the given columns, ascending, nulls last.
    pub fn sort_by_columns<S: AsRef<str>>(&self, columns: &[S]) -> Self {
        let keys: Vec<usize> = columns
            .iter()
            .filter_map(|name| self.column_index(name.as_ref()))
            .collect();
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            keys.iter()
                .map(|&idx| a[idx].cmp(&b[idx]))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Self::from_rows(self.columns.clone(), rows)
    }
}

fn build_index(columns: &[String]) -> HashMap<String, usize> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), idx))
        .collect()
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a FlatTable,
    row: usize,
}

impl<'a> RowView<'a> {
    pub fn position(&self) -> usize {
        self.row
    }

    pub fn get(&self, column: &str) -> &'a CellValue {
        self.table.cell(self.row, column)
    }

    pub fn id(&self) -> CellValue {
        self.table.row_id(self.row)
    }

    /// `(column, cell)` pairs in column order.
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a CellValue)> {
        let table = self.table;
        table
            .columns
            .iter()
            .map(String::as_str)
            .zip(table.rows[self.row].iter())
    }
}

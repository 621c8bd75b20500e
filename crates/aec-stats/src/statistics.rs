//! Grouped statistics over a unit-normalized product table.

use std::collections::{BTreeMap, BTreeSet};

use aec_model::catalog::{
    DEFAULT_GROUPING_FIELD, ESTIMATED_COLUMN, GROUPING_FIELDS, LCA_MODULES, MF_NUM_FIELDS,
    MF_PERC_FIELDS, PHYSICAL_PROPERTIES_FIELDS, all_lca_columns, lca_field_columns,
    material_fact_column, scaling_estimated_column,
};
use aec_model::{
    AecError, CellValue, FlatTable, Metric, OutlierPolicy, Result, StatisticsRequest, UnitTarget,
};
use aec_transform::filter::{RowFilters, cell_matches, filter_table};
use aec_transform::{ProductData, convert};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::{FieldStatistics, Observation, compute_field};
use crate::groups::{GroupCombination, GroupingDomain, enumerate, grouping_domains};
use crate::outliers::remove_outliers;

/// Column holding the number of products in each group.
pub const TOTAL_COUNT_COLUMN: &str = "total_count";

/// Numeric fields present in the table, by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailableFields {
    pub material_fact_numerical_fields: Vec<String>,
    pub material_fact_percentage_fields: Vec<String>,
    pub physical_properties_fields: Vec<String>,
    pub lca_field_modules: Vec<String>,
}

impl AvailableFields {
    /// All categories concatenated in declaration order.
    pub fn all(&self) -> Vec<String> {
        self.material_fact_numerical_fields
            .iter()
            .chain(&self.material_fact_percentage_fields)
            .chain(&self.physical_properties_fields)
            .chain(&self.lca_field_modules)
            .cloned()
            .collect()
    }
}

/// Product data expressed in one unit, ready for statistics.
///
/// Every row carries an `estimated` flag: the target unit's scaling-factor
/// estimate, or `false` for the declared unit. Rows without a flag are
/// dropped at construction.
#[derive(Debug, Clone)]
pub struct ProductStatistics {
    data: ProductData,
    unit: UnitTarget,
}

impl ProductStatistics {
    pub fn new(data: &ProductData, unit: UnitTarget) -> Result<Self> {
        if unit == UnitTarget::DeclaredUnit {
            warn!(
                "unit is set to declared_unit; LCA fields are not expressed in the same unit, \
                 which may affect the validity of statistics. Set a unit such as kg instead"
            );
        }
        let converted = convert(data.table(), &unit, 1.0).into_result()?;
        let estimated: Vec<CellValue> = match &unit {
            UnitTarget::DeclaredUnit => vec![CellValue::Bool(false); converted.height()],
            UnitTarget::Unit(name) => {
                let column = scaling_estimated_column(name);
                converted
                    .column_values(&column)
                    .map(|values| values.cloned().collect())
                    .ok_or(AecError::MissingColumn { column })?
            }
        };
        let table = converted
            .with_column(ESTIMATED_COLUMN, estimated)
            .filter_rows(|row| !row.get(ESTIMATED_COLUMN).is_null());
        info!(
            unit = %unit,
            products = table.height(),
            dropped = data.len().saturating_sub(table.height()),
            "prepared products for statistics"
        );
        Ok(Self {
            data: ProductData::from_table(table),
            unit,
        })
    }

    pub fn unit(&self) -> &UnitTarget {
        &self.unit
    }

    pub fn data(&self) -> &ProductData {
        &self.data
    }

    pub fn table(&self) -> &FlatTable {
        self.data.table()
    }

    /// LCA field × module columns present in the table.
    ///
    /// `None` selects every LCA field or module.
    pub fn lca_fields(&self, fields: Option<&[&str]>, modules: Option<&[&str]>) -> FlatTable {
        let columns = match (fields, modules) {
            (None, None) => all_lca_columns(),
            (fields, modules) => {
                let all: Vec<&str> = aec_model::catalog::lca_fields().collect();
                lca_field_columns(fields.unwrap_or(&all), modules.unwrap_or(LCA_MODULES))
            }
        };
        self.table().select(&columns)
    }

    /// Distinct values of the standard grouping fields present in the table.
    pub fn available_groupings(&self) -> BTreeMap<String, BTreeSet<CellValue>> {
        GROUPING_FIELDS
            .iter()
            .filter_map(|field| GroupingDomain::from_table(self.table(), field).ok())
            .map(|domain| (domain.field, domain.values.into_iter().collect()))
            .collect()
    }

    pub fn available_fields_dict(&self) -> AvailableFields {
        let table = self.table();
        let present = |columns: Vec<String>| -> Vec<String> {
            columns
                .into_iter()
                .filter(|column| table.has_column(column))
                .collect()
        };
        AvailableFields {
            material_fact_numerical_fields: present(
                MF_NUM_FIELDS.iter().map(|f| material_fact_column(f)).collect(),
            ),
            material_fact_percentage_fields: present(
                MF_PERC_FIELDS.iter().map(|f| material_fact_column(f)).collect(),
            ),
            physical_properties_fields: present(
                PHYSICAL_PROPERTIES_FIELDS.iter().map(ToString::to_string).collect(),
            ),
            lca_field_modules: present(all_lca_columns()),
        }
    }

    pub fn available_fields(&self) -> Vec<String> {
        self.available_fields_dict().all()
    }

    fn eligible_rows(&self, include_estimated_values: bool) -> FlatTable {
        if include_estimated_values {
            self.table().clone()
        } else {
            self.table()
                .filter_rows(|row| row.get(ESTIMATED_COLUMN).as_bool() == Some(false))
        }
    }

    /// Grouped statistics table.
    ///
    /// One row per grouping combination with at least `min_count` products
    /// where at least one field had `min_count` values. Columns: grouping
    /// fields, `total_count`, then `<field>.<metric>` per field and metric.
    /// Rows are sorted by grouping values and count; all-null columns are
    /// dropped and count columns are integers with missing counts as 0.
    pub fn get_statistics(&self, request: &StatisticsRequest) -> Result<FlatTable> {
        let table = self.eligible_rows(request.include_estimated_values);
        let fields = match &request.fields {
            Some(fields) => fields.clone(),
            None => self.available_fields(),
        };
        if let Some(missing) = fields.iter().find(|field| !table.has_column(field)) {
            return Err(AecError::MissingColumn {
                column: missing.clone(),
            });
        }
        let group_by = match &request.group_by {
            Some(group_by) => group_by.clone(),
            None => vec![DEFAULT_GROUPING_FIELD.to_string()],
        };

        let domains = grouping_domains(&table, &group_by)?;
        let combinations = enumerate(
            &table,
            &domains,
            request.min_count,
            request.max_combinations,
        )?;

        let mut rows: Vec<(Vec<CellValue>, Vec<Option<FieldStatistics>>)> = Vec::new();
        for combination in &combinations {
            let stats = self.combination_statistics(&table, combination, &fields, request);
            if stats.iter().any(Option::is_some) {
                let mut key: Vec<CellValue> =
                    combination.values.iter().map(|(_, value)| value.clone()).collect();
                key.push(CellValue::Int(combination.count as i64));
                rows.push((key, stats));
            }
        }
        debug!(
            combinations = combinations.len(),
            rows = rows.len(),
            fields = fields.len(),
            "computed grouped statistics"
        );

        let mut columns = group_by.clone();
        columns.push(TOTAL_COUNT_COLUMN.to_string());
        let key_columns = columns.clone();
        for field in &fields {
            columns.extend(request.metrics.iter().map(|metric| metric.column(field)));
        }
        let cells = rows
            .into_iter()
            .map(|(mut row, stats)| {
                for field_stats in &stats {
                    for metric in &request.metrics {
                        let cell = field_stats
                            .as_ref()
                            .map_or(CellValue::Null, |s| s.metric_cell(*metric));
                        row.push(cell);
                    }
                }
                row
            })
            .collect();

        let statistics = FlatTable::from_rows(columns, cells)
            .sort_by_columns(&key_columns)
            .drop_null_columns();
        Ok(coerce_counts(&statistics))
    }

    fn combination_statistics(
        &self,
        table: &FlatTable,
        combination: &GroupCombination,
        fields: &[String],
        request: &StatisticsRequest,
    ) -> Vec<Option<FieldStatistics>> {
        fields
            .iter()
            .map(|field| {
                let values: Vec<Observation> = combination
                    .rows
                    .iter()
                    .filter_map(|&row| {
                        let value = table.cell(row, field).as_f64()?;
                        Some(Observation::new(table.row_id(row), value))
                    })
                    .collect();
                (values.len() >= request.min_count).then(|| {
                    compute_field(&values, &request.metrics, &request.outliers, request.min_count)
                })
            })
            .collect()
    }

    /// Rows holding a value for `field`, optionally filtered and with
    /// outliers removed. Unknown fields give an empty table.
    pub fn field_distribution(
        &self,
        field: &str,
        filters: &RowFilters,
        include_estimated_values: bool,
        outliers: &OutlierPolicy,
    ) -> Result<FlatTable> {
        let mut table = if filters.is_empty() {
            self.table().clone()
        } else {
            filter_table(self.table(), filters)?
        };
        if !include_estimated_values {
            table = table.filter_rows(|row| row.get(ESTIMATED_COLUMN).as_bool() == Some(false));
        }
        if !self.available_fields().iter().any(|f| f == field) {
            return Ok(FlatTable::default());
        }
        let table = table.filter_rows(|row| row.get(field).as_f64().is_some());
        if !outliers.remove_outliers {
            return Ok(table);
        }

        let positions: Vec<Observation> = (0..table.height())
            .filter_map(|row| {
                let value = table.cell(row, field).as_f64()?;
                Some(Observation::new(row as i64, value))
            })
            .collect();
        let kept: Vec<usize> = remove_outliers(positions, outliers)
            .kept
            .iter()
            .filter_map(|o| match o.id {
                CellValue::Int(row) => usize::try_from(row).ok(),
                _ => None,
            })
            .collect();
        Ok(table.take_rows(&kept))
    }

    /// Values of `field` per distinct value of `group_by_field`.
    pub fn grouped_data(
        table: &FlatTable,
        field: &str,
        group_by_field: &str,
    ) -> Result<BTreeMap<CellValue, Vec<CellValue>>> {
        if !table.has_column(group_by_field) {
            return Err(AecError::MissingColumn {
                column: group_by_field.to_string(),
            });
        }
        let domain = GroupingDomain::from_table(table, group_by_field)?;
        Ok(domain
            .values
            .iter()
            .cloned()
            .map(|value| {
                let values = table
                    .iter_rows()
                    .filter(|row| cell_matches(row.get(group_by_field), &value, domain.list_column))
                    .map(|row| row.get(field).clone())
                    .collect();
                (value, values)
            })
            .collect())
    }

    /// [`field_distribution`](Self::field_distribution) split by
    /// `group_by_field`.
    pub fn field_distribution_by_group(
        &self,
        field: &str,
        group_by_field: &str,
        filters: &RowFilters,
        include_estimated_values: bool,
        outliers: &OutlierPolicy,
    ) -> Result<BTreeMap<CellValue, Vec<CellValue>>> {
        let table = self.field_distribution(field, filters, include_estimated_values, outliers)?;
        Self::grouped_data(&table, field, group_by_field)
    }
}

/// Count columns hold integers; missing counts become 0.
fn coerce_counts(table: &FlatTable) -> FlatTable {
    let count_suffix = format!(".{}", Metric::Count.as_str());
    let mut coerced = table.clone();
    for (idx, column) in table.columns().iter().enumerate() {
        if column != TOTAL_COUNT_COLUMN && !column.contains(&count_suffix) {
            continue;
        }
        for row in 0..table.height() {
            let value = match table.cell(row, column) {
                CellValue::Int(i) => CellValue::Int(*i),
                CellValue::Float(f) if f.is_finite() => CellValue::Int(*f as i64),
                _ => CellValue::Int(0),
            };
            coerced.set_cell(row, idx, value);
        }
    }
    coerced
}

//! Unit conversion of scalable LCA columns.

use std::collections::BTreeSet;

use aec_model::catalog::{scalable_columns, scaling_factors_prefix, scaling_value_column};
use aec_model::{AecError, CellValue, FlatTable, Result, UnitTarget};
use tracing::{debug, warn};

/// Outcome of a unit conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Converted(FlatTable),
    /// The requested unit has no scaling-factor column.
    Unavailable {
        requested: String,
        available: Vec<String>,
    },
}

impl Conversion {
    pub fn table(&self) -> Option<&FlatTable> {
        match self {
            Self::Converted(table) => Some(table),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn into_table(self) -> Option<FlatTable> {
        match self {
            Self::Converted(table) => Some(table),
            Self::Unavailable { .. } => None,
        }
    }

    /// Turn an unavailable unit into [`AecError::UnitUnavailable`].
    pub fn into_result(self) -> Result<FlatTable> {
        match self {
            Self::Converted(table) => Ok(table),
            Self::Unavailable {
                requested,
                available,
            } => Err(AecError::UnitUnavailable {
                unit: requested,
                available,
            }),
        }
    }
}

/// Units with a `material_facts.scaling_factors.<unit>.value` column.
pub fn available_units(table: &FlatTable) -> BTreeSet<String> {
    let prefix = scaling_factors_prefix();
    table
        .columns()
        .iter()
        .filter_map(|column| {
            let unit = column.strip_prefix(&prefix)?.strip_suffix(".value")?;
            (!unit.is_empty() && !unit.contains('.')).then(|| unit.to_string())
        })
        .collect()
}

/// Scalable columns that exist in `table`, in catalog order.
pub fn scalable_columns_in(table: &FlatTable) -> Vec<String> {
    scalable_columns()
        .into_iter()
        .filter(|column| table.has_column(column))
        .collect()
}

/// Rescale every scalable column to `target`, multiplied by `amount`.
///
/// For the declared unit an `amount` of 1 returns the table unchanged.
/// Otherwise each cell is divided by the row's scaling factor; a missing,
/// zero, or non-numeric factor and non-numeric cells yield null.
pub fn convert(table: &FlatTable, target: &UnitTarget, amount: f64) -> Conversion {
    let columns = scalable_columns_in(table);
    match target {
        UnitTarget::DeclaredUnit => {
            if amount == 1.0 {
                return Conversion::Converted(table.clone());
            }
            let factors = vec![CellValue::Float(1.0); table.height()];
            Conversion::Converted(rescale(table, &columns, &factors, amount))
        }
        UnitTarget::Unit(unit) => {
            let available = available_units(table);
            if !available.contains(unit) {
                warn!(unit = %unit, available = ?available, "unit not available");
                return Conversion::Unavailable {
                    requested: unit.clone(),
                    available: available.into_iter().collect(),
                };
            }
            let factors: Vec<CellValue> = table
                .column_values(&scaling_value_column(unit))
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            debug!(unit = %unit, columns = columns.len(), "scaling to unit");
            Conversion::Converted(rescale(table, &columns, &factors, amount))
        }
    }
}

fn rescale(table: &FlatTable, columns: &[String], factors: &[CellValue], amount: f64) -> FlatTable {
    let mut scaled = table.clone();
    for column in columns {
        let Some(idx) = table.column_index(column) else {
            continue;
        };
        for row in 0..table.height() {
            let cell = table.cell(row, column);
            if cell.is_null() {
                continue;
            }
            let factor = factors.get(row).unwrap_or(&CellValue::Null);
            scaled.set_cell(row, idx, scale_cell(cell, factor, amount));
        }
    }
    scaled
}

fn scale_cell(cell: &CellValue, factor: &CellValue, amount: f64) -> CellValue {
    match (cell.as_f64(), factor.as_f64()) {
        (Some(value), Some(factor)) if factor != 0.0 => CellValue::float(value / factor * amount),
        _ => CellValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> FlatTable {
        FlatTable::from_rows(
            vec![
                "unique_product_uuid_v2".into(),
                "material_facts.odp".into(),
                "material_facts.scaling_factors.kg.estimated".into(),
                "material_facts.scaling_factors.kg.value".into(),
            ],
            vec![
                vec!["p1".into(), CellValue::Int(10), false.into(), CellValue::Int(2)],
                vec!["p2".into(), CellValue::Float(4.0), true.into(), CellValue::Int(0)],
                vec!["p3".into(), CellValue::Null, false.into(), CellValue::Float(4.0)],
            ],
        )
    }

    #[test]
    fn available_units_read_value_columns() {
        let units = available_units(&table());
        assert_eq!(units.into_iter().collect::<Vec<_>>(), vec!["kg"]);
    }

    #[test]
    fn divides_by_scaling_factor() {
        let scaled = convert(&table(), &UnitTarget::parse("kg"), 3.0)
            .into_table()
            .unwrap();
        assert_relative_eq!(scaled.cell(0, "material_facts.odp").as_f64().unwrap(), 15.0);
        assert!(scaled.cell(1, "material_facts.odp").is_null());
        assert!(scaled.cell(2, "material_facts.odp").is_null());
    }

    #[test]
    fn unavailable_unit_lists_alternatives() {
        let outcome = convert(&table(), &UnitTarget::parse("m3"), 1.0);
        assert_eq!(
            outcome,
            Conversion::Unavailable {
                requested: "m3".into(),
                available: vec!["kg".into()],
            }
        );
        assert!(matches!(
            outcome.into_result(),
            Err(AecError::UnitUnavailable { .. })
        ));
    }

    #[test]
    fn declared_unit_multiplies_by_amount() {
        let scaled = convert(&table(), &UnitTarget::DeclaredUnit, 2.0)
            .into_table()
            .unwrap();
        assert_eq!(scaled.cell(0, "material_facts.odp"), &CellValue::Float(20.0));
        assert_eq!(scaled.cell(1, "material_facts.odp"), &CellValue::Float(8.0));
    }
}

//! EPDx export.
//!
//! Each product row becomes one EPDx record. Impact categories are filled
//! from `material_facts.<lca_field>.<module>` columns for the fields and
//! modules EPDx has a slot for; everything else stays null.

use std::path::Path;

use aec_model::catalog::{
    DECLARED_UNIT, EPDX_FORMAT_VERSION, EPDX_LCA_FIELDS, EPDX_MODULES, EPDX_SOURCE, EPDX_UNITS,
    EPDX_UNKNOWN, IDENTIFIER_COLUMN, MATERIAL_FACTS, epdx_subtype, epdx_unit,
    scaling_estimated_column, scaling_value_column,
};
use aec_model::{AecError, CellValue, FlatTable, RowView};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::common::create_file;
use crate::error::{OutputError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Values of one impact category per EPDx module.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImpactCategory {
    pub a1a3: Option<f64>,
    pub a4: Option<f64>,
    pub a5: Option<f64>,
    pub b1: Option<f64>,
    pub b2: Option<f64>,
    pub b3: Option<f64>,
    pub b4: Option<f64>,
    pub b5: Option<f64>,
    pub b6: Option<f64>,
    pub b7: Option<f64>,
    pub c1: Option<f64>,
    pub c2: Option<f64>,
    pub c3: Option<f64>,
    pub c4: Option<f64>,
    pub d: Option<f64>,
}

impl ImpactCategory {
    fn module_mut(&mut self, key: &str) -> Option<&mut Option<f64>> {
        Some(match key {
            "a1a3" => &mut self.a1a3,
            "a4" => &mut self.a4,
            "a5" => &mut self.a5,
            "b1" => &mut self.b1,
            "b2" => &mut self.b2,
            "b3" => &mut self.b3,
            "b4" => &mut self.b4,
            "b5" => &mut self.b5,
            "b6" => &mut self.b6,
            "b7" => &mut self.b7,
            "c1" => &mut self.c1,
            "c2" => &mut self.c2,
            "c3" => &mut self.c3,
            "c4" => &mut self.c4,
            "d" => &mut self.d,
            _ => return None,
        })
    }

    fn from_row(row: &RowView<'_>, lca_field: &str) -> Self {
        let mut category = Self::default();
        for (module, key) in EPDX_MODULES {
            let column = format!("{MATERIAL_FACTS}.{lca_field}.{module}");
            if let Some(slot) = category.module_mut(key) {
                *slot = row.get(&column).as_f64();
            }
        }
        category
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionMetaData {
    pub estimated: Option<bool>,
}

/// Scaling factor to another EPDx unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitConversion {
    pub value: f64,
    pub to: String,
    pub meta_data: ConversionMetaData,
}

/// One EPDx record. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpdxRecord {
    /// Product identifier; null when the row has none.
    pub id: Option<String>,
    pub name: Option<String>,
    pub declared_unit: String,
    pub version: String,
    pub published_date: i64,
    pub valid_until: Option<i64>,
    pub format_version: String,
    pub source: String,
    pub reference_service_life: Option<f64>,
    pub standard: String,
    pub comment: Option<String>,
    pub location: Option<String>,
    pub subtype: String,
    pub conversions: Vec<UnitConversion>,
    pub gwp: Option<ImpactCategory>,
    pub odp: Option<ImpactCategory>,
    pub ap: Option<ImpactCategory>,
    pub ep: Option<ImpactCategory>,
    pub pocp: Option<ImpactCategory>,
    pub adpe: Option<ImpactCategory>,
    pub adpf: Option<ImpactCategory>,
    pub penre: Option<ImpactCategory>,
    pub pere: Option<ImpactCategory>,
    pub perm: Option<ImpactCategory>,
    pub pert: Option<ImpactCategory>,
    pub penrt: Option<ImpactCategory>,
    pub penrm: Option<ImpactCategory>,
    pub sm: Option<ImpactCategory>,
    pub rsf: Option<ImpactCategory>,
    pub nrsf: Option<ImpactCategory>,
    pub fw: Option<ImpactCategory>,
    pub hwd: Option<ImpactCategory>,
    pub nhwd: Option<ImpactCategory>,
    pub rwd: Option<ImpactCategory>,
    pub cru: Option<ImpactCategory>,
    pub mfr: Option<ImpactCategory>,
    pub mer: Option<ImpactCategory>,
    pub eee: Option<ImpactCategory>,
    pub eet: Option<ImpactCategory>,
    pub meta_data: Option<serde_json::Value>,
}

impl EpdxRecord {
    fn category_mut(&mut self, key: &str) -> Option<&mut Option<ImpactCategory>> {
        Some(match key {
            "gwp" => &mut self.gwp,
            "odp" => &mut self.odp,
            "ap" => &mut self.ap,
            "ep" => &mut self.ep,
            "pocp" => &mut self.pocp,
            "adpe" => &mut self.adpe,
            "adpf" => &mut self.adpf,
            "penre" => &mut self.penre,
            "pere" => &mut self.pere,
            "perm" => &mut self.perm,
            "pert" => &mut self.pert,
            "penrt" => &mut self.penrt,
            "penrm" => &mut self.penrm,
            "sm" => &mut self.sm,
            "rsf" => &mut self.rsf,
            "nrsf" => &mut self.nrsf,
            "fw" => &mut self.fw,
            "hwd" => &mut self.hwd,
            "nhwd" => &mut self.nhwd,
            "rwd" => &mut self.rwd,
            "cru" => &mut self.cru,
            "mfr" => &mut self.mfr,
            "mer" => &mut self.mer,
            "eee" => &mut self.eee,
            "eet" => &mut self.eet,
            _ => return None,
        })
    }

    fn empty(id: Option<String>, published_date: i64) -> Self {
        Self {
            id,
            name: None,
            declared_unit: EPDX_UNKNOWN.to_string(),
            version: EPDX_UNKNOWN.to_string(),
            published_date,
            valid_until: None,
            format_version: EPDX_FORMAT_VERSION.to_string(),
            source: EPDX_SOURCE.to_string(),
            reference_service_life: None,
            standard: EPDX_UNKNOWN.to_string(),
            comment: None,
            location: None,
            subtype: EPDX_UNKNOWN.to_string(),
            conversions: Vec::new(),
            gwp: None,
            odp: None,
            ap: None,
            ep: None,
            pocp: None,
            adpe: None,
            adpf: None,
            penre: None,
            pere: None,
            perm: None,
            pert: None,
            penrt: None,
            penrm: None,
            sm: None,
            rsf: None,
            nrsf: None,
            fw: None,
            hwd: None,
            nhwd: None,
            rwd: None,
            cru: None,
            mfr: None,
            mer: None,
            eee: None,
            eet: None,
            meta_data: None,
        }
    }
}

/// Options for EPDx export.
#[derive(Debug, Clone, Default)]
pub struct EpdxOptions {
    /// `published_date` as a Unix timestamp; the export time when unset.
    pub published_at: Option<i64>,
}

impl EpdxOptions {
    #[must_use]
    pub fn with_published_at(mut self, timestamp: i64) -> Self {
        self.published_at = Some(timestamp);
        self
    }
}

/// `YYYY-MM-DD` as a Unix timestamp at UTC midnight.
pub fn date_to_timestamp(date: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

/// EN 15804 amendment named by the compliances, or `UNKNOWN`.
pub fn determine_standard(compliances: &CellValue) -> &'static str {
    let joined = match compliances {
        CellValue::Null => return EPDX_UNKNOWN,
        CellValue::List(_) => compliances
            .list_cells()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    };
    if !joined.contains("15804") {
        EPDX_UNKNOWN
    } else if joined.contains("A2") {
        "EN15804A2"
    } else if joined.contains("A1") {
        "EN15804A1"
    } else {
        EPDX_UNKNOWN
    }
}

fn text(cell: &CellValue) -> Option<String> {
    (!cell.is_null()).then(|| cell.to_string())
}

fn conversions(table: &FlatTable, row: &RowView<'_>) -> Vec<UnitConversion> {
    EPDX_UNITS
        .iter()
        .filter(|(unit, _)| table.has_column(&scaling_estimated_column(unit)))
        .filter_map(|(unit, code)| {
            let value = row.get(&scaling_value_column(unit)).as_f64()?;
            Some(UnitConversion {
                value,
                to: (*code).to_string(),
                meta_data: ConversionMetaData {
                    estimated: row.get(&scaling_estimated_column(unit)).as_bool(),
                },
            })
        })
        .collect()
}

fn record(table: &FlatTable, row: &RowView<'_>, published_date: i64) -> EpdxRecord {
    let material_fact = |field: &str| row.get(&format!("{MATERIAL_FACTS}.{field}"));
    let id = text(row.get(IDENTIFIER_COLUMN));
    if id.is_none() {
        warn!(row = row.position(), "exporting EPDx record without a product id");
    }
    let mut record = EpdxRecord::empty(id, published_date);
    record.name = text(row.get("name"));
    record.declared_unit = material_fact(DECLARED_UNIT)
        .as_str()
        .and_then(epdx_unit)
        .unwrap_or(EPDX_UNKNOWN)
        .to_string();
    record.valid_until = material_fact("data_source_link__certificate_expiry")
        .as_str()
        .and_then(date_to_timestamp);
    record.reference_service_life = row.get("life_expectancy").as_f64();
    record.standard = determine_standard(material_fact("compliances")).to_string();
    record.location = text(row.get("country"));
    record.subtype = material_fact("certificate_subtype")
        .as_str()
        .and_then(epdx_subtype)
        .unwrap_or(EPDX_UNKNOWN)
        .to_string();
    record.conversions = conversions(table, row);
    for (lca_field, key) in EPDX_LCA_FIELDS {
        let Some(key) = key else { continue };
        if let Some(slot) = record.category_mut(key) {
            *slot = Some(ImpactCategory::from_row(row, lca_field));
        }
    }
    record
}

/// Convert every row of `table` to an EPDx record.
pub fn export(table: &FlatTable, options: Option<&EpdxOptions>) -> Result<Vec<EpdxRecord>> {
    if !table.has_column(IDENTIFIER_COLUMN) {
        return Err(AecError::MissingIdentifierColumn {
            column: IDENTIFIER_COLUMN.to_string(),
        }
        .into());
    }
    let options = options.cloned().unwrap_or_default();
    let published_date = options
        .published_at
        .unwrap_or_else(|| Utc::now().timestamp());
    let records: Vec<EpdxRecord> = table
        .iter_rows()
        .map(|row| record(table, &row, published_date))
        .collect();
    debug!(records = records.len(), "exported EPDx records");
    Ok(records)
}

/// Export `table` and write the records as a JSON array to `path`.
pub fn write_epdx_file(
    path: &Path,
    table: &FlatTable,
    options: Option<&EpdxOptions>,
) -> Result<Vec<EpdxRecord>> {
    let records = export(table, options)?;
    let mut file = create_file(path)?;
    serde_json::to_writer_pretty(&mut file, &records)?;
    std::io::Write::flush(&mut file).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dates_parse_to_utc_midnight() {
        assert_eq!(date_to_timestamp("2024-01-02"), Some(1_704_153_600));
        assert_eq!(date_to_timestamp("2024-13-45"), None);
        assert_eq!(date_to_timestamp(""), None);
    }

    #[test]
    fn standard_prefers_a2() {
        let both = CellValue::List(vec![json!("EN 15804+A1"), json!("EN 15804+A2")]);
        assert_eq!(determine_standard(&both), "EN15804A2");
        let a1 = CellValue::List(vec![json!("EN 15804+A1")]);
        assert_eq!(determine_standard(&a1), "EN15804A1");
        let other = CellValue::List(vec![json!("ISO 14025 A2")]);
        assert_eq!(determine_standard(&other), EPDX_UNKNOWN);
        assert_eq!(determine_standard(&CellValue::Null), EPDX_UNKNOWN);
    }

    #[test]
    fn every_mapped_key_has_a_slot() {
        let mut record = EpdxRecord::empty(Some("p".into()), 0);
        for (_, key) in EPDX_LCA_FIELDS {
            if let Some(key) = key {
                assert!(record.category_mut(key).is_some(), "{key}");
            }
        }
        let mut category = ImpactCategory::default();
        for (_, key) in EPDX_MODULES {
            assert!(category.module_mut(key).is_some(), "{key}");
        }
    }
}

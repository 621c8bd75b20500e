//! Tests for CSV, JSON and EPDx output.

use aec_model::{CellValue, FlatTable, ProductRecord};
use aec_output::{
    CsvWriteOptions, EpdxOptions, OutputError, export, to_json_string, write_csv, write_csv_file,
    write_epdx_file, write_json_file,
};
use aec_transform::ProductData;
use serde_json::{Value, json};
use tempfile::TempDir;

fn product() -> ProductRecord {
    ProductRecord::from_value(json!({
        "unique_product_uuid_v2": "p1",
        "name": "Brick",
        "country": "Denmark",
        "life_expectancy": 60,
        "material_facts": {
            "declared_unit": "m2",
            "certificate_subtype": "Average Dataset",
            "compliances": ["EN 15804+A2"],
            "data_source_link__certificate_expiry": "2024-01-02",
            "global_warming_potential_fossil": {"A1A2A3": 12.5, "A1": 3.0, "C3": 0.5},
            "scaling_factors": {"kg": {"value": 0.02, "estimated": true}}
        }
    }))
    .unwrap()
}

#[test]
fn csv_follows_column_order_with_empty_nulls() {
    let table = FlatTable::from_rows(
        vec!["id".into(), "tags".into(), "value".into()],
        vec![
            vec!["a".into(), CellValue::List(vec![json!("x"), json!(1)]), CellValue::Int(3)],
            vec!["b".into(), CellValue::Null, CellValue::Float(0.5)],
        ],
    );
    let mut buffer = Vec::new();
    write_csv(&table, &mut buffer, None).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(text, "id,tags,value\na,\"[\"\"x\"\",1]\",3\nb,,0.5\n");

    let mut buffer = Vec::new();
    let options = CsvWriteOptions::default().with_delimiter(b';').with_header(false);
    write_csv(&table, &mut buffer, Some(&options)).unwrap();
    assert!(String::from_utf8(buffer).unwrap().starts_with("a;"));
}

#[test]
fn files_are_written_into_new_directories() {
    let dir = TempDir::new().unwrap();
    let data = ProductData::from_records(vec![product()]);

    let csv_path = dir.path().join("out/products.csv");
    write_csv_file(&csv_path, data.table(), None).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("unique_product_uuid_v2,"));

    let json_path = dir.path().join("out/products.json");
    write_json_file(&json_path, data.records()).unwrap();
    let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed[0]["name"], json!("Brick"));
    assert_eq!(
        to_json_string(data.records()).unwrap(),
        serde_json::to_string_pretty(&parsed).unwrap()
    );
}

#[test]
fn epdx_maps_product_fields() {
    let data = ProductData::from_records(vec![product()]);
    let options = EpdxOptions::default().with_published_at(1_700_000_000);
    let records = export(data.table(), Some(&options)).unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];

    assert_eq!(record.id.as_deref(), Some("p1"));
    assert_eq!(record.declared_unit, "M2");
    assert_eq!(record.version, "UNKNOWN");
    assert_eq!(record.published_date, 1_700_000_000);
    assert_eq!(record.valid_until, Some(1_704_153_600));
    assert_eq!(record.standard, "EN15804A2");
    assert_eq!(record.subtype, "Generic");
    assert_eq!(record.location.as_deref(), Some("Denmark"));
    assert_eq!(record.reference_service_life, Some(60.0));

    let gwp = record.gwp.as_ref().unwrap();
    assert_eq!(gwp.a1a3, Some(12.5));
    assert_eq!(gwp.c3, Some(0.5));
    assert_eq!(gwp.d, None);
    assert!(record.odp.is_some());

    let targets: Vec<&str> = record.conversions.iter().map(|c| c.to.as_str()).collect();
    assert_eq!(targets, vec!["M2", "KG"]);
    assert_eq!(record.conversions[1].meta_data.estimated, Some(true));
}

#[test]
fn epdx_json_keeps_field_order() {
    let data = ProductData::from_records(vec![product()]);
    let options = EpdxOptions::default().with_published_at(0);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("epdx.json");
    write_epdx_file(&path, data.table(), Some(&options)).unwrap();

    let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let keys: Vec<&str> = parsed[0]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(&keys[..4], &["id", "name", "declared_unit", "version"]);
    assert_eq!(keys.last(), Some(&"meta_data"));
    assert_eq!(parsed[0]["comment"], Value::Null);
    assert_eq!(parsed[0]["gwp"]["a1a3"], json!(12.5));
}

#[test]
fn invalid_expiry_date_becomes_null() {
    let mut value = product().into_value();
    value["material_facts"]["data_source_link__certificate_expiry"] = json!("2024-13-45");
    let data = ProductData::from_records(vec![ProductRecord::from_value(value).unwrap()]);
    let records = export(data.table(), None).unwrap();
    assert_eq!(records[0].valid_until, None);
}

#[test]
fn epdx_requires_identifier_column() {
    let table = FlatTable::from_rows(vec!["name".into()], vec![vec!["Brick".into()]]);
    let err = export(&table, None).unwrap_err();
    assert!(matches!(err, OutputError::Model(_)));
}

#[test]
fn missing_product_id_is_exported_as_null() {
    let mut anonymous = product().into_value();
    anonymous["unique_product_uuid_v2"] = Value::Null;
    let data = ProductData::from_records(vec![
        product(),
        ProductRecord::from_value(anonymous).unwrap(),
    ]);
    let records = export(data.table(), None).unwrap();
    assert_eq!(records[1].id, None);
    let json = serde_json::to_value(&records[1]).unwrap();
    assert_eq!(json["id"], Value::Null);
}

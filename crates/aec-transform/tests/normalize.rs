//! Tests for record normalization.

use aec_model::{CellValue, ProductRecord};
use aec_transform::{ProductData, denormalize, normalize};
use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn record(value: Value) -> ProductRecord {
    ProductRecord::from_value(value).unwrap()
}

#[test]
fn columns_follow_identifier_source_then_sorted_material_facts() {
    let data = ProductData::from_records(vec![
        record(json!({
            "name": "Brick",
            "material_facts": {"odp": 1.0, "declared_unit": "kg"},
            "unique_product_uuid_v2": "p1",
            "company": "Acme"
        })),
        record(json!({
            "unique_product_uuid_v2": "p2",
            "country": "NL",
            "material_facts": {"acidification_potential": {"A1": 0.5}}
        })),
    ]);
    assert_eq!(
        data.table().columns(),
        &[
            "unique_product_uuid_v2",
            "name",
            "company",
            "country",
            "material_facts.acidification_potential.A1",
            "material_facts.declared_unit",
            "material_facts.odp",
            "material_facts.scaling_factors.kg.estimated",
            "material_facts.scaling_factors.kg.value",
        ]
    );
    assert!(data.table().cell(1, "name").is_null());
}

#[test]
fn without_identifier_keeps_source_order() {
    let table = normalize(&[record(json!({"b": 1, "a": 2, "material_facts": {"z": 1, "y": 2}}))]);
    assert_eq!(
        table.columns(),
        &["b", "a", "material_facts.y", "material_facts.z"]
    );
}

#[test]
fn lists_stay_whole_and_empty_mappings_vanish() {
    let table = normalize(&[record(json!({"tags": ["a", "b"], "extra": {}}))]);
    assert_eq!(table.columns(), &["tags"]);
    assert_eq!(
        table.cell(0, "tags"),
        &CellValue::List(vec![json!("a"), json!("b")])
    );
}

#[test]
fn denormalize_prunes_nulls_and_stale_estimates() {
    let data = ProductData::from_records(vec![
        record(json!({
            "unique_product_uuid_v2": "p1",
            "material_facts": {"recycled_content": 30, "recycled_content_estimated": true}
        })),
        record(json!({"unique_product_uuid_v2": "p2"})),
    ]);
    let records = denormalize(data.table());
    assert_eq!(records[1].clone().into_value(), json!({"unique_product_uuid_v2": "p2"}));
    assert_eq!(
        records[0].get_path("material_facts.recycled_content_estimated"),
        Some(&json!(true))
    );
}

#[test]
fn conflicting_paths_are_skipped_not_fatal() {
    let data = ProductData::from_records(vec![
        record(json!({"a": 1})),
        record(json!({"a": {"b": 2}})),
    ]);
    let records = denormalize(data.table());
    assert_eq!(records[0].clone().into_value(), json!({"a": 1}));
    assert_eq!(records[1].clone().into_value(), json!({"a": {"b": 2}}));
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        (-1.0e6..1.0e6f64).prop_map(Value::from),
        "[a-z ]{1,8}".prop_map(Value::from),
        prop::collection::vec(any::<i16>().prop_map(Value::from), 0..3).prop_map(Value::Array),
    ]
}

fn nested() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop::collection::btree_map("[a-e]{1,3}", inner, 1..4)
            .prop_map(|map| Value::Object(map.into_iter().collect::<Map<String, Value>>()))
    })
}

fn product() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-e]{1,3}", nested(), 1..5)
        .prop_map(|map| Value::Object(map.into_iter().collect()))
}

proptest! {
    #[test]
    fn flatten_then_unflatten_restores_null_free_records(value in product()) {
        let original = record(value);
        let rebuilt = original.flatten().unflatten();
        prop_assert!(rebuilt.conflicts.is_empty());
        prop_assert_eq!(&rebuilt.record, &original);

        let table = normalize(std::slice::from_ref(&original));
        let records = denormalize(&table);
        prop_assert_eq!(records.len(), 1);
        prop_assert_eq!(&records[0].clone().into_value(), &original.into_value());
    }
}

fn fact_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(json!(0.0)),
        (-1.0e6..1.0e6f64).prop_map(Value::from),
    ]
}

/// Material fact values keyed by name, each with an optional estimate flag.
fn material_facts() -> impl Strategy<Value = BTreeMap<String, (Value, Option<bool>)>> {
    prop::collection::btree_map(
        "[a-d]{1,3}",
        (fact_value(), prop::option::of(any::<bool>())),
        1..6,
    )
}

proptest! {
    #[test]
    fn denormalize_prunes_nulls_and_estimates_of_falsy_values(facts in material_facts()) {
        let mut map = Map::new();
        for (key, (value, estimated)) in &facts {
            map.insert(key.clone(), value.clone());
            if let Some(flag) = estimated {
                map.insert(format!("{key}_estimated"), Value::Bool(*flag));
            }
        }
        let original = record(json!({"unique_product_uuid_v2": "p1", "material_facts": map}));
        let records = denormalize(&normalize(std::slice::from_ref(&original)));
        prop_assert_eq!(records.len(), 1);
        let rebuilt = &records[0];
        prop_assert_eq!(rebuilt.get("unique_product_uuid_v2"), Some(&json!("p1")));

        for (key, (value, estimated)) in &facts {
            let path = format!("material_facts.{key}");
            let flag_path = format!("{path}_estimated");
            let expected_value = (!value.is_null()).then_some(value);
            prop_assert_eq!(rebuilt.get_path(&path), expected_value);

            let truthy = value.as_f64().is_some_and(|v| v != 0.0);
            let expected_flag = estimated.filter(|_| truthy).map(Value::Bool);
            prop_assert_eq!(rebuilt.get_path(&flag_path), expected_flag.as_ref());
        }
    }
}

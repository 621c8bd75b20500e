//! Tests for grouped statistics over unit-normalized product data.

use aec_model::{
    AecError, CellValue, FlatTable, Metric, OutlierMethod, OutlierPolicy, OutlierThresholds,
    ProductRecord, StatisticsRequest, UnitTarget,
};
use aec_stats::{ProductStatistics, TOTAL_COUNT_COLUMN};
use aec_transform::{ProductData, RowFilters};
use approx::assert_relative_eq;
use serde_json::{Value, json};

const CO2: &str = "material_facts.total_co2e_kg_mf";
const WATER: &str = "material_facts.water_use_kg";

fn product(id: &str, product_type: Value, co2: f64) -> Value {
    json!({
        "unique_product_uuid_v2": id,
        "name": format!("Product {id}"),
        "product_type": product_type,
        "material_facts": {"declared_unit": "kg", "total_co2e_kg_mf": co2}
    })
}

fn data(values: Vec<Value>) -> ProductData {
    ProductData::from_records(
        values
            .into_iter()
            .map(|value| ProductRecord::from_value(value).unwrap())
            .collect(),
    )
}

fn bricks(co2: &[f64]) -> ProductData {
    data(
        co2.iter()
            .enumerate()
            .map(|(i, value)| product(&format!("p{i}"), json!("Brick"), *value))
            .collect(),
    )
}

fn kg(data: &ProductData) -> ProductStatistics {
    ProductStatistics::new(data, UnitTarget::parse("kg")).unwrap()
}

#[test]
fn list_valued_grouping_counts_membership() {
    let stats = kg(&data(vec![
        product("p1", json!(["A", "B"]), 1.0),
        product("p2", json!(["B"]), 2.0),
    ]));
    let request = StatisticsRequest::new()
        .with_fields([CO2])
        .with_metrics([Metric::Count])
        .with_min_count(1)
        .with_outliers(OutlierPolicy::disabled());
    let table = stats.get_statistics(&request).unwrap();

    assert_eq!(
        table.columns(),
        &["product_type", TOTAL_COUNT_COLUMN, "material_facts.total_co2e_kg_mf.count"]
    );
    assert_eq!(table.height(), 2);
    assert_eq!(table.cell(0, "product_type"), &CellValue::from("A"));
    assert_eq!(table.cell(0, TOTAL_COUNT_COLUMN), &CellValue::Int(1));
    assert_eq!(table.cell(1, "product_type"), &CellValue::from("B"));
    assert_eq!(table.cell(1, TOTAL_COUNT_COLUMN), &CellValue::Int(2));
    assert!(matches!(
        table.cell(1, &Metric::Count.column(CO2)),
        CellValue::Int(2)
    ));
}

#[test]
fn default_request_removes_iqr_outliers() {
    let stats = kg(&bricks(&[1.0, 2.0, 3.0, 4.0, 100.0]));
    let table = stats.get_statistics(&StatisticsRequest::new()).unwrap();

    assert_eq!(table.height(), 1);
    assert_eq!(table.cell(0, TOTAL_COUNT_COLUMN), &CellValue::Int(5));
    assert_eq!(table.cell(0, &Metric::Count.column(CO2)), &CellValue::Int(4));
    assert_relative_eq!(
        table.cell(0, &Metric::Mean.column(CO2)).as_f64().unwrap(),
        2.5
    );
    assert_relative_eq!(
        table.cell(0, &Metric::Median.column(CO2)).as_f64().unwrap(),
        2.5
    );
}

#[test]
fn outlier_ids_name_the_dropped_products() {
    let stats = kg(&bricks(&[1.0, 2.0, 3.0, 4.0, 100.0]));
    let request = StatisticsRequest::new()
        .with_fields([CO2])
        .with_metrics([Metric::OutlierIds]);
    let table = stats.get_statistics(&request).unwrap();
    assert_eq!(
        table.cell(0, &Metric::OutlierIds.column(CO2)),
        &CellValue::List(vec![json!("p4")])
    );
}

#[test]
fn groups_below_min_count_produce_no_rows() {
    let stats = kg(&bricks(&[1.0, 2.0, 3.0]));
    let table = stats.get_statistics(&StatisticsRequest::new()).unwrap();
    assert!(table.is_empty());
}

#[test]
fn estimated_scaling_factors_are_excluded_by_default() {
    let mut values: Vec<Value> = (0..4)
        .map(|i| product(&format!("p{i}"), json!("Brick"), f64::from(i + 1)))
        .collect();
    values.push(json!({
        "unique_product_uuid_v2": "estimated",
        "product_type": "Brick",
        "material_facts": {
            "declared_unit": "m2",
            "total_co2e_kg_mf": 10.0,
            "scaling_factors": {"kg": {"value": 2, "estimated": true}}
        }
    }));
    values.push(json!({
        "unique_product_uuid_v2": "no-kg",
        "product_type": "Brick",
        "material_facts": {"declared_unit": "m3", "total_co2e_kg_mf": 1.0}
    }));
    let stats = kg(&data(values));
    assert_eq!(stats.table().height(), 5);

    let request = StatisticsRequest::new().with_outliers(OutlierPolicy::disabled());
    let measured = stats.get_statistics(&request).unwrap();
    assert_eq!(measured.cell(0, TOTAL_COUNT_COLUMN), &CellValue::Int(4));

    let all = stats
        .get_statistics(&request.clone().with_include_estimated(true))
        .unwrap();
    assert_eq!(all.cell(0, TOTAL_COUNT_COLUMN), &CellValue::Int(5));
}

#[test]
fn unavailable_unit_is_rejected() {
    let err = ProductStatistics::new(&bricks(&[1.0]), UnitTarget::parse("ft2")).unwrap_err();
    match err {
        AecError::UnitUnavailable { unit, available } => {
            assert_eq!(unit, "ft2");
            assert_eq!(available, vec!["kg".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_field_and_grouping_are_errors() {
    let stats = kg(&bricks(&[1.0, 2.0, 3.0, 4.0]));
    let err = stats
        .get_statistics(&StatisticsRequest::new().with_fields(["material_facts.unknown"]))
        .unwrap_err();
    assert!(matches!(err, AecError::MissingColumn { .. }));

    let err = stats
        .get_statistics(&StatisticsRequest::new().with_group_by(["material_type"]))
        .unwrap_err();
    assert!(matches!(err, AecError::UnknownGroupingField { .. }));

    let err = stats
        .get_statistics(&StatisticsRequest::new().with_max_combinations(0))
        .unwrap_err();
    assert!(matches!(err, AecError::TooManyCombinations { .. }));
}

#[test]
fn available_fields_and_groupings_reflect_the_table() {
    let stats = kg(&bricks(&[1.0, 2.0]));
    assert_eq!(stats.available_fields(), vec![CO2.to_string()]);
    let groupings = stats.available_groupings();
    assert_eq!(groupings.len(), 1);
    assert!(groupings["product_type"].contains(&CellValue::from("Brick")));
}

#[test]
fn field_distribution_drops_outlier_rows() {
    let stats = kg(&bricks(&[1.0, 2.0, 3.0, 4.0, 100.0]));
    let table = stats
        .field_distribution(CO2, &RowFilters::new(), false, &OutlierPolicy::default())
        .unwrap();
    assert_eq!(table.height(), 4);
    assert!(table.iter_rows().all(|row| row.get(CO2).as_f64() != Some(100.0)));

    let unknown = stats
        .field_distribution("density", &RowFilters::new(), false, &OutlierPolicy::default())
        .unwrap();
    assert!(unknown.is_empty());
}

#[test]
fn distribution_by_group_splits_values() {
    let stats = kg(&data(vec![
        product("p1", json!("Brick"), 1.0),
        product("p2", json!("Tile"), 2.0),
        product("p3", json!("Brick"), 3.0),
    ]));
    let grouped = stats
        .field_distribution_by_group(
            CO2,
            "product_type",
            &RowFilters::new(),
            false,
            &OutlierPolicy::disabled(),
        )
        .unwrap();
    let bricks: Vec<f64> = grouped[&CellValue::from("Brick")]
        .iter()
        .filter_map(CellValue::as_f64)
        .collect();
    assert_eq!(bricks, vec![1.0, 3.0]);
    assert_eq!(grouped[&CellValue::from("Tile")].len(), 1);
}

/// Thirty-eight equal values, one far outlier and one that only stands out
/// once the first is gone.
fn masked_outlier() -> ProductData {
    let mut values = vec![10.0; 38];
    values.extend([1000.0, 50.0]);
    bricks(&values)
}

fn outlier_statistics(stats: &ProductStatistics, policy: OutlierPolicy) -> FlatTable {
    let request = StatisticsRequest::new()
        .with_fields([CO2])
        .with_metrics([Metric::Count, Metric::OutlierIds])
        .with_outliers(policy);
    stats.get_statistics(&request).unwrap()
}

#[test]
fn zscore_methods_differ_in_passes() {
    let stats = kg(&masked_outlier());
    let plain = OutlierPolicy::default().with_sqrt_transform(false);

    let single = outlier_statistics(&stats, plain.with_method(OutlierMethod::ZScore));
    assert_eq!(single.cell(0, &Metric::Count.column(CO2)), &CellValue::Int(39));
    assert_eq!(
        single.cell(0, &Metric::OutlierIds.column(CO2)),
        &CellValue::List(vec![json!("p38")])
    );

    let repeated = outlier_statistics(&stats, plain.with_method(OutlierMethod::RepeatedZScore));
    assert_eq!(repeated.cell(0, TOTAL_COUNT_COLUMN), &CellValue::Int(40));
    assert_eq!(repeated.cell(0, &Metric::Count.column(CO2)), &CellValue::Int(38));
    assert_eq!(
        repeated.cell(0, &Metric::OutlierIds.column(CO2)),
        &CellValue::List(vec![json!("p38"), json!("p39")])
    );
}

#[test]
fn repeated_zscore_with_high_threshold_keeps_everything() {
    let mut values = vec![0.0; 50];
    values.push(100.0);
    let stats = kg(&bricks(&values));
    let policy = OutlierPolicy::default()
        .with_sqrt_transform(false)
        .with_method(OutlierMethod::RepeatedZScore)
        .with_thresholds(OutlierThresholds {
            z_score: 10.0,
            repeated_z_max: 6.0,
            ..OutlierThresholds::default()
        });
    let table = outlier_statistics(&stats, policy);
    assert_eq!(table.cell(0, &Metric::Count.column(CO2)), &CellValue::Int(51));
}

#[test]
fn negative_majority_is_flipped_for_outlier_detection() {
    let stats = kg(&bricks(&[-1.0, -2.0, -3.0, -4.0, -100.0, 0.5]));
    let request = StatisticsRequest::new()
        .with_fields([CO2])
        .with_metrics([Metric::Count, Metric::Mean, Metric::OutlierIds]);
    let table = stats.get_statistics(&request).unwrap();

    assert_eq!(table.cell(0, TOTAL_COUNT_COLUMN), &CellValue::Int(6));
    assert_eq!(table.cell(0, &Metric::Count.column(CO2)), &CellValue::Int(4));
    assert_relative_eq!(
        table.cell(0, &Metric::Mean.column(CO2)).as_f64().unwrap(),
        -2.5
    );
    // The stray positive value is dropped without being reported.
    assert_eq!(
        table.cell(0, &Metric::OutlierIds.column(CO2)),
        &CellValue::List(vec![json!("p4")])
    );
}

#[test]
fn sparse_field_shows_null_metrics_and_zero_count() {
    let values = ["Brick", "Tile"]
        .iter()
        .flat_map(|product_type| {
            (0..4).map(move |i| {
                let mut value = product(&format!("{product_type}{i}"), json!(product_type), 1.0);
                if *product_type == "Brick" || i < 2 {
                    value["material_facts"]["water_use_kg"] = json!(f64::from(i) + 2.0);
                }
                value
            })
        })
        .collect();
    let stats = kg(&data(values));
    let request = StatisticsRequest::new()
        .with_fields([CO2, WATER])
        .with_metrics([Metric::Count, Metric::Mean])
        .with_outliers(OutlierPolicy::disabled());
    let table = stats.get_statistics(&request).unwrap();

    assert_eq!(table.height(), 2);
    assert_eq!(table.cell(1, "product_type"), &CellValue::from("Tile"));
    assert_eq!(table.cell(1, &Metric::Count.column(CO2)), &CellValue::Int(4));
    assert_eq!(table.cell(1, &Metric::Count.column(WATER)), &CellValue::Int(0));
    assert!(table.cell(1, &Metric::Mean.column(WATER)).is_null());
    assert_relative_eq!(
        table.cell(0, &Metric::Mean.column(WATER)).as_f64().unwrap(),
        3.5
    );
}

#[test]
fn missing_estimate_column_is_an_error() {
    let products = bricks(&[1.0, 2.0]);
    let kept: Vec<&String> = products
        .table()
        .columns()
        .iter()
        .filter(|column| !column.ends_with("kg.estimated"))
        .collect();
    let table = products.table().select(&kept);
    let err = ProductStatistics::new(&ProductData::from_table(table), UnitTarget::parse("kg"))
        .unwrap_err();
    assert!(matches!(err, AecError::MissingColumn { column } if column.ends_with("kg.estimated")));
}

//! Query filters for product retrieval and helpers over the filter catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Filter categories that are available without a full licence.
pub const OPEN_FILTER_KEYS: &[&str] = &[
    "product_type",
    "material_types",
    "company",
    "manufacturing_country",
    "continent",
];

/// Value of one query filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::One(value.to_string())
    }
}

/// Ordered set of query filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilters {
    entries: Vec<(String, FilterValue)>,
}

impl ProductFilters {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a filter, replacing an existing value for the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// `key=value` components; multi-valued filters repeat the key.
    pub fn query_components(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|(key, value)| match value {
                FilterValue::One(v) => vec![format!("{key}={v}")],
                FilterValue::Many(values) => {
                    values.iter().map(|v| format!("{key}={v}")).collect()
                }
            })
            .collect()
    }
}

/// Query string for one page: `page=<n>` followed by the filter components.
pub fn build_filter_query(page: usize, filters: &ProductFilters) -> String {
    let mut components = vec![format!("page={page}")];
    components.extend(filters.query_components());
    components.join("&")
}

/// Per filter category, the mapping from option label to the identifier the
/// API expects.
///
/// Options are labelled by `name`, then `performance`, then `option` (paired
/// with `key`). Categories without `filter_options` are skipped.
pub fn filter_mappings(filters: &Value) -> BTreeMap<String, BTreeMap<String, Value>> {
    let Some(categories) = filters.as_object() else {
        return BTreeMap::new();
    };
    categories
        .iter()
        .filter_map(|(category, spec)| {
            let options = spec.get("filter_options")?.as_array()?;
            let mapping = options
                .iter()
                .filter_map(option_mapping)
                .collect::<BTreeMap<_, _>>();
            Some((category.clone(), mapping))
        })
        .collect()
}

fn option_mapping(item: &Value) -> Option<(String, Value)> {
    let item = item.as_object()?;
    let id = || item.get("id").cloned().unwrap_or(Value::Null);
    if let Some(name) = item.get("name") {
        return Some((label(name), id()));
    }
    if let Some(performance) = item.get("performance") {
        return Some((label(performance), id()));
    }
    if let Some(key) = item.get("key") {
        let option = item.get("option").map(label).unwrap_or_default();
        return Some((option, key.clone()));
    }
    None
}

fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Restrict the filter catalog to the categories in [`OPEN_FILTER_KEYS`].
pub fn open_filters(filters: &Value) -> Map<String, Value> {
    filters
        .as_object()
        .map(|categories| {
            categories
                .iter()
                .filter(|(key, _)| OPEN_FILTER_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_repeats_multi_valued_keys() {
        let filters = ProductFilters::new()
            .with("product_type", 12)
            .with("company", vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            build_filter_query(2, &filters),
            "page=2&product_type=12&company=a&company=b"
        );
        assert_eq!(build_filter_query(1, &ProductFilters::new()), "page=1");
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut filters = ProductFilters::new().with("continent", "Europe");
        filters.insert("continent", "Asia");
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.query_components(), vec!["continent=Asia"]);
    }

    #[test]
    fn test_filter_mappings_label_rules() {
        let catalog = json!({
            "product_type": {"filter_options": [{"name": "Brick", "id": 4}]},
            "fire": {"filter_options": [{"performance": "A1", "id": 9}]},
            "epd": {"filter_options": [{"option": "Yes", "key": "true"}]},
            "search": {"type": "text"}
        });
        let mappings = filter_mappings(&catalog);
        assert_eq!(mappings.len(), 3);
        assert_eq!(mappings["product_type"]["Brick"], json!(4));
        assert_eq!(mappings["fire"]["A1"], json!(9));
        assert_eq!(mappings["epd"]["Yes"], json!("true"));
    }

    #[test]
    fn test_open_filters_keeps_public_categories() {
        let catalog = json!({"company": [], "price": [], "continent": []});
        let open = open_filters(&catalog);
        let keys: Vec<&String> = open.keys().collect();
        assert_eq!(keys, vec!["company", "continent"]);
    }
}

//! Descriptive statistics of one numeric field.

use aec_model::{CellValue, Metric, OutlierPolicy};
use serde::Serialize;
use serde_json::Value;

use crate::outliers::remove_outliers;

/// A numeric value tagged with the row it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub id: CellValue,
    pub value: f64,
}

impl Observation {
    pub fn new(id: impl Into<CellValue>, value: f64) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// Statistics of one field within one group.
///
/// Metrics that were not requested, or could not be computed, are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldStatistics {
    pub count: Option<usize>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub standard_deviation: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// `[Q1, median, Q3, maximum]`
    pub quartiles: Option<[f64; 4]>,
    pub coefficient_of_variation: Option<f64>,
    pub range: Option<f64>,
    /// Rows dropped as outliers.
    pub outlier_ids: Vec<CellValue>,
}

impl FieldStatistics {
    /// No metric available, only the outliers found so far.
    pub fn empty(outlier_ids: Vec<CellValue>) -> Self {
        Self {
            outlier_ids,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count.is_none()
    }

    /// Cell for one metric column.
    pub fn metric_cell(&self, metric: Metric) -> CellValue {
        match metric {
            Metric::Count => self
                .count
                .map_or(CellValue::Null, |count| CellValue::Int(count as i64)),
            Metric::Mean => self.mean.into(),
            Metric::Median => self.median.into(),
            Metric::StandardDeviation => self.standard_deviation.into(),
            Metric::Minimum => self.minimum.into(),
            Metric::Maximum => self.maximum.into(),
            Metric::Quartiles => match self.quartiles {
                Some(quartiles) => CellValue::List(
                    quartiles
                        .iter()
                        .map(|q| CellValue::float(*q).to_json())
                        .collect(),
                ),
                None => CellValue::Null,
            },
            Metric::CoefficientOfVariation => self.coefficient_of_variation.into(),
            Metric::Range => self.range.into(),
            Metric::OutlierIds => {
                CellValue::List(self.outlier_ids.iter().map(CellValue::to_json).collect::<Vec<Value>>())
            }
        }
    }
}

/// Compute the requested metrics over `values`.
///
/// Returns an empty result when fewer than `min_count` values are present
/// before or after outlier removal.
pub fn compute_field(
    values: &[Observation],
    metrics: &[Metric],
    policy: &OutlierPolicy,
    min_count: usize,
) -> FieldStatistics {
    if values.len() < min_count {
        return FieldStatistics::empty(Vec::new());
    }

    let (kept, outlier_ids) = if policy.remove_outliers {
        let outcome = remove_outliers(values.to_vec(), policy);
        (outcome.kept, outcome.outlier_ids)
    } else {
        (values.to_vec(), Vec::new())
    };
    if kept.len() < min_count {
        return FieldStatistics::empty(outlier_ids);
    }

    let mut sorted: Vec<f64> = kept.iter().map(|o| o.value).collect();
    sorted.sort_by(f64::total_cmp);
    let wants = |metric: Metric| metrics.contains(&metric);

    let mean = mean(&sorted);
    let median = quantile(&sorted, 0.5);
    let std = sample_std(&sorted);
    let minimum = sorted.first().copied().unwrap_or(f64::NAN);
    let maximum = sorted.last().copied().unwrap_or(f64::NAN);

    let quartiles = wants(Metric::Quartiles)
        .then(|| {
            let q1 = quantile(&sorted, 0.25);
            (!q1.is_nan()).then(|| [q1, median, quantile(&sorted, 0.75), maximum])
        })
        .flatten();
    let coefficient_of_variation = (mean != 0.0)
        .then(|| finite(std / mean))
        .flatten();

    FieldStatistics {
        count: Some(kept.len()),
        mean: wants(Metric::Mean).then(|| finite(mean)).flatten(),
        median: wants(Metric::Median).then(|| finite(median)).flatten(),
        standard_deviation: wants(Metric::StandardDeviation)
            .then(|| finite(std))
            .flatten(),
        minimum: wants(Metric::Minimum).then(|| finite(minimum)).flatten(),
        maximum: wants(Metric::Maximum).then(|| finite(maximum)).flatten(),
        quartiles,
        coefficient_of_variation: wants(Metric::CoefficientOfVariation)
            .then_some(coefficient_of_variation)
            .flatten(),
        range: wants(Metric::Range)
            .then(|| finite(maximum - minimum))
            .flatten(),
        outlier_ids,
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Arithmetic mean; NaN for no values.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); NaN for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Quantile of sorted values with linear interpolation between the closest
/// ranks; NaN for no values.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

//! Configuration options for unit conversion and statistics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::DECLARED_UNIT;
use crate::error::AecError;

/// Unit that LCA values should be expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitTarget {
    /// Keep each product's own declared unit.
    #[default]
    DeclaredUnit,
    /// Rescale every product to this unit through its scaling factors.
    Unit(String),
}

impl UnitTarget {
    pub fn parse(value: &str) -> Self {
        if value == DECLARED_UNIT {
            Self::DeclaredUnit
        } else {
            Self::Unit(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::DeclaredUnit => DECLARED_UNIT,
            Self::Unit(unit) => unit,
        }
    }
}

impl fmt::Display for UnitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for UnitTarget {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Outlier detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutlierMethod {
    /// Drop values outside `[Q1 - k·IQR, Q3 + k·IQR]`.
    #[default]
    #[serde(rename = "IQR")]
    Iqr,
    /// Drop values whose absolute z-score exceeds the threshold, once.
    #[serde(rename = "zscore")]
    ZScore,
    /// Repeat z-score passes until the largest observed |z| is small enough.
    #[serde(rename = "repeated_zscore")]
    RepeatedZScore,
}

impl OutlierMethod {
    pub const ALL: [OutlierMethod; 3] = [Self::Iqr, Self::ZScore, Self::RepeatedZScore];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Iqr => "IQR",
            Self::ZScore => "zscore",
            Self::RepeatedZScore => "repeated_zscore",
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutlierMethod {
    type Err = AecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "IQR" | "iqr" => Ok(Self::Iqr),
            "zscore" => Ok(Self::ZScore),
            "repeated_zscore" => Ok(Self::RepeatedZScore),
            other => Err(AecError::UnknownOutlierMethod(other.to_string())),
        }
    }
}

/// Descriptive statistic reported per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Count,
    Mean,
    Median,
    StandardDeviation,
    Minimum,
    Maximum,
    Quartiles,
    CoefficientOfVariation,
    Range,
    OutlierIds,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Self::Count,
        Self::Mean,
        Self::Median,
        Self::StandardDeviation,
        Self::Minimum,
        Self::Maximum,
        Self::Quartiles,
        Self::CoefficientOfVariation,
        Self::Range,
        Self::OutlierIds,
    ];

    pub const DEFAULT: [Metric; 3] = [Self::Count, Self::Mean, Self::Median];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::StandardDeviation => "standard_deviation",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Quartiles => "quartiles",
            Self::CoefficientOfVariation => "coefficient_of_variation",
            Self::Range => "range",
            Self::OutlierIds => "outlier_ids",
        }
    }

    /// Statistics-table column for this metric of `field`.
    pub fn column(self, field: &str) -> String {
        format!("{field}.{}", self.as_str())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = AecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s.trim())
            .ok_or_else(|| AecError::UnknownMetric(s.to_string()))
    }
}

/// Cut-offs used by the outlier detectors.
///
/// The z-score threshold corresponds to a two-sided 95% interval and is
/// applied regardless of sample size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierThresholds {
    pub z_score: f64,
    /// Repeated z-score passes continue while the previous pass saw a larger |z|.
    pub repeated_z_max: f64,
    pub iqr_multiplier: f64,
}

impl Default for OutlierThresholds {
    fn default() -> Self {
        Self {
            z_score: 1.96,
            repeated_z_max: 6.0,
            iqr_multiplier: 1.5,
        }
    }
}

/// How outliers are removed before statistics are computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierPolicy {
    pub remove_outliers: bool,
    pub method: OutlierMethod,
    /// Detect outliers on square-rooted magnitudes.
    pub sqrt_transform: bool,
    pub thresholds: OutlierThresholds,
}

impl Default for OutlierPolicy {
    fn default() -> Self {
        Self {
            remove_outliers: true,
            method: OutlierMethod::default(),
            sqrt_transform: true,
            thresholds: OutlierThresholds::default(),
        }
    }
}

impl OutlierPolicy {
    /// Keep every value.
    pub fn disabled() -> Self {
        Self {
            remove_outliers: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: OutlierMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_sqrt_transform(mut self, enable: bool) -> Self {
        self.sqrt_transform = enable;
        self
    }

    #[must_use]
    pub fn with_remove_outliers(mut self, enable: bool) -> Self {
        self.remove_outliers = enable;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: OutlierThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// Parameters of a grouped statistics request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRequest {
    /// Grouping columns; `None` groups by product type.
    pub group_by: Option<Vec<String>>,
    /// Numeric columns to summarize; `None` uses every available field.
    pub fields: Option<Vec<String>>,
    pub metrics: Vec<Metric>,
    pub include_estimated_values: bool,
    pub outliers: OutlierPolicy,
    /// Minimum population of a group and of a field within it.
    pub min_count: usize,
    /// Upper bound on the number of grouping combinations enumerated.
    pub max_combinations: usize,
}

impl Default for StatisticsRequest {
    fn default() -> Self {
        Self {
            group_by: None,
            fields: None,
            metrics: Metric::DEFAULT.to_vec(),
            include_estimated_values: false,
            outliers: OutlierPolicy::default(),
            min_count: 4,
            max_combinations: 100_000,
        }
    }
}

impl StatisticsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_group_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = Metric>) -> Self {
        self.metrics = metrics.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_include_estimated(mut self, enable: bool) -> Self {
        self.include_estimated_values = enable;
        self
    }

    #[must_use]
    pub fn with_outliers(mut self, policy: OutlierPolicy) -> Self {
        self.outliers = policy;
        self
    }

    #[must_use]
    pub fn with_min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }

    #[must_use]
    pub fn with_max_combinations(mut self, limit: usize) -> Self {
        self.max_combinations = limit;
        self
    }
}

//! Descriptive statistics over product tables.
//!
//! [`ProductStatistics`] expresses product data in one unit and computes
//! per-group statistics for numeric fields, with optional outlier removal.

pub mod engine;
pub mod groups;
pub mod outliers;
pub mod statistics;

pub use engine::{FieldStatistics, Observation, compute_field};
pub use groups::{
    COMBINATION_WARN_THRESHOLD, GroupCombination, GroupingDomain, enumerate, grouping_domains,
};
pub use outliers::{OutlierDetector, OutlierOutcome, detector, remove_outliers};
pub use statistics::{AvailableFields, ProductStatistics, TOTAL_COUNT_COLUMN};

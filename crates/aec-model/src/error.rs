use thiserror::Error;

#[derive(Debug, Error)]
pub enum AecError {
    #[error("unsupported input type: expected a list of products or a table, found {found}")]
    UnsupportedInputType { found: String },

    #[error("missing identifier column: {column}")]
    MissingIdentifierColumn { column: String },

    #[error("column {column} is not available in the table")]
    MissingColumn { column: String },

    #[error("grouping field {field} is not a column of the table")]
    UnknownGroupingField { field: String },

    #[error("unit \"{unit}\" not available. Available units: {}", .available.join(", "))]
    UnitUnavailable { unit: String, available: Vec<String> },

    #[error("unknown outlier method: {0} (expected IQR, zscore or repeated_zscore)")]
    UnknownOutlierMethod(String),

    #[error("unknown statistical metric: {0}")]
    UnknownMetric(String),

    #[error("grouping produces {combinations} combinations, above the limit of {limit}")]
    TooManyCombinations { combinations: u128, limit: usize },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AecError>;

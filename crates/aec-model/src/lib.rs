pub mod catalog;
pub mod error;
pub mod options;
pub mod record;
pub mod table;
pub mod value;

pub use error::{AecError, Result};
pub use options::{
    Metric, OutlierMethod, OutlierPolicy, OutlierThresholds, StatisticsRequest, UnitTarget,
};
pub use record::{FlatRecord, ProductRecord, Unflattened};
pub use table::{FlatTable, RowView};
pub use value::CellValue;

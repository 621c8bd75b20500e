//! Product table transformations.
//!
//! - **normalize**: nested records to the flat product table and back
//! - **units**: rescaling LCA columns between declared and target units
//! - **filter**: row filters with list-valued column semantics
//! - **product_data**: records and table held together, per-product scaling
//! - **frame**: conversion to and from polars `DataFrame`s

pub mod filter;
pub mod frame;
pub mod normalize;
pub mod product_data;
pub mod units;

pub use filter::{Filter, RowFilters, filter_table};
pub use frame::{from_dataframe, to_dataframe};
pub use normalize::{denormalize, normalize, prepare_records};
pub use product_data::{ProductData, ProductScale};
pub use units::{Conversion, available_units, convert};

//! Output generation for product tables.
//!
//! - **csv_writer**: flat tables as CSV
//! - **json**: product records as a JSON array
//! - **epdx**: EPDx interchange records

mod common;
pub mod csv_writer;
pub mod epdx;
mod error;
pub mod json;

pub use common::ensure_parent_dir;
pub use csv_writer::{CsvWriteOptions, write_csv, write_csv_file};
pub use epdx::{EpdxOptions, EpdxRecord, ImpactCategory, UnitConversion, export, write_epdx_file};
pub use error::{OutputError, Result};
pub use json::{to_json_string, write_json_file};

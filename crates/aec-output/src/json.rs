//! JSON output of product records.

use std::io::Write;
use std::path::Path;

use aec_model::ProductRecord;
use tracing::debug;

use crate::common::create_file;
use crate::error::{OutputError, Result};

/// Serialize records as a pretty-printed JSON array.
pub fn to_json_string(records: &[ProductRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Write records as a pretty-printed JSON array to `path`.
pub fn write_json_file(path: &Path, records: &[ProductRecord]) -> Result<()> {
    let mut file = create_file(path)?;
    serde_json::to_writer_pretty(&mut file, records)?;
    file.flush().map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), records = records.len(), "wrote JSON");
    Ok(())
}

//! CSV output of flat tables.

use std::io::Write;
use std::path::Path;

use aec_model::FlatTable;
use tracing::debug;

use crate::common::create_file;
use crate::error::Result;

/// Options for CSV output.
#[derive(Debug, Clone)]
pub struct CsvWriteOptions {
    pub delimiter: u8,
    pub include_header: bool,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            include_header: true,
        }
    }
}

impl CsvWriteOptions {
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_header(mut self, include_header: bool) -> Self {
        self.include_header = include_header;
        self
    }
}

/// Write `table` as CSV.
///
/// The header follows the table's column order. Nulls are empty fields and
/// list cells are written as JSON text.
pub fn write_csv<W: Write>(
    table: &FlatTable,
    writer: W,
    options: Option<&CsvWriteOptions>,
) -> Result<()> {
    let options = options.cloned().unwrap_or_default();
    let mut out = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    if options.include_header {
        out.write_record(table.columns())?;
    }
    for row in table.rows() {
        out.write_record(row.iter().map(ToString::to_string))?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write `table` as CSV to `path`, creating parent directories.
pub fn write_csv_file(
    path: &Path,
    table: &FlatTable,
    options: Option<&CsvWriteOptions>,
) -> Result<()> {
    let file = create_file(path)?;
    write_csv(table, file, options)?;
    debug!(path = %path.display(), rows = table.height(), "wrote CSV");
    Ok(())
}

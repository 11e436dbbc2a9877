pub mod csv;
pub mod excel_read;
pub mod excel_write;

use std::path::Path;

use tracing::{debug, instrument};

use crate::wosp::check::error::{CheckError, Result};
use crate::wosp::check::model::RawRow;

/// On-disk representation of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Excel,
}

/// Picks the reader from the file extension. Anything that is not an Excel
/// workbook is read as CSV.
pub fn detect_format(path: &Path) -> InputFormat {
    let extension = path.extension().map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref().and_then(|ext| ext.to_str()) {
        Some("xlsx" | "xlsm") => InputFormat::Excel,
        _ => InputFormat::Csv,
    }
}

/// Reads all rows of an input file.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    if !path.exists() {
        return Err(CheckError::MissingInput(path.to_path_buf()));
    }
    let format = detect_format(path);
    let rows = match format {
        InputFormat::Csv => csv::read_rows(path)?,
        InputFormat::Excel => excel_read::read_rows(path)?,
    };
    debug!(rows = rows.len(), ?format, "rows read");
    Ok(rows)
}

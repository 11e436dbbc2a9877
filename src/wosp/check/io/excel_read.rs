use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::wosp::check::error::{CheckError, Result};
use crate::wosp::check::model::RawRow;

/// Reads the first worksheet of a workbook as raw rows.
///
/// Line numbers are the 1-based worksheet row numbers, so diagnostics point
/// at the row a user sees in a spreadsheet application.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CheckError::EmptyWorkbook(path.to_path_buf()))?
        .map_err(CheckError::from)?;
    Ok(range_to_rows(&range))
}

fn range_to_rows(range: &Range<DataType>) -> Vec<RawRow> {
    let (first_row, first_col) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    range
        .rows()
        .enumerate()
        .map(|(index, cells)| {
            let mut fields: Vec<Option<String>> = vec![None; first_col];
            fields.extend(cells.iter().map(cell_to_string));
            RawRow {
                line: first_row + index + 1,
                fields,
            }
        })
        .collect()
}

fn cell_to_string(cell: &DataType) -> Option<String> {
    let value = match cell {
        DataType::String(value) => value.clone(),
        DataType::Float(value) => value.to_string(),
        DataType::Int(value) => value.to_string(),
        DataType::Bool(value) => value.to_string(),
        DataType::Empty => return None,
        other => other.to_string(),
    };
    if value.is_empty() { None } else { Some(value) }
}

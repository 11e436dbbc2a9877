use std::path::Path;

use rust_xlsxwriter::{Format, Table, Workbook};

use crate::wosp::check::error::Result;
use crate::wosp::check::model::RawRow;
use crate::wosp::check::report::{SheetTable, WorkbookData};

/// Widest column the report will size to.
const MAX_COLUMN_WIDTH: usize = 60;
const COLUMN_PADDING: usize = 2;

/// Writes each report table to its own worksheet with a bold, frozen header
/// row and columns sized to their content.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let header_format = Format::new().set_bold();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;
        worksheet.set_freeze_panes(1, 0)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col_idx as u16, header, &header_format)?;
        }
        for (col_idx, width) in column_widths(table).into_iter().enumerate() {
            worksheet.set_column_width(col_idx as u16, width)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
            }
        }

        // A table needs at least one data row.
        if table.rows.is_empty() || table.columns.is_empty() {
            continue;
        }
        let mut excel_table = Table::new();
        excel_table.set_autofilter(true);
        let col_end = (table.columns.len() as u16).saturating_sub(1);
        worksheet.add_table(0, 0, table.rows.len() as u32, col_end, &excel_table)?;
    }

    workbook_writer.save(path)?;
    Ok(())
}

/// Character width of each column: the longest header or cell, capped at
/// [`MAX_COLUMN_WIDTH`], plus padding.
pub(crate) fn column_widths(table: &SheetTable) -> Vec<f64> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(col_idx, header)| {
            let widest = table
                .rows
                .iter()
                .filter_map(|row| row.get(col_idx))
                .map(|cell| cell.chars().count())
                .fold(header.chars().count(), usize::max);
            (widest.min(MAX_COLUMN_WIDTH) + COLUMN_PADDING) as f64
        })
        .collect()
}

/// Writes raw rows to a single worksheet without a header row, in the same
/// layout the Excel reader expects.
pub fn write_rows(path: &Path, sheet_name: &str, rows: &[RawRow]) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let worksheet = workbook_writer.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.fields.iter().enumerate() {
            if let Some(value) = cell {
                worksheet.write_string(row_idx as u32, col_idx as u16, value)?;
            }
        }
    }

    workbook_writer.save(path)?;
    Ok(())
}

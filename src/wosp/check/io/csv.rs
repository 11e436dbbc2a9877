use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use ::csv::{QuoteStyle, ReaderBuilder, WriterBuilder};

use crate::wosp::check::error::Result;
use crate::wosp::check::model::RawRow;

/// Reads a header-less, `"`-quoted CSV file. Values are not trimmed.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    read_from(File::open(path)?)
}

pub fn read_from<R: Read>(source: R) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quote(b'"')
        .from_reader(source);

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(index + 1);
        rows.push(RawRow::from_strings(line, record.iter()));
    }
    Ok(rows)
}

/// Writes rows with every field quoted. Blank fields are written as `""`.
pub fn write_rows(path: &Path, rows: &[RawRow]) -> Result<()> {
    write_to(File::create(path)?, rows)
}

pub fn write_to<W: Write>(sink: W, rows: &[RawRow]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .quote_style(QuoteStyle::Always)
        .from_writer(sink);
    for row in rows {
        writer.write_record(row.fields.iter().map(|field| field.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_fields_keep_commas_and_white_space() {
        let source = "\"1\",\"Flinders, University\",\"1\"\n\" 2\",\"\",\"1 \"\n3,Short\n";
        let rows = read_from(source.as_bytes()).expect("parsed");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].field(1), Some("Flinders, University"));
        assert_eq!(rows[1].field(0), Some(" 2"));
        assert_eq!(rows[1].field(1), None);
        assert_eq!(rows[1].field(2), Some("1 "));
        assert_eq!(rows[2].field(2), None);
        assert_eq!(rows.iter().map(|row| row.line).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn written_rows_read_back_unchanged() {
        let rows = vec![
            RawRow::from_strings(1, ["1", "Root \"HQ\"", "1"]),
            RawRow::from_strings(2, ["2 ", "", " 1"]),
        ];
        let mut buffer = Vec::new();
        write_to(&mut buffer, &rows).expect("written");
        let restored = read_from(buffer.as_slice()).expect("parsed");

        assert_eq!(restored, rows);
    }
}

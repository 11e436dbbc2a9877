//! Keyed storage of raw rows with per-row diagnostics.

use std::collections::BTreeMap;

use tracing::debug;

use crate::wosp::check::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use crate::wosp::check::model::{DataSet, RawRow, Record, RecordId};

/// How a non-id column is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Points at another id. Must be present and free of surrounding white
    /// space.
    Reference,
    /// Must be present.
    Mandatory,
    /// Not checked.
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub index: usize,
    pub rule: FieldRule,
}

impl ColumnSpec {
    pub fn new(name: &'static str, index: usize, rule: FieldRule) -> Self {
        Self { name, index, rule }
    }
}

/// Column layout of a keyed input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub dataset: DataSet,
    pub id_column: usize,
    pub columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn new(dataset: DataSet, id_column: usize) -> Self {
        Self {
            dataset,
            id_column,
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// Records keyed by id. The first row carrying an id wins; later rows with
/// the same id are reported and dropped.
#[derive(Debug, Clone)]
pub struct RecordTable {
    schema: Schema,
    records: BTreeMap<RecordId, Record>,
    rows_read: usize,
    duplicates: usize,
}

impl RecordTable {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            records: BTreeMap::new(),
            rows_read: 0,
            duplicates: 0,
        }
    }

    /// Loads every row, reporting problems to `sink`. Never fails.
    pub fn load<I, S>(schema: Schema, rows: I, sink: &mut S) -> Self
    where
        I: IntoIterator<Item = RawRow>,
        S: DiagnosticSink + ?Sized,
    {
        Self::load_with(schema, rows, sink, |_, _| {})
    }

    /// Like [`load`](Self::load), but hands every raw row to `inspect` before
    /// it is checked, including rows that are later dropped.
    pub fn load_with<I, S, F>(schema: Schema, rows: I, sink: &mut S, mut inspect: F) -> Self
    where
        I: IntoIterator<Item = RawRow>,
        S: DiagnosticSink + ?Sized,
        F: FnMut(&RawRow, &mut S),
    {
        let mut table = Self::new(schema);
        for row in rows {
            inspect(&row, sink);
            table.insert_row(row, sink);
        }
        debug!(
            dataset = %table.schema.dataset,
            rows = table.rows_read,
            records = table.records.len(),
            duplicates = table.duplicates,
            "record table loaded"
        );
        table
    }

    /// Checks a single row and stores it unless it lacks an id or repeats
    /// one already stored. Rows without an id are still checked column by
    /// column.
    pub fn insert_row<S>(&mut self, row: RawRow, sink: &mut S)
    where
        S: DiagnosticSink + ?Sized,
    {
        self.rows_read += 1;
        let dataset = self.schema.dataset;
        let line = row.line;
        let id = row.field(self.schema.id_column).map(str::to_string);
        let shown = id.as_deref().unwrap_or_default();
        let locate = |diagnostic: Diagnostic| match id.as_deref() {
            Some(id) => diagnostic.at_line(line).for_id(id),
            None => diagnostic.at_line(line),
        };

        if id.is_none() {
            sink.emit(locate(Diagnostic::error(
                DiagnosticCode::MissingId,
                dataset,
                format!("Line {line} has nil ID. Must be a valid ID."),
            )));
        }

        for column in &self.schema.columns {
            match (column.rule, row.field(column.index)) {
                (FieldRule::Reference, None) => sink.emit(locate(Diagnostic::error(
                    DiagnosticCode::MissingReference,
                    dataset,
                    format!(
                        "ID {shown} has nil {} on line {line}. Must be a valid ID",
                        column.name
                    ),
                ))),
                (FieldRule::Mandatory, None) => sink.emit(locate(Diagnostic::error(
                    DiagnosticCode::MissingField,
                    dataset,
                    format!(
                        "ID {shown} has nil {} on line {line}. Must not be empty (mandatory field)",
                        column.name
                    ),
                ))),
                _ => {}
            }
        }

        let duplicate = id.as_ref().is_some_and(|id| self.records.contains_key(id));
        if duplicate {
            self.duplicates += 1;
            sink.emit(locate(Diagnostic::error(
                DiagnosticCode::DuplicateId,
                dataset,
                format!("ID {shown} is duplicated on line {line} (later entry ignored)"),
            )));
        }

        if has_surrounding_whitespace(shown) {
            sink.emit(locate(Diagnostic::warning(
                DiagnosticCode::Whitespace,
                dataset,
                format!("ID '{shown}' -- This ID contains leading or trailing white space"),
            )));
        }
        for column in &self.schema.columns {
            if column.rule != FieldRule::Reference {
                continue;
            }
            if let Some(value) = row.field(column.index) {
                if has_surrounding_whitespace(value) {
                    sink.emit(locate(Diagnostic::warning(
                        DiagnosticCode::Whitespace,
                        dataset,
                        format!(
                            "ID {shown} -- {} '{value}' contains leading or trailing white space",
                            column.name
                        ),
                    )));
                }
            }
        }

        if let Some(id) = id.filter(|_| !duplicate) {
            self.records.insert(id.clone(), Record { id, row });
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Value of the named schema column for `id`.
    pub fn value(&self, id: &str, column: &str) -> Option<&str> {
        let index = self.schema.column(column)?.index;
        self.records.get(id)?.field(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Stored rows in their original file order, ready to be written back
    /// with the same layout.
    pub fn to_rows(&self) -> Vec<RawRow> {
        let mut rows: Vec<RawRow> = self.records.values().map(|record| record.row.clone()).collect();
        rows.sort_by_key(|row| row.line);
        rows
    }
}

pub(crate) fn has_surrounding_whitespace(value: &str) -> bool {
    value.trim() != value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wosp::check::diagnostics::{Diagnostic, Severity};

    fn org_schema() -> Schema {
        Schema::new(DataSet::Organizations, 0)
            .with_column(ColumnSpec::new("description", 1, FieldRule::Optional))
            .with_column(ColumnSpec::new("parent ID", 2, FieldRule::Reference))
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn first_occurrence_wins_and_later_duplicates_are_flagged() {
        let rows = vec![
            RawRow::from_strings(1, ["1", "Root", "1"]),
            RawRow::from_strings(2, ["2", "First", "1"]),
            RawRow::from_strings(3, ["2", "Second", "1"]),
            RawRow::from_strings(4, ["2", "Third", "1"]),
        ];
        let mut sink = Vec::new();
        let table = RecordTable::load(org_schema(), rows, &mut sink);

        assert_eq!(table.len(), 2);
        assert_eq!(table.duplicates(), 2);
        assert_eq!(table.rows_read(), 4);
        assert_eq!(table.value("2", "description"), Some("First"));
        assert_eq!(
            codes(&sink),
            vec![DiagnosticCode::DuplicateId, DiagnosticCode::DuplicateId]
        );
        assert_eq!(sink[0].line, Some(3));
        assert_eq!(sink[1].line, Some(4));
    }

    #[test]
    fn missing_id_is_an_error_and_the_row_is_not_stored() {
        let rows = vec![RawRow::from_strings(7, ["", "Orphan", "1"])];
        let mut sink = Vec::new();
        let table = RecordTable::load(org_schema(), rows, &mut sink);

        assert!(table.is_empty());
        assert_eq!(table.rows_read(), 1);
        assert_eq!(codes(&sink), vec![DiagnosticCode::MissingId]);
        assert_eq!(sink[0].severity, Severity::Error);
        assert_eq!(sink[0].line, Some(7));
        assert_eq!(sink[0].id, None);
    }

    #[test]
    fn rows_without_id_still_have_their_columns_checked() {
        let rows = vec![
            RawRow::from_strings(3, ["", "No parent either"]),
            RawRow::from_strings(4, ["", "Padded parent", " 1"]),
        ];
        let mut sink = Vec::new();
        let table = RecordTable::load(org_schema(), rows, &mut sink);

        assert!(table.is_empty());
        assert_eq!(
            codes(&sink),
            vec![
                DiagnosticCode::MissingId,
                DiagnosticCode::MissingReference,
                DiagnosticCode::MissingId,
                DiagnosticCode::Whitespace,
            ]
        );
        assert_eq!(sink[1].line, Some(3));
        assert_eq!(sink[3].line, Some(4));
    }

    #[test]
    fn inspector_sees_rows_that_are_later_dropped() {
        let rows = vec![
            RawRow::from_strings(1, ["1", "Root", "1"]),
            RawRow::from_strings(2, ["1", "Root again", "1"]),
            RawRow::from_strings(3, ["", "Nameless", "1"]),
        ];
        let mut seen = Vec::new();
        let mut sink = Vec::new();
        let table = RecordTable::load_with(org_schema(), rows, &mut sink, |row, _| {
            seen.push(row.line)
        });

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_reference_is_an_error_but_the_record_is_kept() {
        let rows = vec![RawRow::from_strings(2, ["5", "Lost"])];
        let mut sink = Vec::new();
        let table = RecordTable::load(org_schema(), rows, &mut sink);

        assert!(table.contains("5"));
        assert_eq!(table.value("5", "parent ID"), None);
        assert_eq!(codes(&sink), vec![DiagnosticCode::MissingReference]);
        assert_eq!(sink[0].id.as_deref(), Some("5"));
    }

    #[test]
    fn whitespace_is_a_warning_and_values_are_not_trimmed() {
        let rows = vec![RawRow::from_strings(1, [" 9", "Padded", "1 "])];
        let mut sink = Vec::new();
        let table = RecordTable::load(org_schema(), rows, &mut sink);

        assert!(table.contains(" 9"));
        assert!(!table.contains("9"));
        assert_eq!(table.value(" 9", "parent ID"), Some("1 "));
        assert_eq!(
            codes(&sink),
            vec![DiagnosticCode::Whitespace, DiagnosticCode::Whitespace]
        );
        assert!(sink.iter().all(|d| d.severity == Severity::Warning));
    }

    #[test]
    fn mandatory_field_is_checked_without_whitespace_warning() {
        let schema = Schema::new(DataSet::Persons, 0)
            .with_column(ColumnSpec::new("email", 4, FieldRule::Mandatory));
        let rows = vec![
            RawRow::from_strings(1, ["P1", "", "", "", " a@x.org "]),
            RawRow::from_strings(2, ["P2", "", "", "", ""]),
        ];
        let mut sink = Vec::new();
        let table = RecordTable::load(schema, rows, &mut sink);

        assert_eq!(table.len(), 2);
        assert_eq!(codes(&sink), vec![DiagnosticCode::MissingField]);
        assert_eq!(sink[0].line, Some(2));
    }

    #[test]
    fn rows_are_returned_in_file_order() {
        let rows = vec![
            RawRow::from_strings(1, ["b", "B", "a"]),
            RawRow::from_strings(2, ["a", "A", "a"]),
        ];
        let mut sink = Vec::new();
        let table = RecordTable::load(org_schema(), rows.clone(), &mut sink);

        assert_eq!(table.to_rows(), rows);
        assert_eq!(table.ids().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}

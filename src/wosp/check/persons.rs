use tracing::{info, instrument};

use crate::wosp::check::diagnostics::DiagnosticSink;
use crate::wosp::check::model::{DataSet, RawRow};
use crate::wosp::check::table::{ColumnSpec, FieldRule, RecordTable, Schema};

/// Name of the mandatory person column used in diagnostics.
pub const MANDATORY_FIELD: &str = "field";

/// Column positions of the person file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonColumns {
    pub id: usize,
    /// A column every person must fill in, e.g. the e-mail address.
    pub mandatory: usize,
}

impl Default for PersonColumns {
    fn default() -> Self {
        Self { id: 0, mandatory: 4 }
    }
}

impl PersonColumns {
    pub fn schema(&self) -> Schema {
        Schema::new(DataSet::Persons, self.id).with_column(ColumnSpec::new(
            MANDATORY_FIELD,
            self.mandatory,
            FieldRule::Mandatory,
        ))
    }
}

/// Person records keyed by id.
#[derive(Debug, Clone)]
pub struct PersonRegistry {
    table: RecordTable,
}

impl PersonRegistry {
    #[instrument(level = "info", skip_all)]
    pub fn load<I, S>(columns: PersonColumns, rows: I, sink: &mut S) -> Self
    where
        I: IntoIterator<Item = RawRow>,
        S: DiagnosticSink + ?Sized,
    {
        let table = RecordTable::load(columns.schema(), rows, sink);
        info!(persons = table.len(), duplicates = table.duplicates(), "person registry loaded");
        Self { table }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.table.contains(id)
    }

    /// Person ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.table.ids()
    }

    pub fn mandatory_field(&self, id: &str) -> Option<&str> {
        self.table.value(id, MANDATORY_FIELD)
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wosp::check::diagnostics::{DiagnosticCode, Severity};

    fn person(line: usize, id: &str, email: &str) -> RawRow {
        RawRow::from_strings(line, [id, "Given", "Family", "Staff", email])
    }

    #[test]
    fn blank_mandatory_field_is_reported_once_with_line_and_id() {
        let rows = vec![
            person(1, "P1", "p1@example.org"),
            person(2, "P2", "p2@example.org"),
            person(3, "P3", ""),
        ];
        let mut sink = Vec::new();
        let registry = PersonRegistry::load(PersonColumns::default(), rows, &mut sink);

        assert_eq!(registry.len(), 3);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].severity, Severity::Error);
        assert_eq!(sink[0].code, DiagnosticCode::MissingField);
        assert_eq!(sink[0].line, Some(3));
        assert_eq!(sink[0].id.as_deref(), Some("P3"));
    }

    #[test]
    fn ids_enumerate_in_sorted_order() {
        let rows = vec![
            person(1, "P3", "c@example.org"),
            person(2, "P1", "a@example.org"),
            person(3, "P2", "b@example.org"),
        ];
        let mut sink = Vec::new();
        let registry = PersonRegistry::load(PersonColumns::default(), rows, &mut sink);

        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["P1", "P2", "P3"]);
        assert_eq!(registry.mandatory_field("P2"), Some("b@example.org"));
        assert!(registry.contains("P1"));
        assert!(!registry.contains("P4"));
    }

    #[test]
    fn short_rows_miss_the_mandatory_field() {
        let rows = vec![RawRow::from_strings(1, ["P1", "Given"])];
        let mut sink = Vec::new();
        let registry = PersonRegistry::load(PersonColumns::default(), rows, &mut sink);

        assert!(registry.contains("P1"));
        assert_eq!(registry.mandatory_field("P1"), None);
        assert_eq!(sink[0].code, DiagnosticCode::MissingField);
    }
}

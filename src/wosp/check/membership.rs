//! Person to organization unit links (a many-to-many relation).

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info, instrument};

use crate::wosp::check::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use crate::wosp::check::hierarchy::OrganizationHierarchy;
use crate::wosp::check::model::{DataSet, MembershipPair, RawRow};
use crate::wosp::check::persons::PersonRegistry;
use crate::wosp::check::table::has_surrounding_whitespace;

/// Column positions of the membership file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipColumns {
    pub person_id: usize,
    pub org_id: usize,
}

impl Default for MembershipColumns {
    fn default() -> Self {
        Self {
            person_id: 0,
            org_id: 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MembershipIndex {
    pairs: Vec<MembershipPair>,
    seen: HashSet<String>,
    person_ids: BTreeSet<String>,
    org_ids: BTreeSet<String>,
    duplicates: usize,
}

impl MembershipIndex {
    /// Loads all pairs in row order, checking each against the organization
    /// and person data, then runs the coverage pass.
    #[instrument(level = "info", skip_all)]
    pub fn load<I, S>(
        columns: MembershipColumns,
        rows: I,
        orgs: &OrganizationHierarchy,
        persons: &PersonRegistry,
        sink: &mut S,
    ) -> Self
    where
        I: IntoIterator<Item = RawRow>,
        S: DiagnosticSink + ?Sized,
    {
        let mut index = Self::default();
        for row in rows {
            index.insert_row(&columns, row, orgs, persons, sink);
        }
        info!(
            pairs = index.pairs.len(),
            persons = index.person_ids.len(),
            orgs = index.org_ids.len(),
            duplicates = index.duplicates,
            "membership pairs loaded"
        );
        index.verify_all_people_in_org(persons, sink);
        index
    }

    fn insert_row<S>(
        &mut self,
        columns: &MembershipColumns,
        row: RawRow,
        orgs: &OrganizationHierarchy,
        persons: &PersonRegistry,
        sink: &mut S,
    ) where
        S: DiagnosticSink + ?Sized,
    {
        let line = row.line;
        let person_id = row.field(columns.person_id);
        let org_id = row.field(columns.org_id);
        let shown_person = person_id.unwrap_or_default();

        if person_id.is_none() {
            sink.emit(
                Diagnostic::error(
                    DiagnosticCode::MissingPersonId,
                    DataSet::Memberships,
                    format!("Line {line} -- Person-ID is nil. Must be a valid ID."),
                )
                .at_line(line),
            );
        }
        if org_id.is_none() {
            sink.emit(
                Diagnostic::error(
                    DiagnosticCode::MissingOrgId,
                    DataSet::Memberships,
                    format!(
                        "Line {line} -- Person-ID {shown_person} has nil org-ID. Must be a valid ID."
                    ),
                )
                .at_line(line)
                .for_id(shown_person),
            );
        }

        if let Some(person) = person_id.filter(|value| has_surrounding_whitespace(value)) {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::Whitespace,
                    DataSet::Memberships,
                    format!(
                        "Line {line} -- Person-ID '{person}' -- This ID contains leading or trailing white space"
                    ),
                )
                .at_line(line)
                .for_id(person),
            );
        }
        if let Some(org) = org_id.filter(|value| has_surrounding_whitespace(value)) {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::Whitespace,
                    DataSet::Memberships,
                    format!(
                        "Line {line} -- Person-ID {shown_person} -- org-ID '{org}' contains leading or trailing white space"
                    ),
                )
                .at_line(line)
                .for_id(shown_person),
            );
        }

        let pair = MembershipPair {
            line,
            person_id: shown_person.to_string(),
            org_id: org_id.unwrap_or_default().to_string(),
        };
        let key = pair.key();
        if !self.seen.insert(key.clone()) {
            self.duplicates += 1;
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::DuplicatePair,
                    DataSet::Memberships,
                    format!("Line {line} -- person-ID & org-unit-ID pair are a duplicate. {key}"),
                )
                .at_line(line)
                .for_id(shown_person),
            );
        }

        if let Some(org) = org_id.filter(|org| !orgs.contains(org)) {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::UnknownOrg,
                    DataSet::Memberships,
                    format!("Line {line} -- Org-ID '{org}' does not exist in the Org-CSV"),
                )
                .at_line(line)
                .for_id(org),
            );
        }
        if let Some(person) = person_id.filter(|person| !persons.contains(person)) {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::UnknownPerson,
                    DataSet::Memberships,
                    format!("Line {line} -- Person-ID '{person}' does not exist in the Person-CSV"),
                )
                .at_line(line)
                .for_id(person),
            );
        }

        if let Some(person) = person_id {
            self.person_ids.insert(person.to_string());
        }
        if let Some(org) = org_id {
            self.org_ids.insert(org.to_string());
        }
        self.pairs.push(pair);
    }

    /// Reports every registered person that no pair refers to. Pairs are
    /// assumed to have been checked against the registries while loading.
    pub fn verify_all_people_in_org<S>(&self, persons: &PersonRegistry, sink: &mut S)
    where
        S: DiagnosticSink + ?Sized,
    {
        let mut missing = 0usize;
        for person in persons.ids() {
            if self.person_ids.contains(person) {
                continue;
            }
            missing += 1;
            let mut diagnostic = Diagnostic::warning(
                DiagnosticCode::NotInMembership,
                DataSet::Persons,
                format!("Person-ID {person} not found in membership data"),
            )
            .for_id(person);
            if let Some(record) = persons.table().get(person) {
                diagnostic = diagnostic.at_line(record.line());
            }
            sink.emit(diagnostic);
        }
        debug!(missing, "membership coverage checked");
    }

    /// Pairs in row order, duplicates included.
    pub fn pairs(&self) -> &[MembershipPair] {
        &self.pairs
    }

    pub fn person_ids(&self) -> impl Iterator<Item = &str> {
        self.person_ids.iter().map(String::as_str)
    }

    pub fn org_ids(&self) -> impl Iterator<Item = &str> {
        self.org_ids.iter().map(String::as_str)
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs as rows in the membership file layout.
    pub fn to_rows(&self, columns: &MembershipColumns) -> Vec<RawRow> {
        let width = columns.person_id.max(columns.org_id) + 1;
        self.pairs
            .iter()
            .map(|pair| {
                let mut fields = vec![None; width];
                fields[columns.person_id] = non_empty(&pair.person_id);
                fields[columns.org_id] = non_empty(&pair.org_id);
                RawRow {
                    line: pair.line,
                    fields,
                }
            })
            .collect()
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() { None } else { Some(value.to_string()) }
}

//! Organization units and their paths to the root unit.
//!
//! The root is the single record whose id equals its own parent id. Every
//! other unit must reach it by following parent ids. Each unit's walk is
//! recorded as a [`PathResult`] for reporting.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, instrument, warn};

use crate::wosp::check::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use crate::wosp::check::error::{CheckError, Result};
use crate::wosp::check::model::{DataSet, PathResult, PathStatus, RawRow, RecordId};
use crate::wosp::check::table::{ColumnSpec, FieldRule, RecordTable, Schema};

pub const DESCRIPTION: &str = "description";
pub const PARENT_ID: &str = "parent ID";

/// Column positions of the organization file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrgColumns {
    pub id: usize,
    pub description: usize,
    pub parent_id: usize,
}

impl Default for OrgColumns {
    fn default() -> Self {
        Self {
            id: 0,
            description: 1,
            parent_id: 2,
        }
    }
}

impl OrgColumns {
    pub fn schema(&self) -> Schema {
        Schema::new(DataSet::Organizations, self.id)
            .with_column(ColumnSpec::new(DESCRIPTION, self.description, FieldRule::Optional))
            .with_column(ColumnSpec::new(PARENT_ID, self.parent_id, FieldRule::Reference))
    }
}

#[derive(Debug, Clone)]
pub struct OrganizationHierarchy {
    table: RecordTable,
    root_id: RecordId,
    paths: BTreeMap<RecordId, PathResult>,
}

impl OrganizationHierarchy {
    /// Loads the organization rows, identifies the root and resolves every
    /// unit's path.
    ///
    /// Root candidates are counted over the raw rows, so a root row repeated
    /// under the same id counts twice even though only the first is stored.
    /// Fails with [`CheckError::RootCount`] unless exactly one root row
    /// exists; no path is resolved in that case.
    #[instrument(level = "info", skip_all)]
    pub fn load<I, S>(columns: OrgColumns, rows: I, sink: &mut S) -> Result<Self>
    where
        I: IntoIterator<Item = RawRow>,
        S: DiagnosticSink + ?Sized,
    {
        let mut candidates = Vec::new();
        let table = RecordTable::load_with(columns.schema(), rows, sink, |row, sink| {
            if let Some(id) = root_candidate(&columns, row) {
                sink.emit(
                    Diagnostic::info(
                        DiagnosticCode::RootFound,
                        DataSet::Organizations,
                        format!("ID {id} -- Root record found on line {}", row.line),
                    )
                    .at_line(row.line)
                    .for_id(id),
                );
                candidates.push(id.to_string());
            }
        });
        let mut hierarchy = Self::with_root(table, candidates)?;
        hierarchy.check_path_to_root(sink);
        Ok(hierarchy)
    }

    /// Accepts the table only when exactly one root candidate was seen. Paths
    /// stay empty until [`check_path_to_root`](Self::check_path_to_root) runs.
    fn with_root(table: RecordTable, mut candidates: Vec<RecordId>) -> Result<Self> {
        if candidates.len() != 1 {
            warn!(found = candidates.len(), "root record count mismatch");
            return Err(CheckError::RootCount {
                found: candidates.len(),
            });
        }
        let root_id = candidates.remove(0);
        info!(root = %root_id, units = table.len(), "organization hierarchy loaded");

        Ok(Self {
            table,
            root_id,
            paths: BTreeMap::new(),
        })
    }

    /// Walks every unit's parent chain in id order and records the result.
    #[instrument(level = "info", skip_all, fields(root = %self.root_id))]
    pub fn check_path_to_root<S>(&mut self, sink: &mut S)
    where
        S: DiagnosticSink + ?Sized,
    {
        let mut paths = BTreeMap::new();
        for id in self.table.ids() {
            let path = self.resolve(id, sink);
            paths.insert(id.to_string(), path);
        }
        let broken = paths.values().filter(|path| !path.is_ok()).count();
        debug!(paths = paths.len(), broken, "paths resolved");
        self.paths = paths;
    }

    fn resolve<S>(&self, id: &str, sink: &mut S) -> PathResult
    where
        S: DiagnosticSink + ?Sized,
    {
        if id == self.root_id {
            return PathResult {
                id: id.to_string(),
                chain: vec![id.to_string()],
                status: PathStatus::Ok,
            };
        }

        let mut chain = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut previous: Option<&str> = None;
        let mut current = id;

        let status = loop {
            let first_visit = visited.insert(current);
            chain.push(current.to_string());
            if !first_visit {
                sink.emit(self.cycle_diagnostic(id, current));
                break PathStatus::ErrorCycle;
            }

            let Some(parent) = self.parent_of(current) else {
                sink.emit(self.dangling_diagnostic(current, previous));
                break PathStatus::ErrorNoParent;
            };
            if current == self.root_id {
                break PathStatus::Ok;
            }

            previous = Some(current);
            current = parent;
        };

        PathResult {
            id: id.to_string(),
            chain,
            status,
        }
    }

    fn dangling_diagnostic(&self, current: &str, child: Option<&str>) -> Diagnostic {
        if let Some(record) = self.table.get(current) {
            return Diagnostic::error(
                DiagnosticCode::MissingParent,
                DataSet::Organizations,
                format!("ID {current} has no parent ID; its path cannot reach the root"),
            )
            .at_line(record.line())
            .for_id(current);
        }

        let child = child.unwrap_or_default();
        let description = self.description(child).unwrap_or_default();
        let mut diagnostic = Diagnostic::error(
            DiagnosticCode::BrokenParent,
            DataSet::Organizations,
            format!("ID {current} does not exist! (Child {child}; '{description}')"),
        )
        .for_id(current);
        if let Some(record) = self.table.get(child) {
            diagnostic = diagnostic.at_line(record.line());
        }
        diagnostic
    }

    fn cycle_diagnostic(&self, start: &str, repeated: &str) -> Diagnostic {
        let mut diagnostic = Diagnostic::error(
            DiagnosticCode::PathCycle,
            DataSet::Organizations,
            format!("ID {start} -- path to root loops back to ID {repeated}"),
        )
        .for_id(start);
        if let Some(record) = self.table.get(start) {
            diagnostic = diagnostic.at_line(record.line());
        }
        diagnostic
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn contains(&self, id: &str) -> bool {
        self.table.contains(id)
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.table.value(id, PARENT_ID)
    }

    pub fn description(&self, id: &str) -> Option<&str> {
        self.table.value(id, DESCRIPTION)
    }

    pub fn path(&self, id: &str) -> Option<&PathResult> {
        self.paths.get(id)
    }

    /// Path results in id order.
    pub fn paths(&self) -> impl Iterator<Item = &PathResult> {
        self.paths.values()
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

/// The row's id when it names itself as its own parent.
fn root_candidate<'a>(columns: &OrgColumns, row: &'a RawRow) -> Option<&'a str> {
    let id = row.field(columns.id)?;
    (row.field(columns.parent_id) == Some(id)).then_some(id)
}

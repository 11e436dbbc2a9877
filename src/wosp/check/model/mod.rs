use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an organization unit or a person. Values are kept exactly as
/// read, including any leading or trailing white space.
pub type RecordId = String;

/// The three input files checked by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSet {
    Organizations,
    Persons,
    Memberships,
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSet::Organizations => write!(f, "org"),
            DataSet::Persons => write!(f, "person"),
            DataSet::Memberships => write!(f, "person2org"),
        }
    }
}

/// A row as read from an input file, before any schema is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line (or worksheet row) number.
    pub line: usize,
    /// Cell values. Empty cells are `None`.
    pub fields: Vec<Option<String>>,
}

impl RawRow {
    /// Builds a row from plain strings; empty strings become `None`.
    pub fn from_strings<I, S>(line: usize, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|value| {
                let value = value.into();
                if value.is_empty() { None } else { Some(value) }
            })
            .collect();
        Self { line, fields }
    }

    /// Returns the value at `index`, or `None` when the cell is blank or the
    /// row is too short.
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).and_then(|value| value.as_deref())
    }
}

/// A keyed record stored by a [`RecordTable`](crate::table::RecordTable).
///
/// The whole source row is retained so the table can be written back out
/// with the same column layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub row: RawRow,
}

impl Record {
    pub fn line(&self) -> usize {
        self.row.line
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.row.field(index)
    }
}

/// One line of the membership file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipPair {
    pub line: usize,
    /// Empty when the source cell was blank.
    pub person_id: RecordId,
    /// Empty when the source cell was blank.
    pub org_id: RecordId,
}

impl MembershipPair {
    /// Key used for duplicate detection: both ids joined by a comma.
    pub fn key(&self) -> String {
        format!("{},{}", self.person_id, self.org_id)
    }
}

/// Outcome of walking an organization unit's parent chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathStatus {
    /// The walk reached the root record.
    Ok,
    /// The walk hit an id without a parent entry.
    ErrorNoParent,
    /// The walk revisited an id before reaching the root.
    ErrorCycle,
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStatus::Ok => write!(f, "ok"),
            PathStatus::ErrorNoParent => write!(f, "error-no-parent"),
            PathStatus::ErrorCycle => write!(f, "error-cycle"),
        }
    }
}

/// Path from an organization unit towards the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResult {
    pub id: RecordId,
    /// Ids from the unit itself up to the point where the walk stopped. For
    /// [`PathStatus::ErrorCycle`] the last entry is the revisited id.
    pub chain: Vec<RecordId>,
    pub status: PathStatus,
}

impl PathResult {
    pub fn is_ok(&self) -> bool {
        self.status == PathStatus::Ok
    }

    /// Renders the chain followed by the status marker, e.g. `3 > 1 > ok`.
    pub fn display_chain(&self) -> String {
        let mut parts: Vec<String> = self.chain.clone();
        parts.push(self.status.to_string());
        parts.join(" > ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_row_treats_blank_cells_as_missing() {
        let row = RawRow::from_strings(4, ["A1", "", " B "]);

        assert_eq!(row.field(0), Some("A1"));
        assert_eq!(row.field(1), None);
        assert_eq!(row.field(2), Some(" B "));
        assert_eq!(row.field(9), None);
    }

    #[test]
    fn pair_key_joins_blank_ids_as_empty() {
        let pair = MembershipPair {
            line: 1,
            person_id: String::new(),
            org_id: "O1".into(),
        };

        assert_eq!(pair.key(), ",O1");
    }

    #[test]
    fn path_display_appends_status_marker() {
        let path = PathResult {
            id: "3".into(),
            chain: vec!["3".into(), "2".into()],
            status: PathStatus::ErrorNoParent,
        };

        assert_eq!(path.display_chain(), "3 > 2 > error-no-parent");
    }
}

//! Tabular views of the loaded data, written as a workbook or as text.

use std::io::Write;

use crate::wosp::check::diagnostics::Diagnostic;
use crate::wosp::check::error::Result;
use crate::wosp::check::hierarchy::OrganizationHierarchy;
use crate::wosp::check::membership::MembershipIndex;
use crate::wosp::check::persons::PersonRegistry;

pub const ORGANIZATIONS_SHEET: &str = "Organizations";
pub const PERSONS_SHEET: &str = "Persons";
pub const MEMBERSHIPS_SHEET: &str = "Memberships";
pub const DIAGNOSTICS_SHEET: &str = "Diagnostics";

/// A table that will be materialised as an Excel sheet or a text block.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    fn new(sheet_name: &str, columns: &[&str]) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

/// All tables making up a report.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

impl WorkbookData {
    pub fn table(&self, sheet_name: &str) -> Option<&SheetTable> {
        self.tables.iter().find(|table| table.sheet_name == sheet_name)
    }
}

/// Organization units in id order with their resolved paths.
pub fn organizations_table(orgs: &OrganizationHierarchy) -> SheetTable {
    let mut table = SheetTable::new(
        ORGANIZATIONS_SHEET,
        &["id", "parent_id", "description", "path", "status"],
    );
    for path in orgs.paths() {
        table.rows.push(vec![
            path.id.clone(),
            orgs.parent_of(&path.id).unwrap_or_default().to_string(),
            orgs.description(&path.id).unwrap_or_default().to_string(),
            path.chain.join(" > "),
            path.status.to_string(),
        ]);
    }
    table
}

/// Persons in id order.
pub fn persons_table(persons: &PersonRegistry) -> SheetTable {
    let mut table = SheetTable::new(PERSONS_SHEET, &["id", "field"]);
    for id in persons.ids() {
        table.rows.push(vec![
            id.to_string(),
            persons.mandatory_field(id).unwrap_or_default().to_string(),
        ]);
    }
    table
}

/// Pairs in file order, duplicates included.
pub fn memberships_table(memberships: &MembershipIndex) -> SheetTable {
    let mut table = SheetTable::new(MEMBERSHIPS_SHEET, &["line", "person_id", "org_id"]);
    for pair in memberships.pairs() {
        table.rows.push(vec![
            pair.line.to_string(),
            pair.person_id.clone(),
            pair.org_id.clone(),
        ]);
    }
    table
}

pub fn diagnostics_table(diagnostics: &[Diagnostic]) -> SheetTable {
    let mut table = SheetTable::new(
        DIAGNOSTICS_SHEET,
        &["severity", "code", "dataset", "line", "id", "message"],
    );
    for diagnostic in diagnostics {
        table.rows.push(vec![
            diagnostic.severity.to_string(),
            serde_json::to_value(diagnostic.code)
                .ok()
                .and_then(|value| value.as_str().map(str::to_string))
                .unwrap_or_default(),
            diagnostic.dataset.to_string(),
            diagnostic.line.map(|line| line.to_string()).unwrap_or_default(),
            diagnostic.id.clone().unwrap_or_default(),
            diagnostic.message.clone(),
        ]);
    }
    table
}

pub fn build_report(
    orgs: &OrganizationHierarchy,
    persons: &PersonRegistry,
    memberships: &MembershipIndex,
    diagnostics: &[Diagnostic],
) -> WorkbookData {
    WorkbookData {
        tables: vec![
            organizations_table(orgs),
            persons_table(persons),
            memberships_table(memberships),
            diagnostics_table(diagnostics),
        ],
    }
}

/// Writes every table as a titled block of comma separated, padded columns.
pub fn render_text<W: Write>(workbook: &WorkbookData, mut out: W) -> Result<()> {
    for table in &workbook.tables {
        writeln!(out, "== {} ({} rows)", table.sheet_name, table.rows.len())?;

        let mut widths: Vec<usize> = table.columns.iter().map(|column| column.chars().count()).collect();
        for row in &table.rows {
            for (index, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(index) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        writeln!(out, "{}", format_line(&table.columns, &widths))?;
        for row in &table.rows {
            writeln!(out, "{}", format_line(row, &widths))?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let last = cells.len().saturating_sub(1);
    cells
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let width = widths.get(index).copied().unwrap_or(0);
            if index == last {
                cell.clone()
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wosp::check::hierarchy::OrgColumns;
    use crate::wosp::check::membership::MembershipColumns;
    use crate::wosp::check::model::RawRow;
    use crate::wosp::check::persons::PersonColumns;

    fn sample() -> WorkbookData {
        let mut sink = Vec::new();
        let orgs = OrganizationHierarchy::load(
            OrgColumns::default(),
            vec![
                RawRow::from_strings(1, ["1", "University", "1"]),
                RawRow::from_strings(2, ["2", "Faculty", "1"]),
                RawRow::from_strings(3, ["3", "Lab", "8"]),
            ],
            &mut sink,
        )
        .expect("single root");
        let persons = PersonRegistry::load(
            PersonColumns::default(),
            vec![RawRow::from_strings(1, ["P1", "", "", "", "p1@example.org"])],
            &mut sink,
        );
        let memberships = MembershipIndex::load(
            MembershipColumns::default(),
            vec![RawRow::from_strings(1, ["P1", "2"])],
            &orgs,
            &persons,
            &mut sink,
        );
        build_report(&orgs, &persons, &memberships, &sink)
    }

    #[test]
    fn organization_rows_carry_paths_and_status() {
        let report = sample();
        let orgs = report.table(ORGANIZATIONS_SHEET).expect("organizations");

        assert_eq!(orgs.rows.len(), 3);
        assert_eq!(orgs.rows[1], vec!["2", "1", "Faculty", "2 > 1", "ok"]);
        assert_eq!(orgs.rows[2][4], "error-no-parent");
    }

    #[test]
    fn diagnostics_sheet_lists_codes_in_snake_case() {
        let report = sample();
        let diagnostics = report.table(DIAGNOSTICS_SHEET).expect("diagnostics");

        assert_eq!(diagnostics.rows[0][0], "INFO");
        assert_eq!(diagnostics.rows[0][1], "root_found");
        assert!(diagnostics.rows.iter().any(|row| row[1] == "broken_parent"));
    }

    #[test]
    fn text_rendering_pads_all_but_the_last_column() {
        let report = WorkbookData {
            tables: vec![SheetTable {
                sheet_name: "Persons".into(),
                columns: vec!["id".into(), "field".into()],
                rows: vec![vec!["P10".into(), "a@b".into()]],
            }],
        };
        let mut buffer = Vec::new();
        render_text(&report, &mut buffer).expect("rendered");

        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(text, "== Persons (1 rows)\nid , field\nP10, a@b\n\n");
    }
}

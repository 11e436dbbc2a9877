use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::wosp::check::config::{
    CheckOptions, DEFAULT_MEMBERSHIP_FILE, DEFAULT_ORG_FILE, DEFAULT_PERSON_FILE, InputPaths,
    Schemas,
};
use crate::wosp::check::diagnostics::{Diagnostic, DiagnosticSink, OutputFormat, StreamSink, Tally};
use crate::wosp::check::error::{CheckError, Result};
use crate::wosp::check::hierarchy::OrganizationHierarchy;
use crate::wosp::check::io::{self, InputFormat, excel_write};
use crate::wosp::check::membership::MembershipIndex;
use crate::wosp::check::persons::PersonRegistry;
use crate::wosp::check::report::{self, WorkbookData};

/// The three loaded and checked data sets.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub orgs: OrganizationHierarchy,
    pub persons: PersonRegistry,
    pub memberships: MembershipIndex,
}

impl LoadedData {
    pub fn report(&self, diagnostics: &[Diagnostic]) -> WorkbookData {
        report::build_report(&self.orgs, &self.persons, &self.memberships, diagnostics)
    }
}

/// Loads the organization, person and membership files in that order.
///
/// Stops with [`CheckError::RootCount`] when the organization file does not
/// have exactly one root record; the other files are not read in that case.
#[instrument(
    level = "info",
    skip_all,
    fields(org = %paths.org.display(), person = %paths.person.display(), membership = %paths.membership.display())
)]
pub fn load_inputs<S>(paths: &InputPaths, schemas: &Schemas, sink: &mut S) -> Result<LoadedData>
where
    S: DiagnosticSink + ?Sized,
{
    let org_rows = io::read_rows(&paths.org)?;
    let orgs = OrganizationHierarchy::load(schemas.org, org_rows, sink)?;

    let person_rows = io::read_rows(&paths.person)?;
    let persons = PersonRegistry::load(schemas.person, person_rows, sink);

    let membership_rows = io::read_rows(&paths.membership)?;
    let memberships =
        MembershipIndex::load(schemas.membership, membership_rows, &orgs, &persons, sink);

    Ok(LoadedData {
        orgs,
        persons,
        memberships,
    })
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub tally: Tally,
    pub org_units: usize,
    pub broken_paths: usize,
    pub persons: usize,
    pub pairs: usize,
}

impl Summary {
    pub fn new(data: &LoadedData, tally: Tally) -> Self {
        Self {
            tally,
            org_units: data.orgs.len(),
            broken_paths: data.orgs.paths().filter(|path| !path.is_ok()).count(),
            persons: data.persons.len(),
            pairs: data.memberships.len(),
        }
    }

    /// In strict mode any error diagnostic fails the run.
    pub fn enforce(&self, strict: bool) -> Result<()> {
        if strict && self.tally.errors > 0 {
            return Err(CheckError::StrictFailure {
                errors: self.tally.errors,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INFO: checked {} org units ({} broken paths), {} persons, {} membership pairs -- {} error(s), {} warning(s)",
            self.org_units,
            self.broken_paths,
            self.persons,
            self.pairs,
            self.tally.errors,
            self.tally.warnings
        )
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub data: LoadedData,
    pub summary: Summary,
    pub diagnostics: Vec<Diagnostic>,
}

/// Loads and checks all inputs, streaming diagnostics to `out` as they are
/// found. Strict mode is not applied here; see [`Summary::enforce`].
pub fn run_check<W: Write>(paths: &InputPaths, options: &CheckOptions, out: W) -> Result<Outcome> {
    let mut sink = StreamSink::new(out, options.format).retaining();
    let data = load_inputs(paths, &options.schemas, &mut sink)?;
    let summary = Summary::new(&data, sink.tally());
    if sink.format() == OutputFormat::Text {
        sink.note(&summary.to_string())?;
    }
    let (_, diagnostics) = sink.finish()?;
    info!(
        errors = summary.tally.errors,
        warnings = summary.tally.warnings,
        broken_paths = summary.broken_paths,
        "check finished"
    );
    Ok(Outcome {
        data,
        summary,
        diagnostics,
    })
}

/// Writes the de-duplicated organization and person tables and the
/// membership pairs back out with their original column layout.
#[instrument(level = "info", skip_all, fields(out_dir = %out_dir.display(), ?format))]
pub fn export(
    data: &LoadedData,
    schemas: &Schemas,
    out_dir: &Path,
    format: InputFormat,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let files = [
        (DEFAULT_ORG_FILE, "org", data.orgs.table().to_rows()),
        (DEFAULT_PERSON_FILE, "person", data.persons.table().to_rows()),
        (
            DEFAULT_MEMBERSHIP_FILE,
            "person2org",
            data.memberships.to_rows(&schemas.membership),
        ),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (file_name, sheet_name, rows) in files {
        let path = match format {
            InputFormat::Csv => {
                let path = out_dir.join(file_name);
                io::csv::write_rows(&path, &rows)?;
                path
            }
            InputFormat::Excel => {
                let path = out_dir.join(file_name).with_extension("xlsx");
                excel_write::write_rows(&path, sheet_name, &rows)?;
                path
            }
        };
        info!(path = %path.display(), rows = rows.len(), "table exported");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_mode_fails_only_on_errors() {
        let summary = Summary {
            tally: Tally {
                info: 1,
                warnings: 4,
                errors: 0,
            },
            org_units: 3,
            broken_paths: 0,
            persons: 2,
            pairs: 2,
        };
        assert!(summary.enforce(true).is_ok());

        let failing = Summary {
            tally: Tally {
                errors: 2,
                ..summary.tally
            },
            ..summary
        };
        assert!(failing.enforce(false).is_ok());
        assert!(matches!(
            failing.enforce(true),
            Err(CheckError::StrictFailure { errors: 2 })
        ));
    }
}

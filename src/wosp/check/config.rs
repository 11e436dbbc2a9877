use std::path::{Path, PathBuf};

use crate::wosp::check::diagnostics::OutputFormat;
use crate::wosp::check::hierarchy::OrgColumns;
use crate::wosp::check::membership::MembershipColumns;
use crate::wosp::check::persons::PersonColumns;

pub const DEFAULT_DATA_DIR: &str = "etc";
pub const DEFAULT_ORG_FILE: &str = "org.csv";
pub const DEFAULT_PERSON_FILE: &str = "person.csv";
pub const DEFAULT_MEMBERSHIP_FILE: &str = "person2org.csv";

/// Locations of the three input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub org: PathBuf,
    pub person: PathBuf,
    pub membership: PathBuf,
}

impl InputPaths {
    /// The default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            org: dir.join(DEFAULT_ORG_FILE),
            person: dir.join(DEFAULT_PERSON_FILE),
            membership: dir.join(DEFAULT_MEMBERSHIP_FILE),
        }
    }
}

impl Default for InputPaths {
    fn default() -> Self {
        Self::in_dir(Path::new(DEFAULT_DATA_DIR))
    }
}

/// Column layout of all three files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Schemas {
    pub org: OrgColumns,
    pub person: PersonColumns,
    pub membership: MembershipColumns,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOptions {
    pub schemas: Schemas,
    /// Fail the run when any error diagnostic was reported. Off by default:
    /// diagnostics are advisory unless asked otherwise.
    pub strict: bool,
    pub format: OutputFormat,
}

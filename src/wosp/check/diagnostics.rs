//! Structured diagnostics and the sinks that receive them.
//!
//! Loaders never print. They push a [`Diagnostic`] into whatever
//! [`DiagnosticSink`] the caller hands them, as soon as the problem is found.

use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::wosp::check::error::Result;
use crate::wosp::check::model::DataSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Machine readable classification of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    RootFound,
    MissingId,
    MissingReference,
    MissingField,
    DuplicateId,
    Whitespace,
    BrokenParent,
    MissingParent,
    PathCycle,
    MissingPersonId,
    MissingOrgId,
    DuplicatePair,
    UnknownOrg,
    UnknownPerson,
    NotInMembership,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub dataset: DataSet,
    pub line: Option<usize>,
    pub id: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        dataset: DataSet,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            dataset,
            line: None,
            id: None,
            message: message.into(),
        }
    }

    pub fn error(code: DiagnosticCode, dataset: DataSet, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, dataset, message)
    }

    pub fn warning(code: DiagnosticCode, dataset: DataSet, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, dataset, message)
    }

    pub fn info(code: DiagnosticCode, dataset: DataSet, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, dataset, message)
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn for_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.dataset)?;
        if let Some(line) = self.line {
            write!(f, " line {line}")?;
        }
        write!(f, " -- {}", self.message)
    }
}

/// Receiver for diagnostics produced while loading and checking data.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

/// Count of diagnostics per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub info: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl Tally {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Info => self.info += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Error => self.errors += 1,
        }
    }
}

/// Rendering used by [`StreamSink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Writes and flushes every diagnostic the moment it is emitted.
///
/// Write failures cannot be surfaced through [`DiagnosticSink::emit`], so the
/// first one is kept and returned by [`StreamSink::finish`].
pub struct StreamSink<W: Write> {
    writer: W,
    format: OutputFormat,
    tally: Tally,
    retained: Vec<Diagnostic>,
    keep: bool,
    failure: Option<crate::wosp::check::error::CheckError>,
}

impl<W: Write> StreamSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            tally: Tally::default(),
            retained: Vec::new(),
            keep: false,
            failure: None,
        }
    }

    /// Also keeps a copy of every diagnostic, for reports written after the
    /// run.
    pub fn retaining(mut self) -> Self {
        self.keep = true;
        self
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn retained(&self) -> &[Diagnostic] {
        &self.retained
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Writes a free-form line (text mode only).
    pub fn note(&mut self, line: &str) -> Result<()> {
        if self.format == OutputFormat::Text {
            writeln!(self.writer, "{line}")?;
        }
        Ok(())
    }

    /// Flushes the stream and reports the first write failure, if any.
    pub fn finish(mut self) -> Result<(Tally, Vec<Diagnostic>)> {
        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }
        self.writer.flush()?;
        Ok((self.tally, self.retained))
    }

    fn write(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "{diagnostic}")?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, diagnostic)?;
                writeln!(self.writer)?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> DiagnosticSink for StreamSink<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.tally.record(diagnostic.severity);
        if self.failure.is_none() {
            if let Err(error) = self.write(&diagnostic) {
                self.failure = Some(error);
            }
        }
        if self.keep {
            self.retained.push(diagnostic);
        }
    }
}

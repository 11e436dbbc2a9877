//! Core library for the wosp-check command line application.
//!
//! The checker validates three related spreadsheets: an organization
//! hierarchy, a person list and the person-to-organization memberships. Raw
//! rows are read by the adapters under [`wosp::check::io`], keyed by
//! [`wosp::check::table`], and checked by [`wosp::check::hierarchy`],
//! [`wosp::check::persons`] and [`wosp::check::membership`]. Every problem is
//! reported as a structured [`Diagnostic`] pushed into a
//! [`DiagnosticSink`]; only I/O failures and a broken root record abort a run.

pub mod wosp;

pub use wosp::check::{
    CheckError, Result, config, diagnostics, error, hierarchy, io, membership, model, persons,
    report, table, validate,
};
pub use wosp::check::diagnostics::{Diagnostic, DiagnosticSink, Severity};

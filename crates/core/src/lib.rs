//! triage-core
//!
//! Core library for triaging function-name suggestions that come from a remote
//! corpus of known code.
//!
//! This crate turns a flat stream of function-match records into per-function
//! summaries, scores how conflicted each naming suggestion is, applies score and
//! categorical filters, and keeps the analyst's sticky selection and manual
//! resolutions across recomputations. It also persists a project (imported data
//! plus session state) in SQLite.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends (CLI, disassembler plugins, etc.).

pub mod model;
pub mod services;
pub mod db;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! binsight-core
//!
//! Core library for static inspection and model-assisted analysis of single files.
//!
//! The crate sniffs and decodes executable containers (PE, ELF, Mach-O), recovers printable
//! strings, and fans a file out to a pluggable insight capability for extraction,
//! vulnerability and summary tasks, merging the answers into one `AnalysisResult`.
//!
//! All substantive logic lives here so it is testable and reusable from multiple frontends.

pub mod analysis;
pub mod config;
pub mod logging;
pub mod model;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

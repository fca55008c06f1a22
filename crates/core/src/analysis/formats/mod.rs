//! Container parsers for the three supported executable formats.
//!
//! Each parser takes the whole file buffer and fills the structural part of a
//! `FileInfo`. Errors are returned, never panicked; the inspector turns them into an
//! `Unknown` classification.

pub mod elf;
pub mod macho;
pub mod pe;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Section;

/// Structural facts one parser produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedContainer {
    pub arch: String,
    pub sections: Vec<Section>,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub is_stripped: bool,
}

/// A format parser could not decode a structurally-confirmed candidate.
#[derive(Debug, Error)]
pub enum FormatParseError {
    #[error("malformed container: {0}")]
    Malformed(#[from] goblin::error::Error),
    #[error("unsupported container layout: {0}")]
    Unsupported(String),
}

/// How PE exports are recovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportStrategy {
    /// Heuristic: scan export-looking sections for symbol-shaped ASCII runs.
    #[default]
    SectionScan,
    /// Decode the PE export directory.
    ExportDirectory,
}

/// Resolve an architecture name from a fixed table, or `Unknown (0x..)`.
pub(crate) fn lookup_arch(table: &[(u32, &str)], code: u32) -> String {
    table
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("Unknown ({code:#x})"))
}

/// Clamp a file range to the buffer, returning an empty slice when it falls outside.
pub(crate) fn file_slice(bytes: &[u8], offset: u64, size: u64) -> &[u8] {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(bytes.len());
    let end = usize::try_from(offset.saturating_add(size)).unwrap_or(usize::MAX).min(bytes.len());
    &bytes[start..end]
}

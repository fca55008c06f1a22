//! Printable string recovery.
//!
//! Preferred source is an external `strings`-style tool; when it is disabled, missing or
//! fails, the raw buffer is scanned for printable runs instead. Both paths apply the
//! same minimum length.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use regex::bytes::Regex;
use tracing::debug;

/// Shortest run ever emitted.
pub const MIN_STRING_LEN: usize = 4;

/// Default external tool name, resolved through `PATH`.
pub const DEFAULT_STRINGS_TOOL: &str = "strings";

fn printable_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?-u)[A-Za-z0-9/\-:.,_$%'()\[\]<> ]{4,}").expect("static regex")
    })
}

/// Scan a buffer for maximal printable ASCII runs of at least `MIN_STRING_LEN` bytes.
///
/// Runs are non-overlapping and returned left to right.
pub fn scan_printable(bytes: &[u8]) -> Vec<String> {
    printable_run()
        .find_iter(bytes)
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        .collect()
}

/// String extractor with an optional external tool.
#[derive(Debug, Clone)]
pub struct StringExtractor {
    tool: Option<PathBuf>,
}

impl Default for StringExtractor {
    fn default() -> Self {
        Self::with_tool(DEFAULT_STRINGS_TOOL)
    }
}

impl StringExtractor {
    /// Builtin scanning only.
    pub fn builtin() -> Self {
        Self { tool: None }
    }

    pub fn with_tool(tool: impl Into<PathBuf>) -> Self {
        Self { tool: Some(tool.into()) }
    }

    /// Extract strings for the file at `path`, whose content is `bytes`.
    pub fn extract(&self, path: &Path, bytes: &[u8]) -> Vec<String> {
        if let Some(tool) = &self.tool {
            match run_tool(tool, path) {
                Ok(strings) => return strings,
                Err(err) => {
                    debug!(tool = %tool.display(), error = %err, "falling back to builtin string scan")
                }
            }
        }
        scan_printable(bytes)
    }
}

fn run_tool(tool: &Path, path: &Path) -> Result<Vec<String>, String> {
    let output = Command::new(tool)
        .arg(path)
        .output()
        .map_err(|e| format!("failed to spawn {}: {e}", tool.display()))?;
    if !output.status.success() {
        return Err(format!("{} exited with {}", tool.display(), output.status));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() >= MIN_STRING_LEN)
        .map(str::to_string)
        .collect())
}

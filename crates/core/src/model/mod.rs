//! Core data model for inspected files and analysis results.
//!
//! - `FileInfo` / `Section`: structural facts recovered from a binary by the inspector.
//! - `Finding` / `Vulnerability`: items parsed out of insight responses.
//! - `AnalysisResult`: the aggregate handed back to callers once all tasks are done.
//!
//! Everything here is a plain value type with no back-references, so results can be
//! serialized and handed to whatever persistence or UI layer sits above the core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Container format recognized from a file's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatTag {
    #[serde(rename = "PE")]
    Pe,
    #[serde(rename = "ELF")]
    Elf,
    #[serde(rename = "Mach-O")]
    MachO,
    Unknown,
}

impl FormatTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::Pe => "PE",
            FormatTag::Elf => "ELF",
            FormatTag::MachO => "Mach-O",
            FormatTag::Unknown => "Unknown",
        }
    }

    /// Mask of the section flag bit meaning "contains executable instructions".
    ///
    /// PE: `IMAGE_SCN_MEM_EXECUTE`, ELF: `SHF_EXECINSTR`, Mach-O: `S_ATTR_SOME_INSTRUCTIONS`.
    pub fn executable_flag(&self) -> u64 {
        match self {
            FormatTag::Pe => 0x2000_0000,
            FormatTag::Elf => 0x4,
            FormatTag::MachO => 0x400,
            FormatTag::Unknown => 0,
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named region of a binary.
///
/// The executable bit is derived from `flags` when the section is built and is not
/// settable on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub address: u64,
    pub size: u64,
    pub offset: u64,
    /// Raw flag bits as stored by the owning format.
    pub flags: u64,
    is_executable: bool,
}

impl Section {
    pub fn new(
        format: FormatTag,
        name: impl Into<String>,
        address: u64,
        size: u64,
        offset: u64,
        flags: u64,
    ) -> Self {
        let is_executable = flags & format.executable_flag() != 0;
        Self { name: name.into(), address, size, offset, flags, is_executable }
    }

    pub fn is_executable(&self) -> bool {
        self.is_executable
    }

    /// Flags rendered the way disassemblers usually print them (`%08x`).
    pub fn flags_hex(&self) -> String {
        format!("{:08x}", self.flags)
    }
}

/// Structural facts about one inspected file.
///
/// When `format` is `Unknown`, `arch` is `None` and the section/import/export lists are
/// empty; `strings` may still be populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub format: FormatTag,
    pub arch: Option<String>,
    pub sections: Vec<Section>,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub strings: Vec<String>,
    pub is_stripped: bool,
}

impl FileInfo {
    /// Build an info record with no structural data, only identity and strings.
    pub fn unknown(
        path: impl Into<String>,
        name: impl Into<String>,
        size: u64,
        strings: Vec<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size,
            format: FormatTag::Unknown,
            arch: None,
            sections: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            strings,
            is_stripped: false,
        }
    }

    /// Architecture label, `"Unknown"` when no container was decoded.
    pub fn arch_label(&self) -> &str {
        self.arch.as_deref().unwrap_or("Unknown")
    }
}

/// Three-level severity used by findings and vulnerabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Parse the loose severity words models tend to emit.
    ///
    /// `critical` folds into `High`; surrounding punctuation and markdown emphasis are ignored.
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let word = raw
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphabetic())
            .to_ascii_lowercase();
        match word.as_str() {
            "low" | "info" | "informational" => Some(Severity::Low),
            "medium" | "med" | "moderate" => Some(Severity::Medium),
            "high" | "critical" | "severe" => Some(Severity::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notable item produced by the extraction task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: String,
    pub description: String,
    pub location: String,
    pub severity: Severity,
}

/// A potential security weakness produced by the vulnerability task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub category: String,
    pub description: String,
    pub location: String,
    pub severity: Severity,
    /// CVSS-like score, always within `0.0..=10.0`.
    pub cvss: f64,
    pub remediation: String,
}

/// Aggregate result of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub filename: String,
    pub file_type: String,
    pub file_size: u64,
    pub findings: Vec<Finding>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub summary: String,
}

impl AnalysisResult {
    pub fn new(filename: impl Into<String>, file_type: impl Into<String>, file_size: u64) -> Self {
        Self {
            filename: filename.into(),
            file_type: file_type.into(),
            file_size,
            findings: Vec::new(),
            vulnerabilities: Vec::new(),
            summary: String::new(),
        }
    }

    /// True when no task contributed anything.
    ///
    /// This is a valid outcome, distinct from a fatal error.
    pub fn is_inconclusive(&self) -> bool {
        self.findings.is_empty() && self.vulnerabilities.is_empty() && self.summary.is_empty()
    }
}

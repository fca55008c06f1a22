//! Static inspection of a single file.
//!
//! The `Inspector` loads a file once (enforcing the size cap before any parsing), sniffs
//! its container format, runs the matching parser and recovers printable strings. A parser
//! failure never aborts inspection: the file is reported as `Unknown` with strings only.

pub mod formats;
pub mod sniff;
pub mod strings;

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{FileInfo, FormatTag};
use formats::{ExportStrategy, FormatParseError, ParsedContainer};
use strings::StringExtractor;

/// Hard cap on analyzed file size (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Fatal conditions: the only errors an analysis call surfaces to its caller.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to access file {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("File {} is {size} bytes, over the {limit} byte analysis limit", path.display())]
    SizeLimitExceeded { path: PathBuf, size: u64, limit: u64 },
    #[error("Inspection job did not complete: {0}")]
    Internal(String),
}

/// File content loaded once and shared read-only by parsers and tasks.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub bytes: Arc<[u8]>,
}

/// Inspection pipeline: load, sniff, parse, extract strings.
#[derive(Debug, Clone)]
pub struct Inspector {
    max_file_size: u64,
    strings: StringExtractor,
    export_strategy: ExportStrategy,
}

impl Default for Inspector {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            strings: StringExtractor::default(),
            export_strategy: ExportStrategy::default(),
        }
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = limit;
        self
    }

    pub fn with_strings(mut self, strings: StringExtractor) -> Self {
        self.strings = strings;
        self
    }

    pub fn with_export_strategy(mut self, strategy: ExportStrategy) -> Self {
        self.export_strategy = strategy;
        self
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Read a file into memory, rejecting it before reading if it is over the cap.
    pub fn load(&self, path: &Path) -> Result<LoadedFile, AnalysisError> {
        let access = |source: io::Error| AnalysisError::Access { path: path.to_path_buf(), source };

        let meta = std::fs::metadata(path).map_err(access)?;
        if !meta.is_file() {
            return Err(access(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file")));
        }
        let too_big = |size: u64| AnalysisError::SizeLimitExceeded {
            path: path.to_path_buf(),
            size,
            limit: self.max_file_size,
        };
        if meta.len() > self.max_file_size {
            return Err(too_big(meta.len()));
        }

        // The file may grow between stat and read; never buffer more than cap + 1 bytes.
        let mut bytes = Vec::with_capacity(meta.len() as usize);
        File::open(path)
            .and_then(|f| f.take(self.max_file_size + 1).read_to_end(&mut bytes))
            .map_err(access)?;
        if bytes.len() as u64 > self.max_file_size {
            return Err(too_big(bytes.len() as u64));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(LoadedFile {
            path: path.to_path_buf(),
            name,
            size: bytes.len() as u64,
            bytes: Arc::from(bytes),
        })
    }

    /// Load and inspect a file.
    pub fn inspect(&self, path: &Path) -> Result<FileInfo, AnalysisError> {
        let file = self.load(path)?;
        Ok(self.inspect_loaded(&file))
    }

    /// Inspect an already-loaded file. Never fails.
    pub fn inspect_loaded(&self, file: &LoadedFile) -> FileInfo {
        let candidate = sniff::identify(&sniff::header_of(&file.bytes));
        debug!(file = %file.name, candidate = %candidate, "sniffed container format");

        let strings = self.strings.extract(&file.path, &file.bytes);
        let mut info = FileInfo::unknown(
            file.path.display().to_string(),
            file.name.clone(),
            file.size,
            strings,
        );

        if candidate == FormatTag::Unknown {
            return info;
        }
        match parse_container(candidate, &file.bytes, self.export_strategy) {
            Ok(parsed) => {
                info.format = candidate;
                info.arch = Some(parsed.arch);
                info.sections = parsed.sections;
                info.imports = parsed.imports;
                info.exports = parsed.exports;
                info.is_stripped = parsed.is_stripped;
            }
            Err(err) => {
                warn!(
                    file = %file.name,
                    candidate = %candidate,
                    error = %err,
                    "container parse failed; treating as Unknown"
                );
            }
        }
        info
    }
}

/// Run the parser for a sniffed candidate format.
pub fn parse_container(
    format: FormatTag,
    bytes: &[u8],
    exports: ExportStrategy,
) -> Result<ParsedContainer, FormatParseError> {
    match format {
        FormatTag::Pe => formats::pe::parse(bytes, exports),
        FormatTag::Elf => formats::elf::parse(bytes),
        FormatTag::MachO => formats::macho::parse(bytes),
        FormatTag::Unknown => Err(FormatParseError::Unsupported("no container magic".into())),
    }
}

/// Human-readable file type used in prompts and results.
///
/// A decoded container wins; otherwise the extension is consulted, then a NUL byte in the
/// first 1000 bytes marks the content as binary.
pub fn describe_file_type(info: &FileInfo, bytes: &[u8]) -> String {
    match info.format {
        FormatTag::Pe => return "Windows PE Executable".into(),
        FormatTag::Elf => return "ELF Binary".into(),
        FormatTag::MachO => return "Mach-O Binary".into(),
        FormatTag::Unknown => {}
    }

    let ext = Path::new(&info.name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let by_ext = match ext.as_str() {
        "exe" | "dll" => Some("Windows PE Executable"),
        "elf" | "so" => Some("ELF Binary"),
        "jar" => Some("Java Archive"),
        "class" => Some("Java Bytecode"),
        "js" => Some("JavaScript"),
        "py" => Some("Python"),
        "go" => Some("Go"),
        "c" | "cpp" | "h" | "hpp" => Some("C/C++"),
        _ => None,
    };
    if let Some(kind) = by_ext {
        return kind.into();
    }

    if bytes.iter().take(1000).any(|b| *b == 0) {
        "Binary".into()
    } else {
        "Text".into()
    }
}

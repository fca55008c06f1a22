use std::sync::OnceLock;

use goblin::pe::{self, PE};
use regex::bytes::Regex;

use super::{file_slice, lookup_arch, ExportStrategy, FormatParseError, ParsedContainer};
use crate::model::{FormatTag, Section};

const PE_ARCHES: &[(u32, &str)] = &[
    (pe::header::COFF_MACHINE_X86 as u32, "x86"),
    (pe::header::COFF_MACHINE_X86_64 as u32, "x86_64"),
    (pe::header::COFF_MACHINE_ARM as u32, "ARM"),
    (pe::header::COFF_MACHINE_ARMNT as u32, "ARM Thumb-2"),
    (pe::header::COFF_MACHINE_ARM64 as u32, "ARM64"),
];

/// Map a COFF machine code to an architecture name.
pub fn architecture(machine: u16) -> String {
    lookup_arch(PE_ARCHES, machine as u32)
}

/// Decode a PE image.
pub fn parse(bytes: &[u8], exports: ExportStrategy) -> Result<ParsedContainer, FormatParseError> {
    let image = PE::parse(bytes)?;

    let sections = image
        .sections
        .iter()
        .map(|sec| {
            Section::new(
                FormatTag::Pe,
                sec.name().unwrap_or_default(),
                sec.virtual_address as u64,
                sec.size_of_raw_data as u64,
                sec.pointer_to_raw_data as u64,
                sec.characteristics as u64,
            )
        })
        .collect();

    let imports = image.imports.iter().map(|imp| imp.name.to_string()).collect();

    let exports = match exports {
        ExportStrategy::SectionScan => scan_export_sections(&image, bytes),
        ExportStrategy::ExportDirectory => image
            .exports
            .iter()
            .filter_map(|exp| exp.name)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
    };

    Ok(ParsedContainer {
        arch: architecture(image.header.coff_header.machine),
        sections,
        imports,
        exports,
        is_stripped: false,
    })
}

fn symbol_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?-u)[A-Za-z0-9_]+").expect("static regex"))
}

fn looks_like_export_section(name: &str) -> bool {
    name == ".edata" || name.contains("export")
}

/// Heuristic export recovery.
///
/// Does not decode the export directory: it pattern-matches identifier-shaped ASCII runs
/// inside sections named like an export table. Expect false positives (DLL name, padding
/// words) and misses when exports live in `.rdata`. `ExportStrategy::ExportDirectory` is
/// the structured alternative.
fn scan_export_sections(image: &PE, bytes: &[u8]) -> Vec<String> {
    let mut found = Vec::new();
    for sec in &image.sections {
        let name = sec.name().unwrap_or_default();
        if !looks_like_export_section(name) {
            continue;
        }
        let data = file_slice(bytes, sec.pointer_to_raw_data as u64, sec.size_of_raw_data as u64);
        for m in symbol_run().find_iter(data) {
            let run = m.as_bytes();
            if run.len() > 3 && run[0] != b'_' {
                found.push(String::from_utf8_lossy(run).into_owned());
            }
        }
    }
    found
}

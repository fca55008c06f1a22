use goblin::mach::{self, Mach, MachO};

use super::{lookup_arch, FormatParseError, ParsedContainer};
use crate::model::{FormatTag, Section};

const MACHO_ARCHES: &[(u32, &str)] = &[
    (mach::cputype::CPU_TYPE_X86, "x86"),
    (mach::cputype::CPU_TYPE_X86_64, "x86_64"),
    (mach::cputype::CPU_TYPE_ARM, "ARM"),
    (mach::cputype::CPU_TYPE_ARM64, "ARM64"),
];

/// Map a Mach-O `cputype` to an architecture name.
pub fn architecture(cputype: u32) -> String {
    lookup_arch(MACHO_ARCHES, cputype)
}

/// Decode a thin Mach-O image.
pub fn parse(bytes: &[u8]) -> Result<ParsedContainer, FormatParseError> {
    let image = match Mach::parse(bytes)? {
        Mach::Binary(image) => image,
        Mach::Fat(_) => {
            return Err(FormatParseError::Unsupported("universal (fat) Mach-O".into()));
        }
    };

    // Section and symbol counts come from the header; stop at the first entry that cannot
    // be read so a forged count does not walk billions of out-of-range records.
    let sections = image
        .segments
        .sections()
        .flat_map(|segment| segment.map_while(Result::ok))
        .map(|(sec, _)| {
            Section::new(
                FormatTag::MachO,
                sec.name().unwrap_or(""),
                sec.addr,
                sec.size,
                sec.offset as u64,
                sec.flags as u64,
            )
        })
        .collect();

    Ok(ParsedContainer {
        arch: architecture(image.header.cputype()),
        sections,
        imports: imported_symbols(&image),
        exports: Vec::new(),
        is_stripped: false,
    })
}

/// Imports from dyld bind info; object files and old images without it fall back to the
/// undefined external symbols of the symbol table.
fn imported_symbols(image: &MachO) -> Vec<String> {
    let bound: Vec<String> = image
        .imports()
        .map(|imports| imports.iter().map(|imp| imp.name.to_string()).collect())
        .unwrap_or_default();
    if !bound.is_empty() {
        return bound;
    }

    image
        .symbols()
        .map_while(Result::ok)
        .filter(|(name, nlist)| {
            !name.is_empty() && nlist.is_undefined() && nlist.n_type & mach::symbols::N_EXT != 0
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

use goblin::elf::{self, Elf};

use super::{lookup_arch, FormatParseError, ParsedContainer};
use crate::model::{FormatTag, Section};

const ELF_ARCHES: &[(u32, &str)] = &[
    (elf::header::EM_386 as u32, "x86"),
    (elf::header::EM_X86_64 as u32, "x86_64"),
    (elf::header::EM_ARM as u32, "ARM"),
    (elf::header::EM_AARCH64 as u32, "ARM64"),
];

/// Map an `e_machine` value to an architecture name.
pub fn architecture(machine: u16) -> String {
    lookup_arch(ELF_ARCHES, machine as u32)
}

/// Decode an ELF image.
///
/// Imports are the global function symbols of the dynamic symbol table. The binary counts
/// as stripped when its static symbol table has no entries besides the reserved null symbol.
pub fn parse(bytes: &[u8]) -> Result<ParsedContainer, FormatParseError> {
    let image = Elf::parse(bytes)?;

    let sections = image
        .section_headers
        .iter()
        .map(|sh| {
            Section::new(
                FormatTag::Elf,
                image.shdr_strtab.get_at(sh.sh_name).unwrap_or(""),
                sh.sh_addr,
                sh.sh_size,
                sh.sh_offset,
                sh.sh_flags,
            )
        })
        .collect();

    let imports = image
        .dynsyms
        .iter()
        .filter(|sym| sym.st_bind() == elf::sym::STB_GLOBAL && sym.st_type() == elf::sym::STT_FUNC)
        .filter_map(|sym| image.dynstrtab.get_at(sym.st_name))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    Ok(ParsedContainer {
        arch: architecture(image.header.e_machine),
        sections,
        imports,
        exports: Vec::new(),
        is_stripped: image.syms.len() <= 1,
    })
}

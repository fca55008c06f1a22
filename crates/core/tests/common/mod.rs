#![allow(dead_code)]

use std::path::{Path, PathBuf};

use binsight_core::analysis::strings::StringExtractor;
use binsight_core::analysis::Inspector;
use object::write::{Mangling, Object, StandardSection, Symbol, SymbolSection};
use object::{Architecture, BinaryFormat, Endianness, SymbolFlags, SymbolKind, SymbolScope};

/// Inspector that never shells out.
pub fn builtin_inspector() -> Inspector {
    Inspector::new().with_strings(StringExtractor::builtin())
}

pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut [u8], at: usize, v: u64) {
    buf[at..at + 8].copy_from_slice(&v.to_le_bytes());
}

/// Bytes placed in the `.edata` section of `minimal_pe`.
pub const PE_EDATA: &[u8] = b"fixture.dll\0add_numbers\0_hidden\0abc\0";

/// Minimal PE image: no optional header, a `.text` and an `.edata` section.
pub fn minimal_pe(machine: u16) -> Vec<u8> {
    const PE_OFFSET: usize = 0x80;
    const SECTIONS: usize = PE_OFFSET + 4 + 20;
    let mut buf = vec![0u8; 0x250];

    buf[0..2].copy_from_slice(b"MZ");
    put_u32(&mut buf, 0x3c, PE_OFFSET as u32);
    buf[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");

    let coff = PE_OFFSET + 4;
    put_u16(&mut buf, coff, machine);
    put_u16(&mut buf, coff + 2, 2); // number of sections
    put_u16(&mut buf, coff + 16, 0); // size of optional header
    put_u16(&mut buf, coff + 18, 0x2022);

    let mut section = |index: usize, name: &[u8], va: u32, raw: u32, ptr: u32, flags: u32| {
        let at = SECTIONS + index * 40;
        buf[at..at + name.len()].copy_from_slice(name);
        put_u32(&mut buf, at + 8, raw); // virtual size
        put_u32(&mut buf, at + 12, va);
        put_u32(&mut buf, at + 16, raw);
        put_u32(&mut buf, at + 20, ptr);
        put_u32(&mut buf, at + 36, flags);
    };
    section(0, b".text", 0x1000, 0x10, 0x200, 0x6000_0020);
    section(1, b".edata", 0x2000, 0x40, 0x210, 0x4000_0040);

    buf[0x200] = 0xC3;
    buf[0x210..0x210 + PE_EDATA.len()].copy_from_slice(PE_EDATA);
    buf
}

/// Relocatable ELF with `.text`/`.rodata`, optionally carrying one global function symbol.
pub fn elf_object(arch: Architecture, with_symbol: bool) -> Vec<u8> {
    let mut obj = Object::new(BinaryFormat::Elf, arch, Endianness::Little);
    let text = obj.section_id(StandardSection::Text);
    obj.append_section_data(text, &[0xC3], 1);
    let rodata = obj.section_id(StandardSection::ReadOnlyData);
    obj.append_section_data(rodata, b"greeting text\0", 1);

    if with_symbol {
        obj.add_symbol(Symbol {
            name: b"entry_fn".to_vec(),
            value: 0,
            size: 1,
            kind: SymbolKind::Text,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Section(text),
            flags: SymbolFlags::None,
        });
    }
    obj.write().unwrap()
}

/// Mach-O object with a `__text` section and one undefined external (`_puts`).
pub fn macho_object(arch: Architecture) -> Vec<u8> {
    let mut obj = Object::new(BinaryFormat::MachO, arch, Endianness::Little);
    obj.set_mangling(Mangling::None);
    let text = obj.section_id(StandardSection::Text);
    obj.append_section_data(text, &[0xC3], 1);
    obj.add_symbol(Symbol {
        name: b"_main".to_vec(),
        value: 0,
        size: 0,
        kind: SymbolKind::Text,
        scope: SymbolScope::Linkage,
        weak: false,
        section: SymbolSection::Section(text),
        flags: SymbolFlags::None,
    });
    obj.add_symbol(Symbol {
        name: b"_puts".to_vec(),
        value: 0,
        size: 0,
        kind: SymbolKind::Text,
        scope: SymbolScope::Dynamic,
        weak: false,
        section: SymbolSection::Undefined,
        flags: SymbolFlags::None,
    });
    obj.write().unwrap()
}

/// PE32+ DLL whose `.rdata` carries a real export directory (`exported_fn`) and an import
/// descriptor for `kernel32.dll!VirtualAlloc`.
pub fn pe_with_directories() -> Vec<u8> {
    const PE_OFFSET: usize = 0x80;
    const OPT: usize = PE_OFFSET + 4 + 20;
    const SECTIONS: usize = OPT + 0xF0;
    const RDATA_RVA: u32 = 0x2000;
    const RDATA_PTR: usize = 0x400;
    let mut buf = vec![0u8; 0x600];
    // File offset of an RVA inside `.rdata`.
    let at = |rva: u32| RDATA_PTR + (rva - RDATA_RVA) as usize;

    buf[0..2].copy_from_slice(b"MZ");
    put_u32(&mut buf, 0x3c, PE_OFFSET as u32);
    buf[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");

    let coff = PE_OFFSET + 4;
    put_u16(&mut buf, coff, 0x8664);
    put_u16(&mut buf, coff + 2, 2);
    put_u16(&mut buf, coff + 16, 0xF0);
    put_u16(&mut buf, coff + 18, 0x2022);

    put_u16(&mut buf, OPT, 0x20b); // PE32+
    put_u32(&mut buf, OPT + 16, 0x1000); // entry point
    put_u32(&mut buf, OPT + 20, 0x1000); // base of code
    put_u64(&mut buf, OPT + 24, 0x1_8000_0000); // image base
    put_u32(&mut buf, OPT + 32, 0x1000); // section alignment
    put_u32(&mut buf, OPT + 36, 0x200); // file alignment
    put_u32(&mut buf, OPT + 56, 0x3000); // size of image
    put_u32(&mut buf, OPT + 60, 0x200); // size of headers
    put_u16(&mut buf, OPT + 68, 2); // subsystem
    put_u32(&mut buf, OPT + 108, 16); // data directory count
    put_u32(&mut buf, OPT + 112, 0x2000); // export table
    put_u32(&mut buf, OPT + 116, 0x60);
    put_u32(&mut buf, OPT + 120, 0x2100); // import table
    put_u32(&mut buf, OPT + 124, 0x28);

    let mut section = |index: usize, name: &[u8], va: u32, ptr: u32, flags: u32| {
        let at = SECTIONS + index * 40;
        buf[at..at + name.len()].copy_from_slice(name);
        put_u32(&mut buf, at + 8, 0x200);
        put_u32(&mut buf, at + 12, va);
        put_u32(&mut buf, at + 16, 0x200);
        put_u32(&mut buf, at + 20, ptr);
        put_u32(&mut buf, at + 36, flags);
    };
    section(0, b".text", 0x1000, 0x200, 0x6000_0020);
    section(1, b".rdata", RDATA_RVA, RDATA_PTR as u32, 0x4000_0040);
    buf[0x200] = 0xC3;

    // Export directory: one function, exported by name.
    let exports = at(0x2000);
    put_u32(&mut buf, exports + 12, 0x2040); // DLL name
    put_u32(&mut buf, exports + 16, 1); // ordinal base
    put_u32(&mut buf, exports + 20, 1); // address table entries
    put_u32(&mut buf, exports + 24, 1); // name pointers
    put_u32(&mut buf, exports + 28, 0x2028);
    put_u32(&mut buf, exports + 32, 0x202C);
    put_u32(&mut buf, exports + 36, 0x2030);
    put_u32(&mut buf, at(0x2028), 0x1000);
    put_u32(&mut buf, at(0x202C), 0x2050);
    put_u16(&mut buf, at(0x2030), 0);
    buf[at(0x2040)..at(0x2040) + 12].copy_from_slice(b"fixture.dll\0");
    buf[at(0x2050)..at(0x2050) + 12].copy_from_slice(b"exported_fn\0");

    // Import descriptor followed by the null terminator descriptor.
    let imports = at(0x2100);
    put_u32(&mut buf, imports, 0x2140); // lookup table
    put_u32(&mut buf, imports + 12, 0x2180); // DLL name
    put_u32(&mut buf, imports + 16, 0x2160); // address table
    put_u64(&mut buf, at(0x2140), 0x2190);
    put_u64(&mut buf, at(0x2160), 0x2190);
    buf[at(0x2180)..at(0x2180) + 13].copy_from_slice(b"kernel32.dll\0");
    buf[at(0x2192)..at(0x2192) + 13].copy_from_slice(b"VirtualAlloc\0");
    buf
}

/// ELF64 shared object without section headers whose dynamic symbol table holds a global
/// function (`puts`), a global object (`environ_copy`) and a local function (`local_fn`).
pub fn elf_shared_object() -> Vec<u8> {
    const HASH: usize = 0xB0;
    const DYNAMIC: usize = 0x100;
    const SYMTAB: usize = 0x160;
    const STRTAB: usize = 0x1C0;
    const STRINGS: &[u8] = b"\0puts\0environ_copy\0local_fn\0";
    let mut buf = vec![0u8; 0x200];

    buf[0..4].copy_from_slice(b"\x7fELF");
    buf[4] = 2; // 64-bit
    buf[5] = 1; // little endian
    buf[6] = 1;
    put_u16(&mut buf, 16, 3); // ET_DYN
    put_u16(&mut buf, 18, 62); // EM_X86_64
    put_u32(&mut buf, 20, 1);
    put_u64(&mut buf, 32, 0x40); // e_phoff
    put_u16(&mut buf, 52, 64); // e_ehsize
    put_u16(&mut buf, 54, 56); // e_phentsize
    put_u16(&mut buf, 56, 2); // e_phnum

    // PT_LOAD mapping the whole file at address zero, then PT_DYNAMIC.
    let mut program = |index: usize, kind: u32, offset: u64, size: u64| {
        let at = 0x40 + index * 56;
        put_u32(&mut buf, at, kind);
        put_u32(&mut buf, at + 4, 4);
        put_u64(&mut buf, at + 8, offset);
        put_u64(&mut buf, at + 16, offset);
        put_u64(&mut buf, at + 24, offset);
        put_u64(&mut buf, at + 32, size);
        put_u64(&mut buf, at + 40, size);
        put_u64(&mut buf, at + 48, 8);
    };
    program(0, 1, 0, 0x200);
    program(1, 2, DYNAMIC as u64, 0x60);

    // SysV hash table: one bucket, four chain entries (one per symbol).
    put_u32(&mut buf, HASH, 1);
    put_u32(&mut buf, HASH + 4, 4);

    let entries: [(u64, u64); 6] = [
        (4, HASH as u64),           // DT_HASH
        (5, STRTAB as u64),         // DT_STRTAB
        (6, SYMTAB as u64),         // DT_SYMTAB
        (10, STRINGS.len() as u64), // DT_STRSZ
        (11, 24),                   // DT_SYMENT
        (0, 0),                     // DT_NULL
    ];
    for (i, (tag, value)) in entries.iter().enumerate() {
        put_u64(&mut buf, DYNAMIC + i * 16, *tag);
        put_u64(&mut buf, DYNAMIC + i * 16 + 8, *value);
    }

    // Symbol 0 is the reserved null symbol.
    let symbols: [(u32, u8); 3] = [(1, 0x12), (6, 0x11), (19, 0x02)];
    for (i, (name, info)) in symbols.iter().enumerate() {
        let at = SYMTAB + (i + 1) * 24;
        put_u32(&mut buf, at, *name);
        buf[at + 4] = *info;
    }
    buf[STRTAB..STRTAB + STRINGS.len()].copy_from_slice(STRINGS);
    buf
}

/// `macho_object` with the section count of its first segment command forged to a huge value.
pub fn macho_with_forged_section_count(arch: Architecture) -> Vec<u8> {
    const LC_SEGMENT_64: u32 = 0x19;
    let mut bytes = macho_object(arch);
    let read_u32 = |b: &[u8], at: usize| u32::from_le_bytes(b[at..at + 4].try_into().unwrap());

    let ncmds = read_u32(&bytes, 16) as usize;
    let mut at = 32;
    for _ in 0..ncmds {
        if read_u32(&bytes, at) == LC_SEGMENT_64 {
            put_u32(&mut bytes, at + 64, 0x7600_0001);
            return bytes;
        }
        at += read_u32(&bytes, at + 4) as usize;
    }
    panic!("no LC_SEGMENT_64 in fixture");
}

//! Header-magic classification.
//!
//! `identify` only looks at the first bytes of a file and returns the *candidate* format.
//! Confirmation is the parser's job; the inspector downgrades to `Unknown` when the
//! structural parse fails.

use crate::model::FormatTag;

/// Number of header bytes the sniffer looks at.
pub const HEADER_LEN: usize = 16;

const MZ_MAGIC: [u8; 2] = [0x4D, 0x5A];
const ELF_MAGIC: [u8; 4] = [0x7F, 0x45, 0x4C, 0x46];
const MACHO_MAGICS: [[u8; 4]; 4] = [
    [0xFE, 0xED, 0xFA, 0xCE],
    [0xCE, 0xFA, 0xED, 0xFE],
    [0xFE, 0xED, 0xFA, 0xCF],
    [0xCF, 0xFA, 0xED, 0xFE],
];

/// Classify a header by magic bytes. First match wins: MZ, then ELF, then Mach-O.
///
/// Pure: inputs shorter than a magic simply fail to match it.
pub fn identify(header: &[u8]) -> FormatTag {
    let header = &header[..header.len().min(HEADER_LEN)];
    if header.starts_with(&MZ_MAGIC) {
        FormatTag::Pe
    } else if header.starts_with(&ELF_MAGIC) {
        FormatTag::Elf
    } else if MACHO_MAGICS.iter().any(|magic| header.starts_with(magic)) {
        FormatTag::MachO
    } else {
        FormatTag::Unknown
    }
}

/// Copy the leading bytes of a buffer into a fixed header, zero-padded.
pub fn header_of(bytes: &[u8]) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    let n = bytes.len().min(HEADER_LEN);
    header[..n].copy_from_slice(&bytes[..n]);
    header
}

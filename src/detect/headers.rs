//! Byte-exact structured header parsers: ELF, U-Boot uImage, device
//! tree blobs and TRX containers.
//!
//! Every parser length-checks before any field access and answers
//! `None` for anything truncated or malformed; hostile input must never
//! be able to read past a buffer.

use crate::core::binary::{Arch, Endianness};
use crate::core::report::{TrxHeader, UImageHeader};
use crate::detect::text;

pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];
/// Minimum prefix needed to reach the e_machine field.
pub const ELF_IDENT_LEN: usize = 20;

pub const UIMAGE_MAGIC: u32 = 0x2705_1956;
pub const UIMAGE_HEADER_LEN: usize = 64;

pub const DTB_MAGIC_BE: [u8; 4] = [0xd0, 0x0d, 0xfe, 0xed];
pub const DTB_MAGIC_SWAPPED: [u8; 4] = [0xed, 0xfe, 0x0d, 0xd0];

pub const TRX_HEADER_LEN: usize = 32;

/// Identity fields lifted from an ELF header prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfIdent {
    pub endianness: Endianness,
    pub machine: u16,
    pub arch: Arch,
}

/// ELF machine-type values to architecture.
pub fn elf_machine_to_arch(machine: u16) -> Arch {
    match machine {
        0x03 => Arch::X86,
        0x3E => Arch::X86_64,
        0x28 => Arch::ARM,
        0xB7 => Arch::AArch64,
        0x08 => Arch::MIPS,
        0x14 => Arch::PPC,
        0x15 => Arch::PPC64,
        0xF3 => Arch::RISCV,
        _ => Arch::Unknown,
    }
}

/// Parse the identity prefix of an ELF header.
///
/// The e_machine field is decoded in the byte order the file itself
/// declares in EI_DATA. Buffers shorter than 20 bytes are rejected
/// before any field access.
pub fn parse_elf_ident(data: &[u8]) -> Option<ElfIdent> {
    if data.len() < ELF_IDENT_LEN || data[0..4] != ELF_MAGIC {
        return None;
    }
    let endianness = match data[5] {
        1 => Endianness::Little,
        2 => Endianness::Big,
        _ => return None,
    };
    let machine = match endianness {
        Endianness::Little => u16::from_le_bytes([data[18], data[19]]),
        Endianness::Big => u16::from_be_bytes([data[18], data[19]]),
    };
    Some(ElfIdent {
        endianness,
        machine,
        arch: elf_machine_to_arch(machine),
    })
}

/// uImage architecture codes to architecture.
pub fn uimage_arch_to_arch(code: u8) -> Arch {
    match code {
        2 => Arch::ARM,
        4 => Arch::MIPS,
        5 => Arch::PPC,
        22 => Arch::AArch64,
        _ => Arch::Unknown,
    }
}

/// Parse a 64-byte U-Boot legacy uImage header re-read at the magic's
/// offset. Accepts the magic in either byte order; rejects anything
/// shorter than the fixed header size.
pub fn parse_uimage_header(header: &[u8]) -> Option<UImageHeader> {
    if header.len() < UIMAGE_HEADER_LEN {
        return None;
    }
    let magic = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if magic != UIMAGE_MAGIC && magic.swap_bytes() != UIMAGE_MAGIC {
        return None;
    }
    let arch_code = header[7];
    let name_raw = &header[32..UIMAGE_HEADER_LEN];
    let name = text::decode_lossy(name_raw)
        .trim_end_matches('\0')
        .trim_end_matches('\u{FFFD}')
        .to_string();
    Some(UImageHeader {
        arch_code,
        arch: uimage_arch_to_arch(arch_code),
        name,
    })
}

/// Does this buffer start with a device-tree-blob magic (either form)?
pub fn is_dtb_magic(data: &[u8]) -> bool {
    data.len() >= 4 && (data[0..4] == DTB_MAGIC_BE || data[0..4] == DTB_MAGIC_SWAPPED)
}

/// Map lower-cased device-tree compatible text to an architecture.
///
/// Heuristic substring matching over a lossy text rendering of the
/// blob; an `arm64`/`aarch64` hint upgrades an ARM Cortex hit.
pub fn dtb_compatible_arch(lowercased: &str) -> Option<Arch> {
    if lowercased.contains("arm,cortex") {
        if lowercased.contains("arm64") || lowercased.contains("aarch64") {
            Some(Arch::AArch64)
        } else {
            Some(Arch::ARM)
        }
    } else if lowercased.contains("mips") {
        Some(Arch::MIPS)
    } else if lowercased.contains("powerpc") || lowercased.contains("ppc") {
        Some(Arch::PPC)
    } else if lowercased.contains("x86") || lowercased.contains("intel") {
        Some(Arch::X86)
    } else {
        None
    }
}

/// Parse a TRX container header: eight little-endian 32-bit words
/// starting at the magic. Fewer than 32 bytes means "not TRX".
pub fn parse_trx_header(data: &[u8]) -> Option<TrxHeader> {
    if data.len() < TRX_HEADER_LEN {
        return None;
    }
    if &data[0..4] != b"HDR0" && &data[0..4] != b"HDR1" {
        return None;
    }
    let word = |i: usize| {
        u32::from_le_bytes([data[i * 4], data[i * 4 + 1], data[i * 4 + 2], data[i * 4 + 3]])
    };
    Some(TrxHeader {
        total_len: word(1),
        crc32: word(2),
        flags_version: word(3),
        offsets: word(4),
        kernel_len: word(5),
        rootfs_len: word(6),
        rootfs_initrd_len: word(7),
    })
}

impl TrxHeader {
    /// Serialize back to the 32-byte on-disk form (magic `HDR0`).
    pub fn to_bytes(&self) -> [u8; TRX_HEADER_LEN] {
        let mut out = [0u8; TRX_HEADER_LEN];
        out[0..4].copy_from_slice(b"HDR0");
        for (i, v) in [
            self.total_len,
            self.crc32,
            self.flags_version,
            self.offsets,
            self.kernel_len,
            self.rootfs_len,
            self.rootfs_initrd_len,
        ]
        .iter()
        .enumerate()
        {
            out[(i + 1) * 4..(i + 2) * 4].copy_from_slice(&v.to_le_bytes());
        }
        out
    }
}

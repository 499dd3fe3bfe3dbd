//! Static magic-signature catalogs.
//!
//! Maps fixed byte patterns to semantic labels for filesystems,
//! containers, compression streams, bootloaders and kernel images.
//! Patterns are compared as exact byte subsequences; several patterns
//! may share one label (byte-order and variant forms). Catalogs are
//! process-wide constants.

use crate::core::report::{BootloaderKind, CompressionKind, ContainerKind, FilesystemKind};
use crate::detect::scanner::SignatureScanner;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// An immutable `(pattern, label)` pair.
#[derive(Debug, Clone, Copy)]
pub struct Signature<L> {
    pub pattern: &'static [u8],
    pub label: L,
}

/// Kernel-image magic labels used by the architecture cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelMagic {
    /// ARM zImage trailer magic 0x016f2818.
    ZImageArm,
    /// arm64 Image header magic "ARM\x64".
    ImageArm64,
    /// U-Boot legacy uImage magic 0x27051956, either byte order.
    UImage,
}

/// Literal byte-order strings surfaced by a text pass over the blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndianMarker {
    Little,
    Big,
}

/// Device-tree-blob magic, either stored byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DtbMarker {
    Header,
}

/// Raw ELF magic, scanned for directly by the fallback stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElfMarker {
    Header,
}

pub const FILESYSTEM_SIGNATURES: &[Signature<FilesystemKind>] = &[
    Signature { pattern: b"hsqs", label: FilesystemKind::SquashFs },
    Signature { pattern: b"sqsh", label: FilesystemKind::SquashFs },
    Signature { pattern: b"\x85\x19\x03\x20", label: FilesystemKind::Jffs2 },
    Signature { pattern: b"\x19\x85\x20\x03", label: FilesystemKind::Jffs2 },
    Signature { pattern: b"\x53\xef", label: FilesystemKind::Ext },
    Signature { pattern: b"Compressed ROMFS", label: FilesystemKind::CramFs },
    Signature { pattern: b"\x45\x3d\xcd\x28", label: FilesystemKind::CramFs },
    Signature { pattern: b"UBI#", label: FilesystemKind::Ubifs },
    Signature { pattern: b"\x31\x18\x10\x06", label: FilesystemKind::Ubifs },
];

pub const CONTAINER_SIGNATURES: &[Signature<ContainerKind>] = &[
    Signature { pattern: b"HDR0", label: ContainerKind::Trx },
    Signature { pattern: b"HDR1", label: ContainerKind::Trx },
    Signature { pattern: b"\x27\x05\x19\x56", label: ContainerKind::UImage },
    Signature { pattern: b"\x56\x19\x05\x27", label: ContainerKind::UImage },
];

pub const COMPRESSION_SIGNATURES: &[Signature<CompressionKind>] = &[
    Signature { pattern: b"\x1f\x8b\x08", label: CompressionKind::Gzip },
    Signature { pattern: b"\xfd7zXZ\x00", label: CompressionKind::Xz },
    Signature { pattern: b"\x5d\x00\x00\x80", label: CompressionKind::Lzma },
    Signature { pattern: b"BZh", label: CompressionKind::Bzip2 },
    Signature { pattern: b"\x04\x22\x4d\x18", label: CompressionKind::Lz4 },
    Signature { pattern: b"\x28\xb5\x2f\xfd", label: CompressionKind::Zstd },
];

pub const BOOTLOADER_SIGNATURES: &[Signature<BootloaderKind>] = &[
    Signature { pattern: b"U-Boot", label: BootloaderKind::UBoot },
    Signature { pattern: b"CFE1", label: BootloaderKind::Cfe },
    Signature { pattern: b"RedBoot", label: BootloaderKind::RedBoot },
];

pub const KERNEL_SIGNATURES: &[Signature<KernelMagic>] = &[
    Signature { pattern: b"\x18\x28\x6f\x01", label: KernelMagic::ZImageArm },
    Signature { pattern: b"\x01\x6f\x28\x18", label: KernelMagic::ZImageArm },
    Signature { pattern: b"ARM\x64", label: KernelMagic::ImageArm64 },
    Signature { pattern: b"\x27\x05\x19\x56", label: KernelMagic::UImage },
    Signature { pattern: b"\x56\x19\x05\x27", label: KernelMagic::UImage },
];

pub const ENDIAN_MARKER_SIGNATURES: &[Signature<EndianMarker>] = &[
    Signature { pattern: b"little-endian", label: EndianMarker::Little },
    Signature { pattern: b"big-endian", label: EndianMarker::Big },
];

pub const ELF_SIGNATURES: &[Signature<ElfMarker>] = &[Signature {
    pattern: b"\x7fELF",
    label: ElfMarker::Header,
}];

pub const DTB_SIGNATURES: &[Signature<DtbMarker>] = &[
    Signature { pattern: b"\xd0\x0d\xfe\xed", label: DtbMarker::Header },
    Signature { pattern: b"\xed\xfe\x0d\xd0", label: DtbMarker::Header },
];

pub fn filesystem_scanner() -> &'static SignatureScanner<FilesystemKind> {
    static SCANNER: Lazy<SignatureScanner<FilesystemKind>> =
        Lazy::new(|| SignatureScanner::new(FILESYSTEM_SIGNATURES));
    &SCANNER
}

pub fn container_scanner() -> &'static SignatureScanner<ContainerKind> {
    static SCANNER: Lazy<SignatureScanner<ContainerKind>> =
        Lazy::new(|| SignatureScanner::new(CONTAINER_SIGNATURES));
    &SCANNER
}

pub fn compression_scanner() -> &'static SignatureScanner<CompressionKind> {
    static SCANNER: Lazy<SignatureScanner<CompressionKind>> =
        Lazy::new(|| SignatureScanner::new(COMPRESSION_SIGNATURES));
    &SCANNER
}

pub fn bootloader_scanner() -> &'static SignatureScanner<BootloaderKind> {
    static SCANNER: Lazy<SignatureScanner<BootloaderKind>> =
        Lazy::new(|| SignatureScanner::new(BOOTLOADER_SIGNATURES));
    &SCANNER
}

pub fn kernel_scanner() -> &'static SignatureScanner<KernelMagic> {
    static SCANNER: Lazy<SignatureScanner<KernelMagic>> =
        Lazy::new(|| SignatureScanner::new(KERNEL_SIGNATURES));
    &SCANNER
}

pub fn endian_marker_scanner() -> &'static SignatureScanner<EndianMarker> {
    static SCANNER: Lazy<SignatureScanner<EndianMarker>> =
        Lazy::new(|| SignatureScanner::new(ENDIAN_MARKER_SIGNATURES));
    &SCANNER
}

pub fn elf_scanner() -> &'static SignatureScanner<ElfMarker> {
    static SCANNER: Lazy<SignatureScanner<ElfMarker>> =
        Lazy::new(|| SignatureScanner::new(ELF_SIGNATURES));
    &SCANNER
}

pub fn dtb_scanner() -> &'static SignatureScanner<DtbMarker> {
    static SCANNER: Lazy<SignatureScanner<DtbMarker>> =
        Lazy::new(|| SignatureScanner::new(DTB_SIGNATURES));
    &SCANNER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_are_nonempty_and_shared_labels_allowed() {
        assert!(FILESYSTEM_SIGNATURES.len() >= 5);
        let squashfs_variants = FILESYSTEM_SIGNATURES
            .iter()
            .filter(|s| s.label == FilesystemKind::SquashFs)
            .count();
        assert_eq!(squashfs_variants, 2);
    }

    #[test]
    fn scanners_build_from_static_catalogs() {
        let _ = filesystem_scanner();
        let _ = container_scanner();
        let _ = compression_scanner();
        let _ = bootloader_scanner();
        let _ = kernel_scanner();
        let _ = endian_marker_scanner();
        let _ = elf_scanner();
    }
}

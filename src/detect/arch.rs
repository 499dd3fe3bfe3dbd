//! Architecture detection cascade.
//!
//! A strict ordered pipeline: each stage runs only if the previous one
//! produced nothing, and the first stage with a finding ends the run.
//! Kernel, device-tree and uImage headers are far more reliable
//! indicators of the primary target than an arbitrary ELF found
//! somewhere in the blob (which may be a cross-compiled utility for a
//! different sub-target), so they come first and the raw ELF sweep is
//! the demoted fallback. First match wins even when later stages would
//! disagree; no conflict-resolution policy is applied.

use crate::core::binary::{Arch, Confidence};
use crate::core::report::{ArchFinding, CarverReport};
use crate::detect::config::ScanConfig;
use crate::detect::headers::{
    self, ELF_IDENT_LEN, UIMAGE_HEADER_LEN,
};
use crate::detect::io::ByteSource;
use crate::detect::scanner::ScanMode;
use crate::detect::signatures::{
    dtb_scanner, elf_scanner, kernel_scanner, KernelMagic,
};
use crate::detect::text;
use crate::detect::tree::{self, KERNEL_IMAGE_NAMES, KNOWN_BINARY_NAMES};
use std::path::Path;
use tracing::{debug, info};

fn finding(arch: Arch, confidence: Confidence, method: &str) -> ArchFinding {
    ArchFinding {
        arch,
        confidence,
        method: method.to_string(),
    }
}

/// Run the cascade over `src`, optionally enriched by an extracted
/// filesystem tree and the external carver's report.
pub fn detect_architecture(
    src: &ByteSource,
    cfg: &ScanConfig,
    extracted_tree: Option<&Path>,
    carver: Option<&CarverReport>,
) -> ArchFinding {
    let stages: [(&str, &dyn Fn() -> Option<ArchFinding>); 5] = [
        ("kernel_magic", &|| stage_kernel_magic(src, cfg)),
        ("dtb", &|| stage_dtb(src, cfg)),
        ("uimage", &|| stage_uimage(src, cfg)),
        ("known_binaries", &|| {
            stage_known_binaries(src, extracted_tree, carver)
        }),
        ("elf_scan", &|| stage_elf_scan(src, cfg)),
    ];

    for (name, stage) in stages {
        if let Some(found) = stage() {
            info!(
                "architecture stage '{}' concluded {} ({}, {})",
                name, found.arch, found.confidence, found.method
            );
            return found;
        }
        debug!("architecture stage '{}' produced nothing", name);
    }
    ArchFinding::unknown()
}

/// Stage 1: kernel-image magic scan (zImage / arm64 Image / uImage).
fn stage_kernel_magic(src: &ByteSource, cfg: &ScanConfig) -> Option<ArchFinding> {
    let hits = kernel_scanner().scan(src, cfg.kernel_scan_limit, ScanMode::All);
    for hit in hits {
        match hit.label {
            KernelMagic::ZImageArm => {
                return Some(finding(Arch::ARM, Confidence::High, "kernel_header_zImage"));
            }
            KernelMagic::ImageArm64 => {
                return Some(finding(
                    Arch::AArch64,
                    Confidence::High,
                    "kernel_header_Image_arm64",
                ));
            }
            KernelMagic::UImage => {
                let header = src.read_at(hit.offset, UIMAGE_HEADER_LEN);
                if let Some(parsed) = headers::parse_uimage_header(&header) {
                    if parsed.arch != Arch::Unknown {
                        return Some(finding(
                            parsed.arch,
                            Confidence::High,
                            "kernel_header_uImage",
                        ));
                    }
                }
            }
        }
    }
    None
}

/// Stage 2: device-tree compatible strings. Every magic occurrence is
/// tried in offset order; a stray magic with no readable compatible
/// strings must not mask a real DTB further in.
fn stage_dtb(src: &ByteSource, cfg: &ScanConfig) -> Option<ArchFinding> {
    for hit in dtb_scanner().scan(src, cfg.dtb_scan_limit, ScanMode::All) {
        let body = src.read_at(hit.offset, cfg.dtb_text_limit);
        let rendered = text::decode_lossy_lower(&body);
        if let Some(arch) = headers::dtb_compatible_arch(&rendered) {
            return Some(finding(arch, Confidence::High, "dtb_compatible"));
        }
    }
    None
}

/// Stage 3: U-Boot uImage architecture byte. Unlike stage 1, every
/// magic occurrence within the cap is tried, not just the first.
fn stage_uimage(src: &ByteSource, cfg: &ScanConfig) -> Option<ArchFinding> {
    let hits = kernel_scanner().scan(src, cfg.kernel_scan_limit, ScanMode::All);
    for hit in hits {
        if hit.label != KernelMagic::UImage {
            continue;
        }
        let header = src.read_at(hit.offset, UIMAGE_HEADER_LEN);
        if let Some(parsed) = headers::parse_uimage_header(&header) {
            if parsed.arch != Arch::Unknown {
                return Some(finding(
                    parsed.arch,
                    Confidence::High,
                    "uboot_uimage_header",
                ));
            }
        }
    }
    None
}

/// Stage 4: ELF headers of specifically-named binaries in an extracted
/// tree, then offsets the carver itself called ELF.
fn stage_known_binaries(
    src: &ByteSource,
    extracted_tree: Option<&Path>,
    carver: Option<&CarverReport>,
) -> Option<ArchFinding> {
    if let Some(root) = extracted_tree {
        for path in tree::find_named_files(root, KNOWN_BINARY_NAMES) {
            let prefix = tree::read_prefix(&path, ELF_IDENT_LEN);
            if let Some(ident) = headers::parse_elf_ident(&prefix) {
                if ident.arch != Arch::Unknown {
                    return Some(finding(ident.arch, Confidence::High, "known_binary_elf"));
                }
            }
        }
        for path in tree::find_named_files(root, KERNEL_IMAGE_NAMES) {
            let prefix = tree::read_prefix(&path, ELF_IDENT_LEN);
            if let Some(ident) = headers::parse_elf_ident(&prefix) {
                if ident.arch != Arch::Unknown {
                    return Some(finding(ident.arch, Confidence::High, "kernel_image_elf"));
                }
            }
        }
    }
    if let Some(report) = carver {
        for offset in report.elf_offsets() {
            let header = src.read_at(offset, ELF_IDENT_LEN);
            if let Some(ident) = headers::parse_elf_ident(&header) {
                if ident.arch != Arch::Unknown {
                    return Some(finding(ident.arch, Confidence::High, "carver_elf"));
                }
            }
        }
    }
    None
}

/// Stage 5 fallback: first raw ELF header in the blob prefix.
fn stage_elf_scan(src: &ByteSource, cfg: &ScanConfig) -> Option<ArchFinding> {
    for hit in elf_scanner().scan(src, cfg.elf_scan_limit, ScanMode::All) {
        let header = src.read_at(hit.offset, ELF_IDENT_LEN);
        if let Some(ident) = headers::parse_elf_ident(&header) {
            if ident.arch != Arch::Unknown {
                return Some(finding(ident.arch, Confidence::Medium, "elf_header_scan"));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::headers::{DTB_MAGIC_BE, ELF_MAGIC, UIMAGE_MAGIC};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source_with(data: &[u8]) -> (NamedTempFile, ByteSource) {
        let tmp = NamedTempFile::new().unwrap();
        tmp.as_file().write_all(data).unwrap();
        let src = ByteSource::open(tmp.path()).unwrap();
        (tmp, src)
    }

    fn put_uimage(data: &mut [u8], offset: usize, arch_code: u8) {
        data[offset..offset + 4].copy_from_slice(&UIMAGE_MAGIC.to_be_bytes());
        data[offset + 7] = arch_code;
    }

    fn put_elf(data: &mut [u8], offset: usize, ei_data: u8, machine: u16) {
        data[offset..offset + 4].copy_from_slice(&ELF_MAGIC);
        data[offset + 5] = ei_data;
        let m = if ei_data == 1 {
            machine.to_le_bytes()
        } else {
            machine.to_be_bytes()
        };
        data[offset + 18..offset + 20].copy_from_slice(&m);
    }

    #[test]
    fn uimage_beats_later_dtb() {
        // uImage header with the MIPS arch byte, then a DTB whose
        // compatible strings claim ARM: the cascade must short-circuit
        // on the uImage evidence.
        let mut data = vec![0u8; 16384];
        put_uimage(&mut data, 512, 4);
        data[8192..8196].copy_from_slice(&DTB_MAGIC_BE);
        data[8200..8213].copy_from_slice(b"arm,cortex-a9");
        let (_tmp, src) = source_with(&data);
        let found = detect_architecture(&src, &ScanConfig::default(), None, None);
        assert_eq!(found.arch, Arch::MIPS);
        assert_eq!(found.confidence, Confidence::High);
        assert_eq!(found.method, "kernel_header_uImage");
    }

    #[test]
    fn dtb_compatible_detects_arm() {
        let mut data = vec![0u8; 8192];
        data[1024..1028].copy_from_slice(&DTB_MAGIC_BE);
        data[1100..1113].copy_from_slice(b"arm,cortex-a7");
        let (_tmp, src) = source_with(&data);
        let found = detect_architecture(&src, &ScanConfig::default(), None, None);
        assert_eq!(found.arch, Arch::ARM);
        assert_eq!(found.method, "dtb_compatible");
    }

    #[test]
    fn stray_dtb_magic_does_not_mask_real_dtb() {
        // First magic has no compatible strings within its text window;
        // the genuine DTB further in must still be examined.
        let mut data = vec![0u8; 8192];
        data[0..4].copy_from_slice(&DTB_MAGIC_BE);
        data[1024..1028].copy_from_slice(&DTB_MAGIC_BE);
        data[1100..1113].copy_from_slice(b"arm,cortex-a9");
        let (_tmp, src) = source_with(&data);
        let cfg = ScanConfig {
            dtb_text_limit: 256,
            ..ScanConfig::default()
        };
        let found = detect_architecture(&src, &cfg, None, None);
        assert_eq!(found.arch, Arch::ARM);
        assert_eq!(found.method, "dtb_compatible");
    }

    #[test]
    fn dtb_arm64_hint_upgrades() {
        let mut data = vec![0u8; 8192];
        data[0..4].copy_from_slice(&DTB_MAGIC_BE);
        data[64..77].copy_from_slice(b"arm,cortex-a5");
        data[100..107].copy_from_slice(b"aarch64");
        let (_tmp, src) = source_with(&data);
        let found = detect_architecture(&src, &ScanConfig::default(), None, None);
        assert_eq!(found.arch, Arch::AArch64);
    }

    #[test]
    fn zimage_magic_means_arm() {
        let mut data = vec![0u8; 4096];
        data[36..40].copy_from_slice(b"\x18\x28\x6f\x01");
        let (_tmp, src) = source_with(&data);
        let found = detect_architecture(&src, &ScanConfig::default(), None, None);
        assert_eq!(found.arch, Arch::ARM);
        assert_eq!(found.method, "kernel_header_zImage");
    }

    #[test]
    fn elf_at_offset_zero_is_the_fallback() {
        let mut data = vec![0u8; 4096];
        put_elf(&mut data, 0, 1, 0x3E);
        let (_tmp, src) = source_with(&data);
        let found = detect_architecture(&src, &ScanConfig::default(), None, None);
        assert_eq!(found.arch, Arch::X86_64);
        assert!(found.confidence >= Confidence::Medium);
        assert_eq!(found.method, "elf_header_scan");
    }

    #[test]
    fn no_magic_anywhere_is_unknown_low() {
        let (_tmp, src) = source_with(&vec![0x42u8; 8192]);
        let found = detect_architecture(&src, &ScanConfig::default(), None, None);
        assert_eq!(found.arch, Arch::Unknown);
        assert_eq!(found.confidence, Confidence::Low);
        assert_eq!(found.method, "none");
    }

    #[test]
    fn extracted_busybox_outranks_raw_elf_scan() {
        // Raw blob holds a PPC ELF, the extracted tree a MIPS busybox;
        // the named binary wins because its stage runs first.
        let mut data = vec![0u8; 4096];
        put_elf(&mut data, 128, 2, 0x14);
        let (_tmp, src) = source_with(&data);

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let mut busybox = vec![0u8; 20];
        put_elf(&mut busybox, 0, 2, 0x08);
        std::fs::write(bin.join("busybox"), &busybox).unwrap();

        let found = detect_architecture(&src, &ScanConfig::default(), Some(dir.path()), None);
        assert_eq!(found.arch, Arch::MIPS);
        assert_eq!(found.method, "known_binary_elf");
        assert_eq!(found.confidence, Confidence::High);
    }

    #[test]
    fn carver_elf_offset_is_reinspected() {
        let mut data = vec![0u8; 8192];
        put_elf(&mut data, 4500, 1, 0x28);
        let (_tmp, src) = source_with(&data);
        let report = CarverReport {
            excerpt: Vec::new(),
            key_findings: Vec::new(),
            hits: vec![crate::core::report::CarverHit {
                offset: 4500,
                description: "ELF, 32-bit LSB executable".to_string(),
            }],
        };
        // Cap the raw ELF fallback out of the picture to prove the
        // carver path alone carries the finding.
        let cfg = ScanConfig {
            elf_scan_limit: 0,
            ..ScanConfig::default()
        };
        let found = detect_architecture(&src, &cfg, None, Some(&report));
        assert_eq!(found.arch, Arch::ARM);
        assert_eq!(found.method, "carver_elf");
    }
}

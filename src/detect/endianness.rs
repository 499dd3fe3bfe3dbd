//! Endianness resolution from direct and indirect evidence.
//!
//! Sources are tried in order of how directly they reflect the target's
//! byte order: ELF headers of named binaries in an extracted tree, ELF
//! headers found in the raw blob, literal "little-endian"/"big-endian"
//! strings, then ELF offsets reported by the carver. The first source
//! with any evidence decides; each ELF's declared EI_DATA goes into the
//! value set, so mixed-endian blobs report both orders. With no
//! evidence at all the architecture's conventional byte order stands in
//! at low confidence.

use crate::core::binary::{Arch, Confidence, Endianness};
use crate::core::report::{CarverReport, EndiannessFinding};
use crate::detect::config::ScanConfig;
use crate::detect::headers::{self, ELF_IDENT_LEN};
use crate::detect::io::ByteSource;
use crate::detect::scanner::ScanMode;
use crate::detect::signatures::{elf_scanner, endian_marker_scanner, EndianMarker};
use crate::detect::tree::{self, KNOWN_BINARY_NAMES};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

fn single(value: Endianness, confidence: Confidence, method: &str) -> EndiannessFinding {
    let mut values = BTreeSet::new();
    values.insert(value);
    EndiannessFinding {
        values,
        confidence,
        methods: vec![method.to_string()],
    }
}

fn from_set(values: BTreeSet<Endianness>, confidence: Confidence, method: &str) -> EndiannessFinding {
    EndiannessFinding {
        values,
        confidence,
        methods: vec![method.to_string()],
    }
}

/// Resolve the byte order of the firmware target.
///
/// `arch` is the architecture conclusion of the same run, consulted
/// only for the last-resort fallback.
pub fn resolve_endianness(
    src: &ByteSource,
    cfg: &ScanConfig,
    extracted_tree: Option<&Path>,
    carver: Option<&CarverReport>,
    arch: Arch,
) -> EndiannessFinding {
    let sources: [(&str, &dyn Fn() -> Option<EndiannessFinding>); 5] = [
        ("extracted_tree", &|| source_tree(extracted_tree)),
        ("elf_sweep", &|| source_elf_sweep(src, cfg)),
        ("elf_offset0", &|| source_elf_at_zero(src)),
        ("string_literal", &|| source_string_literals(src)),
        ("carver", &|| source_carver(src, carver)),
    ];

    for (name, source) in sources {
        if let Some(found) = source() {
            info!(
                "endianness source '{}' concluded {:?} ({})",
                name, found.values, found.confidence
            );
            return found;
        }
        debug!("endianness source '{}' produced nothing", name);
    }

    if let Some(implied) = arch.implied_endianness() {
        info!("no direct endianness evidence, falling back to {} default", arch);
        return single(implied, Confidence::Low, "arch_default");
    }
    EndiannessFinding::unknown()
}

/// ELF headers of known binary names inside an extracted tree.
fn source_tree(extracted_tree: Option<&Path>) -> Option<EndiannessFinding> {
    let root = extracted_tree?;
    let mut values = BTreeSet::new();
    for path in tree::find_named_files(root, KNOWN_BINARY_NAMES) {
        let prefix = tree::read_prefix(&path, ELF_IDENT_LEN);
        if let Some(ident) = headers::parse_elf_ident(&prefix) {
            values.insert(ident.endianness);
        }
    }
    if values.is_empty() {
        None
    } else {
        Some(from_set(values, Confidence::High, "extracted_tree_elf"))
    }
}

/// Every parseable ELF header in the blob prefix.
fn source_elf_sweep(src: &ByteSource, cfg: &ScanConfig) -> Option<EndiannessFinding> {
    let mut values = BTreeSet::new();
    for hit in elf_scanner().scan(src, cfg.endian_elf_scan_limit, ScanMode::All) {
        let header = src.read_at(hit.offset, ELF_IDENT_LEN);
        if let Some(ident) = headers::parse_elf_ident(&header) {
            values.insert(ident.endianness);
        }
    }
    if values.is_empty() {
        None
    } else {
        Some(from_set(values, Confidence::High, "elf_header_scan"))
    }
}

/// The blob itself starts with an ELF header.
fn source_elf_at_zero(src: &ByteSource) -> Option<EndiannessFinding> {
    let header = src.read_at(0, ELF_IDENT_LEN);
    let ident = headers::parse_elf_ident(&header)?;
    Some(single(ident.endianness, Confidence::High, "elf_header_offset0"))
}

/// Literal byte-order strings, anywhere in the file. Weaker evidence:
/// bootloader banners mention their own byte order, which usually but
/// not always matches the payload's.
fn source_string_literals(src: &ByteSource) -> Option<EndiannessFinding> {
    let mut values = BTreeSet::new();
    for hit in endian_marker_scanner().scan(src, src.len(), ScanMode::All) {
        values.insert(match hit.label {
            EndianMarker::Little => Endianness::Little,
            EndianMarker::Big => Endianness::Big,
        });
    }
    if values.is_empty() {
        None
    } else {
        Some(from_set(values, Confidence::Medium, "string_literal"))
    }
}

/// ELF offsets the carver reported, re-parsed from the blob.
fn source_carver(src: &ByteSource, carver: Option<&CarverReport>) -> Option<EndiannessFinding> {
    let report = carver?;
    let mut values = BTreeSet::new();
    for offset in report.elf_offsets() {
        let header = src.read_at(offset, ELF_IDENT_LEN);
        if let Some(ident) = headers::parse_elf_ident(&header) {
            values.insert(ident.endianness);
        }
    }
    if values.is_empty() {
        None
    } else {
        Some(from_set(values, Confidence::High, "carver_elf"))
    }
}

//! Finding and report types produced by the detection pipeline.
//!
//! Everything in here is a plain immutable value: `DetectionResult` is
//! assembled once per analysis and handed to the caller, which may
//! serialize it or feed the typed findings into the extraction and
//! emulation subsystems.

use crate::core::binary::{Arch, Confidence, Endianness};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Embedded filesystem kinds recognized by the signature catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilesystemKind {
    SquashFs,
    Jffs2,
    /// ext2/ext3/ext4 share a superblock magic; the distinction requires
    /// feature-flag inspection that belongs to the extraction layer.
    Ext,
    CramFs,
    Ubifs,
}

impl FilesystemKind {
    /// Third-party tools able to unpack this filesystem, for the
    /// extraction subsystem to probe for.
    pub fn extraction_tools(self) -> &'static [&'static str] {
        match self {
            FilesystemKind::SquashFs => &["unsquashfs"],
            FilesystemKind::Jffs2 => &["jefferson"],
            FilesystemKind::Ext => &["7z", "debugfs"],
            FilesystemKind::CramFs => &["cramfsck"],
            FilesystemKind::Ubifs => &["ubireader"],
        }
    }

    pub fn extractable(self) -> bool {
        !self.extraction_tools().is_empty()
    }
}

impl fmt::Display for FilesystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilesystemKind::SquashFs => "squashfs",
            FilesystemKind::Jffs2 => "jffs2",
            FilesystemKind::Ext => "ext",
            FilesystemKind::CramFs => "cramfs",
            FilesystemKind::Ubifs => "ubifs",
        };
        write!(f, "{}", s)
    }
}

/// Container formats that wrap kernel/rootfs segments in one blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Trx,
    UImage,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Trx => write!(f, "trx"),
            ContainerKind::UImage => write!(f, "uimage"),
        }
    }
}

/// Compression stream formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionKind {
    Gzip,
    Xz,
    Lzma,
    Bzip2,
    Lz4,
    Zstd,
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompressionKind::Gzip => "gzip",
            CompressionKind::Xz => "xz",
            CompressionKind::Lzma => "lzma",
            CompressionKind::Bzip2 => "bzip2",
            CompressionKind::Lz4 => "lz4",
            CompressionKind::Zstd => "zstd",
        };
        write!(f, "{}", s)
    }
}

/// Bootloader families identified by marker strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BootloaderKind {
    UBoot,
    Cfe,
    RedBoot,
}

impl fmt::Display for BootloaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootloaderKind::UBoot => write!(f, "u-boot"),
            BootloaderKind::Cfe => write!(f, "cfe"),
            BootloaderKind::RedBoot => write!(f, "redboot"),
        }
    }
}

/// Parsed TRX container header: eight little-endian 32-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrxHeader {
    pub total_len: u32,
    pub crc32: u32,
    pub flags_version: u32,
    pub offsets: u32,
    pub kernel_len: u32,
    pub rootfs_len: u32,
    pub rootfs_initrd_len: u32,
}

/// Fields lifted from a U-Boot legacy uImage header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UImageHeader {
    pub arch_code: u8,
    pub arch: Arch,
    pub name: String,
}

/// Structured detail attached to a container finding when the header
/// parsed cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContainerDetail {
    Trx(TrxHeader),
    UImage(UImageHeader),
}

/// Architecture conclusion of the detection cascade. At most one is
/// authoritative per run; the cascade stops at the first stage that
/// produces one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchFinding {
    pub arch: Arch,
    pub confidence: Confidence,
    pub method: String,
}

impl ArchFinding {
    pub fn unknown() -> Self {
        Self {
            arch: Arch::Unknown,
            confidence: Confidence::Low,
            method: "none".to_string(),
        }
    }
}

/// Endianness conclusion. Unlike architecture, both byte orders may
/// legitimately co-occur when a blob embeds binaries for several
/// sub-components, so the value set is not forced to a singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndiannessFinding {
    pub values: BTreeSet<Endianness>,
    pub confidence: Confidence,
    pub methods: Vec<String>,
}

impl EndiannessFinding {
    pub fn unknown() -> Self {
        Self {
            values: BTreeSet::new(),
            confidence: Confidence::Low,
            methods: vec!["none".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerFinding {
    pub kind: ContainerKind,
    pub offset: u64,
    pub detail: Option<ContainerDetail>,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesystemFinding {
    pub kind: FilesystemKind,
    pub offset: u64,
    pub confidence: f32,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootloaderFinding {
    pub kind: BootloaderKind,
    pub offset: u64,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionFinding {
    pub kind: CompressionKind,
    pub offset: u64,
    pub method: String,
}

/// Heuristic encryption signal. `entropy` is always reported so a caller
/// can re-judge with its own threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionSignal {
    pub likely_encrypted: bool,
    pub entropy: f64,
    pub reason: String,
}

/// One offset/description pair lifted from the external carver's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarverHit {
    pub offset: u64,
    pub description: String,
}

/// Summarized output of the external carver tool. Corroborating
/// evidence only, never authoritative.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CarverReport {
    /// Line-capped excerpt of raw stdout.
    pub excerpt: Vec<String>,
    /// Keyword-filtered lines, capped.
    pub key_findings: Vec<String>,
    /// Offsets the carver associated with known keywords.
    pub hits: Vec<CarverHit>,
}

impl CarverReport {
    /// Offsets the carver labeled as ELF images, candidates for header
    /// re-inspection.
    pub fn elf_offsets(&self) -> Vec<u64> {
        self.hits
            .iter()
            .filter(|h| h.description.to_lowercase().contains("elf"))
            .map(|h| h.offset)
            .collect()
    }
}

/// File-level metadata for the analyzed blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    pub size: u64,
    pub mime: String,
}

/// Aggregate result of one `detect_all` run. Absence of evidence shows
/// up as `Unknown`, `Low` confidence or empty lists, never as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub meta: FileMeta,
    pub encryption: EncryptionSignal,
    pub architecture: ArchFinding,
    pub endianness: EndiannessFinding,
    pub containers: Vec<ContainerFinding>,
    pub filesystems: Vec<FilesystemFinding>,
    pub bootloaders: Vec<BootloaderFinding>,
    pub compression: Vec<CompressionFinding>,
    pub carver: Option<CarverReport>,
}

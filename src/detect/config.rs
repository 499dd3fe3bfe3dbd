//! Configuration for the detection pipeline.
//!
//! Centralized knobs with defaults matching common firmware layouts.
//! All bounds are caps on how much of the blob a stage may examine.

use serde::{Deserialize, Serialize};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Master configuration for `Detector`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub scan: ScanConfig,
    pub entropy: EntropyConfig,
    pub carver: CarverConfig,
}

/// Per-kind scan caps. Header-only formats sit at the very start of the
/// blob; kernels, device trees and filesystems can be megabytes in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Cap for container/bootloader/compression header scans.
    pub header_scan_limit: u64,
    /// Cap for the embedded-filesystem scan.
    pub filesystem_scan_limit: u64,
    /// Cap for the kernel-magic scan.
    pub kernel_scan_limit: u64,
    /// Cap for the device-tree-blob scan.
    pub dtb_scan_limit: u64,
    /// Cap for the fallback raw ELF scan.
    pub elf_scan_limit: u64,
    /// Cap for the endianness ELF-header sweep.
    pub endian_elf_scan_limit: u64,
    /// How much of a located DTB is decoded as text for compatible hints.
    pub dtb_text_limit: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            header_scan_limit: 512,
            filesystem_scan_limit: 10 * MIB,
            kernel_scan_limit: 5 * MIB,
            dtb_scan_limit: 10 * MIB,
            elf_scan_limit: 2 * MIB,
            endian_elf_scan_limit: 10 * MIB,
            dtb_text_limit: MIB as usize,
        }
    }
}

/// Entropy/encryption heuristic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntropyConfig {
    /// Sample length read from offset 0.
    pub sample_len: usize,
    /// Bits-per-byte threshold above which content looks encrypted.
    pub encrypted_threshold: f64,
    /// Samples at or below this length are too small to judge.
    pub min_sample_len: usize,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            sample_len: KIB as usize,
            encrypted_threshold: 7.5,
            min_sample_len: 100,
        }
    }
}

/// External carver tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarverConfig {
    /// Whether to invoke the carver at all.
    pub enabled: bool,
    /// Command to run as `command <firmware_path>`.
    pub command: String,
    /// Hard deadline; the process is killed on expiry.
    pub timeout_secs: u64,
    /// Raw stdout excerpt cap, in lines.
    pub excerpt_lines: usize,
    /// Keyword-filtered key findings cap, in lines.
    pub key_finding_lines: usize,
}

impl Default for CarverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "binwalk".to_string(),
            timeout_secs: 120,
            excerpt_lines: 40,
            key_finding_lines: 20,
        }
    }
}

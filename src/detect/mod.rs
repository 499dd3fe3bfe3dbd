//! Firmware composition detection pipeline.
//!
//! `Detector::detect` fans the independent scans out over the rayon
//! pool, then runs the dependent stages (architecture cascade,
//! endianness resolution) over the shared results. Detection never
//! modifies the input file and reports absence of evidence as unknown
//! findings, not errors.

pub mod arch;
pub mod carver;
pub mod config;
pub mod endianness;
pub mod entropy;
pub mod headers;
pub mod io;
pub mod scanner;
pub mod signatures;
pub mod sniffers;
pub mod text;
pub mod tree;

use crate::core::report::{
    BootloaderFinding, CompressionFinding, ContainerDetail, ContainerFinding, ContainerKind,
    DetectionResult, FilesystemFinding,
};
use crate::detect::config::DetectorConfig;
use crate::detect::headers::{TRX_HEADER_LEN, UIMAGE_HEADER_LEN};
use crate::detect::io::ByteSource;
use crate::detect::scanner::ScanMode;
use crate::detect::signatures::{
    bootloader_scanner, compression_scanner, container_scanner, filesystem_scanner,
};
use crate::error::Result;
use std::path::Path;
use tracing::{info, info_span};

/// Composition detector over a single firmware blob.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectorConfig,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analyze `firmware`, optionally with an already-extracted
    /// filesystem tree alongside it.
    ///
    /// Errors only when the input file itself is unusable; every
    /// detection stage degrades to empty or unknown findings.
    pub fn detect(
        &self,
        firmware: &Path,
        extracted_tree: Option<&Path>,
    ) -> Result<DetectionResult> {
        let span = info_span!("detect", firmware = ?firmware);
        let _guard = span.enter();

        let src = ByteSource::open(firmware)?;
        let meta = sniffers::file_meta(&src);

        let cfg = &self.config;
        let (carver_report, ((filesystems, containers), (bootloaders, compression))) =
            rayon::join(
                || {
                    if cfg.carver.enabled {
                        carver::run_carver(firmware, &cfg.carver)
                    } else {
                        None
                    }
                },
                || {
                    rayon::join(
                        || {
                            rayon::join(
                                || self.scan_filesystems(&src),
                                || self.scan_containers(&src),
                            )
                        },
                        || {
                            rayon::join(
                                || self.scan_bootloaders(&src),
                                || self.scan_compression(&src),
                            )
                        },
                    )
                },
            );

        let encryption = entropy::encryption_signal(&src, &cfg.entropy);
        let architecture = arch::detect_architecture(
            &src,
            &cfg.scan,
            extracted_tree,
            carver_report.as_ref(),
        );
        let endianness = endianness::resolve_endianness(
            &src,
            &cfg.scan,
            extracted_tree,
            carver_report.as_ref(),
            architecture.arch,
        );

        info!(
            "detection complete: arch={} ({}), {} filesystem(s), {} container(s)",
            architecture.arch,
            architecture.confidence,
            filesystems.len(),
            containers.len()
        );

        Ok(DetectionResult {
            meta,
            encryption,
            architecture,
            endianness,
            containers,
            filesystems,
            bootloaders,
            compression,
            carver: carver_report,
        })
    }

    /// Embedded filesystems: deep scan, one finding per kind at its
    /// lowest offset.
    fn scan_filesystems(&self, src: &ByteSource) -> Vec<FilesystemFinding> {
        filesystem_scanner()
            .scan(src, self.config.scan.filesystem_scan_limit, ScanMode::FirstPerLabel)
            .into_iter()
            .map(|hit| FilesystemFinding {
                kind: hit.label,
                offset: hit.offset,
                confidence: hit.confidence,
                method: "magic_scan".to_string(),
            })
            .collect()
    }

    /// Container headers: shallow scan, every occurrence kept, each
    /// re-read for structured detail.
    fn scan_containers(&self, src: &ByteSource) -> Vec<ContainerFinding> {
        container_scanner()
            .scan(src, self.config.scan.header_scan_limit, ScanMode::All)
            .into_iter()
            .map(|hit| {
                let detail = match hit.label {
                    ContainerKind::Trx => {
                        let raw = src.read_at(hit.offset, TRX_HEADER_LEN);
                        headers::parse_trx_header(&raw).map(ContainerDetail::Trx)
                    }
                    ContainerKind::UImage => {
                        let raw = src.read_at(hit.offset, UIMAGE_HEADER_LEN);
                        headers::parse_uimage_header(&raw).map(ContainerDetail::UImage)
                    }
                };
                ContainerFinding {
                    kind: hit.label,
                    offset: hit.offset,
                    detail,
                    method: "magic_scan".to_string(),
                }
            })
            .collect()
    }

    fn scan_bootloaders(&self, src: &ByteSource) -> Vec<BootloaderFinding> {
        bootloader_scanner()
            .scan(src, self.config.scan.header_scan_limit, ScanMode::FirstPerLabel)
            .into_iter()
            .map(|hit| BootloaderFinding {
                kind: hit.label,
                offset: hit.offset,
                method: "marker_string".to_string(),
            })
            .collect()
    }

    fn scan_compression(&self, src: &ByteSource) -> Vec<CompressionFinding> {
        compression_scanner()
            .scan(src, self.config.scan.header_scan_limit, ScanMode::FirstPerLabel)
            .into_iter()
            .map(|hit| CompressionFinding {
                kind: hit.label,
                offset: hit.offset,
                method: "magic_scan".to_string(),
            })
            .collect()
    }
}

/// One-shot analysis with default configuration.
pub fn detect_all<P: AsRef<Path>>(firmware: P) -> Result<DetectionResult> {
    Detector::default().detect(firmware.as_ref(), None)
}

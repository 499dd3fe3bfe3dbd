//! Core data types: immutable values exchanged between the detection
//! pipeline and its consumers.

pub mod binary;
pub mod report;

pub use binary::{Arch, Confidence, Endianness};
pub use report::{
    ArchFinding, BootloaderFinding, BootloaderKind, CarverHit, CarverReport, CompressionFinding,
    CompressionKind, ContainerDetail, ContainerFinding, ContainerKind, DetectionResult,
    EncryptionSignal, EndiannessFinding, FileMeta, FilesystemFinding, FilesystemKind, TrxHeader,
    UImageHeader,
};

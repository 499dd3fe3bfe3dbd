//! Firmscope: blind firmware composition detection.
//!
//! Given an opaque firmware blob, report what can be inferred from
//! structure alone: target architecture and byte order, container
//! formats, embedded filesystems, bootloaders, compression streams and
//! an encryption likelihood. Detection is read-only and conservative;
//! missing evidence surfaces as unknown findings, never as errors.
//!
//! ```no_run
//! let result = firmscope::detect_all("router.bin")?;
//! println!("arch: {} ({})", result.architecture.arch, result.architecture.confidence);
//! for fs in &result.filesystems {
//!     println!("{} at offset {}", fs.kind, fs.offset);
//! }
//! # Ok::<(), firmscope::FirmscopeError>(())
//! ```

pub mod core;
pub mod detect;
pub mod error;
pub mod logging;

pub use crate::core::binary::{Arch, Confidence, Endianness};
pub use crate::core::report::DetectionResult;
pub use crate::detect::config::DetectorConfig;
pub use crate::detect::{detect_all, Detector};
pub use crate::error::{FirmscopeError, Result};

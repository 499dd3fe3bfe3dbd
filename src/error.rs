//! Error types for firmware composition detection.
//!
//! Only construction-time problems surface as errors; once a
//! `ByteSource` exists, every stage degrades to "no evidence" instead
//! of failing.

use thiserror::Error;

/// Main error type for firmscope operations.
#[derive(Debug, Error)]
pub enum FirmscopeError {
    /// Invalid input data (missing path, empty file, not a regular file)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// External tool exceeded its deadline
    #[error("External tool '{tool}' timed out after {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    /// External tool could not be launched or produced unusable output
    #[error("External tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },
}

/// Result type alias for firmscope operations.
pub type Result<T> = std::result::Result<T, FirmscopeError>;

//! Read-only, offset-addressable access to a firmware file.
//!
//! A `ByteSource` is created once per analysis and never written to.
//! Positional reads degrade instead of failing: a short or empty buffer
//! means "no evidence here", and every higher-level stage treats it
//! exactly like a non-match.

use crate::error::{FirmscopeError, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Immutable handle to a firmware file plus its total length.
#[derive(Debug)]
pub struct ByteSource {
    file: Mutex<File>,
    len: u64,
    path: PathBuf,
}

impl ByteSource {
    /// Open a firmware file for analysis.
    ///
    /// Fails with `InvalidInput` when the path does not name a regular
    /// file or the file is empty; all later reads are infallible.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("opening firmware file: {:?}", path);

        let metadata = std::fs::metadata(path).map_err(|e| {
            FirmscopeError::InvalidInput(format!("cannot stat {}: {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(FirmscopeError::InvalidInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        let len = metadata.len();
        if len == 0 {
            return Err(FirmscopeError::InvalidInput(format!(
                "{} is empty",
                path.display()
            )));
        }

        let file = File::open(path)?;
        debug!("opened {:?}: {} bytes", path, len);
        Ok(Self {
            file: Mutex::new(file),
            len,
            path: path.to_path_buf(),
        })
    }

    /// Total file length in bytes. Always nonzero.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read up to `len` bytes starting at `offset`.
    ///
    /// Never errors: offsets past EOF, short reads and positional I/O
    /// failures all come back as a shorter (possibly empty) buffer.
    pub fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
        if offset >= self.len || len == 0 {
            return Vec::new();
        }
        let want = len.min((self.len - offset) as usize);

        let mut file = match self.file.lock() {
            Ok(f) => f,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = file.seek(SeekFrom::Start(offset)) {
            warn!("seek to {} failed: {}", offset, e);
            return Vec::new();
        }

        let mut buf = vec![0u8; want];
        let mut filled = 0usize;
        while filled < want {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("read at {} failed after {} bytes: {}", offset, filled, e);
                    break;
                }
            }
        }
        buf.truncate(filled);
        buf
    }
}

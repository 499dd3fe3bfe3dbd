//! Lookup helpers over an already-extracted filesystem tree.
//!
//! When the caller has unpacked the firmware, named binaries in the
//! tree (a `busybox`, a kernel image) carry far better architecture and
//! endianness evidence than anything scraped out of the raw blob.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Binaries whose ELF headers are trusted for architecture/endianness.
pub const KNOWN_BINARY_NAMES: &[&str] = &["busybox", "init", "sh"];

/// Kernel image file names commonly left behind by extraction.
pub const KERNEL_IMAGE_NAMES: &[&str] = &["vmlinux", "vmlinuz", "zImage", "uImage", "Image"];

const MAX_TREE_DEPTH: usize = 12;
const MAX_MATCHES: usize = 8;

/// Find files in `root` whose name matches one of `names`, bounded in
/// depth and count. Symlinks are not followed.
pub fn find_named_files(root: &Path, names: &[&str]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root)
        .max_depth(MAX_TREE_DEPTH)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if names.iter().any(|n| *n == name) {
                found.push(entry.into_path());
                if found.len() >= MAX_MATCHES {
                    break;
                }
            }
        }
    }
    debug!("tree lookup under {:?}: {} match(es)", root, found.len());
    found
}

/// Read a bounded prefix of a file inside the tree; unreadable files
/// yield an empty buffer, same contract as blob reads.
pub fn read_prefix(path: &Path, len: usize) -> Vec<u8> {
    match fs::read(path) {
        Ok(mut data) => {
            data.truncate(len);
            data
        }
        Err(_) => Vec::new(),
    }
}

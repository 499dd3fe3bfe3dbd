//! Bounded, chunked signature search over a byte source.
//!
//! Reads fixed-size windows sequentially from offset 0 up to a
//! caller-specified cap, so multi-megabyte blobs are never loaded
//! wholly into memory. Windows are read with an overlap of
//! `max_pattern_len - 1` bytes so a signature straddling a window
//! boundary is still found; only matches starting inside the window
//! proper are recorded, which keeps hits duplicate-free and in global
//! offset order.

use crate::detect::io::ByteSource;
use crate::detect::signatures::Signature;
use aho_corasick::AhoCorasick;
use std::collections::HashSet;
use std::hash::Hash;
use tracing::debug;

/// Fixed window size for sequential scans.
pub const SCAN_WINDOW: usize = 4096;

/// Minimum confidence assigned to any hit.
pub const MIN_HIT_CONFIDENCE: f32 = 0.1;

/// A located signature: label, absolute offset and a confidence that
/// decreases monotonically with distance from the start of the scanned
/// range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanHit<L> {
    pub label: L,
    pub offset: u64,
    pub confidence: f32,
}

/// Whether a scan records every occurrence or only the first per label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Keep only the lowest-offset occurrence of each label.
    FirstPerLabel,
    /// Keep every occurrence.
    All,
}

/// Multi-pattern scanner built once from a static catalog.
pub struct SignatureScanner<L> {
    automaton: AhoCorasick,
    labels: Vec<L>,
    distinct_labels: usize,
    overlap: usize,
}

impl<L: Copy + Eq + Hash> SignatureScanner<L> {
    pub fn new(signatures: &[Signature<L>]) -> Self {
        let patterns: Vec<&[u8]> = signatures.iter().map(|s| s.pattern).collect();
        let automaton =
            AhoCorasick::new(&patterns).expect("static signature catalogs are well-formed");
        let labels: Vec<L> = signatures.iter().map(|s| s.label).collect();
        let distinct_labels = labels.iter().copied().collect::<HashSet<_>>().len();
        let overlap = signatures
            .iter()
            .map(|s| s.pattern.len())
            .max()
            .unwrap_or(1)
            .saturating_sub(1);
        Self {
            automaton,
            labels,
            distinct_labels,
            overlap,
        }
    }

    /// Scan the first `cap` bytes of `src` (bounded by file size).
    ///
    /// Hits are returned sorted by offset. An unreadable window ends the
    /// scan early with whatever was found so far.
    pub fn scan(&self, src: &ByteSource, cap: u64, mode: ScanMode) -> Vec<ScanHit<L>> {
        let scan_len = cap.min(src.len());
        let mut hits: Vec<ScanHit<L>> = Vec::new();
        let mut seen: HashSet<L> = HashSet::new();

        let mut pos: u64 = 0;
        while pos < scan_len {
            let window = src.read_at(pos, SCAN_WINDOW + self.overlap);
            if window.is_empty() {
                break;
            }

            let mut window_hits: Vec<(usize, usize)> = self
                .automaton
                .find_overlapping_iter(&window)
                // Matches that begin in the overlap belong to the next window.
                .filter(|m| m.start() < SCAN_WINDOW)
                .map(|m| (m.start(), m.pattern().as_usize()))
                .collect();
            window_hits.sort_unstable();

            for (start, pattern) in window_hits {
                let offset = pos + start as u64;
                if offset >= scan_len {
                    continue;
                }
                let label = self.labels[pattern];
                if mode == ScanMode::FirstPerLabel && !seen.insert(label) {
                    continue;
                }
                hits.push(ScanHit {
                    label,
                    offset,
                    confidence: hit_confidence(offset, scan_len),
                });
            }

            if mode == ScanMode::FirstPerLabel && seen.len() == self.distinct_labels {
                break;
            }
            pos += SCAN_WINDOW as u64;
        }

        hits.sort_by_key(|h| h.offset);
        debug!(
            "scan over {} bytes produced {} hit(s)",
            scan_len,
            hits.len()
        );
        hits
    }
}

/// Earlier hits are more trustworthy; the floor keeps late hits visible.
fn hit_confidence(offset: u64, scan_len: u64) -> f32 {
    if scan_len == 0 {
        return MIN_HIT_CONFIDENCE;
    }
    let raw = 1.0 - offset as f64 / scan_len as f64;
    (raw as f32).max(MIN_HIT_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::io::ByteSource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Tag {
        A,
        B,
    }

    fn scanner() -> SignatureScanner<Tag> {
        SignatureScanner::new(&[
            Signature { pattern: b"MAGICA", label: Tag::A },
            Signature { pattern: b"BB", label: Tag::B },
        ])
    }

    fn source_with(data: &[u8]) -> (NamedTempFile, ByteSource) {
        let tmp = NamedTempFile::new().unwrap();
        tmp.as_file().write_all(data).unwrap();
        let src = ByteSource::open(tmp.path()).unwrap();
        (tmp, src)
    }

    #[test]
    fn finds_signature_in_first_window() {
        let mut data = vec![0u8; 8192];
        data[100..106].copy_from_slice(b"MAGICA");
        let (_tmp, src) = source_with(&data);
        let hits = scanner().scan(&src, 8192, ScanMode::All);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label, Tag::A);
        assert_eq!(hits[0].offset, 100);
    }

    #[test]
    fn finds_signature_straddling_window_boundary() {
        // "MAGICA" split across the 4096-byte boundary: starts at 4093.
        let mut data = vec![0u8; 8192];
        data[4093..4099].copy_from_slice(b"MAGICA");
        let (_tmp, src) = source_with(&data);
        let hits = scanner().scan(&src, 8192, ScanMode::All);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].offset, 4093);
    }

    #[test]
    fn first_per_label_keeps_lowest_offset() {
        let mut data = vec![0u8; 8192];
        data[50..56].copy_from_slice(b"MAGICA");
        data[5000..5006].copy_from_slice(b"MAGICA");
        let (_tmp, src) = source_with(&data);
        let hits = scanner().scan(&src, 8192, ScanMode::FirstPerLabel);
        assert_eq!(hits.iter().filter(|h| h.label == Tag::A).count(), 1);
        assert_eq!(hits[0].offset, 50);

        let all = scanner().scan(&src, 8192, ScanMode::All);
        assert_eq!(all.iter().filter(|h| h.label == Tag::A).count(), 2);
    }

    #[test]
    fn cap_excludes_later_hits() {
        let mut data = vec![0u8; 8192];
        data[6000..6006].copy_from_slice(b"MAGICA");
        let (_tmp, src) = source_with(&data);
        let hits = scanner().scan(&src, 4096, ScanMode::All);
        assert!(hits.is_empty());
    }

    #[test]
    fn confidence_decreases_with_offset_and_is_floored() {
        let mut data = vec![0u8; 4096];
        data[0..2].copy_from_slice(b"BB");
        data[4000..4002].copy_from_slice(b"BB");
        let (_tmp, src) = source_with(&data);
        let hits = scanner().scan(&src, 4096, ScanMode::All);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].confidence > hits[1].confidence);
        assert!(hits[1].confidence >= MIN_HIT_CONFIDENCE);
        assert_eq!(hit_confidence(4095, 4096), MIN_HIT_CONFIDENCE);
    }

    #[test]
    fn no_match_yields_empty() {
        let (_tmp, src) = source_with(&vec![0x11u8; 4096]);
        assert!(scanner().scan(&src, 4096, ScanMode::All).is_empty());
    }
}

//! Shannon-entropy encryption heuristic.
//!
//! A bounded sample from the start of the blob is scored for byte-value
//! randomness. High entropy without any plaintext crypto marker is
//! circumstantial evidence of encryption (or strong compression); the
//! raw value is always reported so a caller can re-judge.

use crate::core::report::EncryptionSignal;
use crate::detect::config::EntropyConfig;
use crate::detect::io::ByteSource;
use memchr::memmem;
use tracing::debug;

/// Plaintext markers whose presence argues against whole-file encryption.
const ENCRYPTION_MARKERS: &[&[u8]] = &[b"-----BEGIN", b"ENCRYPTED", b"AES", b"DES"];

/// Shannon entropy of a byte slice in bits per byte (0.0 to 8.0).
#[inline]
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut hist = [0usize; 256];
    for &b in data {
        hist[b as usize] += 1;
    }
    let len = data.len() as f64;
    let mut h = 0.0;
    for c in hist.iter().copied() {
        if c == 0 {
            continue;
        }
        let p = (c as f64) / len;
        h -= p * p.log2();
    }
    h
}

/// Judge the encryption likelihood of `src` from a bounded prefix sample.
///
/// An unreadable (empty) sample is itself suspicious and reported as
/// possibly encrypted with a zero entropy value.
pub fn encryption_signal(src: &ByteSource, cfg: &EntropyConfig) -> EncryptionSignal {
    let sample = src.read_at(0, cfg.sample_len);
    if sample.is_empty() {
        return EncryptionSignal {
            likely_encrypted: true,
            entropy: 0.0,
            reason: "cannot read file".to_string(),
        };
    }

    let entropy = shannon_entropy(&sample);
    let marker = ENCRYPTION_MARKERS
        .iter()
        .find(|m| memmem::find(&sample, m).is_some());
    debug!(
        "entropy sample: {} bytes, {:.3} bits/byte, marker: {:?}",
        sample.len(),
        entropy,
        marker.map(|m| String::from_utf8_lossy(m).into_owned())
    );

    if entropy > cfg.encrypted_threshold && marker.is_none() && sample.len() > cfg.min_sample_len {
        EncryptionSignal {
            likely_encrypted: true,
            entropy,
            reason: format!(
                "entropy {:.2} above {:.2} with no plaintext crypto markers",
                entropy, cfg.encrypted_threshold
            ),
        }
    } else {
        let reason = if let Some(m) = marker {
            format!("crypto marker '{}' present", String::from_utf8_lossy(m))
        } else if sample.len() <= cfg.min_sample_len {
            "sample too small to judge".to_string()
        } else {
            format!(
                "entropy {:.2} below threshold {:.2}",
                entropy, cfg.encrypted_threshold
            )
        };
        EncryptionSignal {
            likely_encrypted: false,
            entropy,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::config::EntropyConfig;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source_with(data: &[u8]) -> (NamedTempFile, ByteSource) {
        let tmp = NamedTempFile::new().unwrap();
        tmp.as_file().write_all(data).unwrap();
        let src = ByteSource::open(tmp.path()).unwrap();
        (tmp, src)
    }

    fn random_bytes(n: usize) -> Vec<u8> {
        // LCG, uniform enough for an entropy check without external crates
        let mut rng = 0x2545F4914F6CDD1Du64;
        (0..n)
            .map(|_| {
                rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (rng >> 33) as u8
            })
            .collect()
    }

    #[test]
    fn entropy_of_identical_bytes_is_zero() {
        assert_eq!(shannon_entropy(&[0xAA; 1024]), 0.0);
        assert_eq!(shannon_entropy(&[]), 0.0);
    }

    #[test]
    fn entropy_of_uniform_random_approaches_eight() {
        let h = shannon_entropy(&random_bytes(1024));
        assert!(h > 7.5 && h <= 8.0, "entropy out of range: {}", h);
    }

    #[test]
    fn entropy_of_full_byte_cycle_is_exactly_eight() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
        let h = shannon_entropy(&data);
        assert!((h - 8.0).abs() < 1e-9);
    }

    #[test]
    fn random_blob_is_flagged() {
        let (_tmp, src) = source_with(&random_bytes(4096));
        let sig = encryption_signal(&src, &EntropyConfig::default());
        assert!(sig.likely_encrypted);
        assert!(sig.entropy > 7.5);
    }

    #[test]
    fn crypto_marker_suppresses_flag() {
        let mut data = random_bytes(1024);
        data[100..110].copy_from_slice(b"-----BEGIN");
        let (_tmp, src) = source_with(&data);
        let sig = encryption_signal(&src, &EntropyConfig::default());
        assert!(!sig.likely_encrypted);
        assert!(sig.reason.contains("marker"));
    }

    #[test]
    fn short_sample_is_not_flagged() {
        // 64 bytes of random data: entropy may be high but the sample is
        // below the minimum length gate.
        let (_tmp, src) = source_with(&random_bytes(64));
        let sig = encryption_signal(&src, &EntropyConfig::default());
        assert!(!sig.likely_encrypted);
    }

    #[test]
    fn low_entropy_blob_is_not_flagged() {
        let (_tmp, src) = source_with(&[0x41u8; 2048]);
        let sig = encryption_signal(&src, &EntropyConfig::default());
        assert!(!sig.likely_encrypted);
        assert_eq!(sig.entropy, 0.0);
    }
}

//! File-level metadata sniffing.

use crate::core::report::FileMeta;
use crate::detect::io::ByteSource;
use tracing::debug;

const SNIFF_PREFIX_LEN: usize = 4096;
const FALLBACK_MIME: &str = "application/octet-stream";

/// Size plus a best-effort MIME type from a bounded prefix. Opaque
/// firmware almost always lands on the octet-stream fallback; a real
/// match usually means the "firmware" is actually a zip, tarball or
/// similar outer wrapper.
pub fn file_meta(src: &ByteSource) -> FileMeta {
    let prefix = src.read_at(0, SNIFF_PREFIX_LEN);
    let mime = infer::get(&prefix)
        .map(|t| t.mime_type().to_string())
        .unwrap_or_else(|| FALLBACK_MIME.to_string());
    debug!("sniffed {:?} as {} ({} bytes)", src.path(), mime, src.len());
    FileMeta {
        size: src.len(),
        mime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source_with(data: &[u8]) -> (NamedTempFile, ByteSource) {
        let tmp = NamedTempFile::new().unwrap();
        tmp.as_file().write_all(data).unwrap();
        let src = ByteSource::open(tmp.path()).unwrap();
        (tmp, src)
    }

    #[test]
    fn opaque_bytes_fall_back_to_octet_stream() {
        let (_tmp, src) = source_with(&[0x42u8; 64]);
        let meta = file_meta(&src);
        assert_eq!(meta.size, 64);
        assert_eq!(meta.mime, "application/octet-stream");
    }

    #[test]
    fn gzip_wrapper_is_recognized() {
        let mut data = vec![0u8; 32];
        data[0..3].copy_from_slice(b"\x1f\x8b\x08");
        let (_tmp, src) = source_with(&data);
        assert_eq!(file_meta(&src).mime, "application/gzip");
    }
}

//! Fusion of an external carver tool's textual report.
//!
//! The carver (binwalk or equivalent) is invoked as `tool <path>` under
//! a hard deadline and killed on expiry. Its stdout is mined for lines
//! pairing a leading decimal offset with known keywords. Everything
//! here is corroborating evidence: a missing tool, a timeout or
//! unparsable output contributes nothing and never fails the analysis.

use crate::core::report::{CarverHit, CarverReport};
use crate::detect::config::CarverConfig;
use crate::detect::text;
use crate::error::{FirmscopeError, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Keywords worth surfacing from carver output.
const CARVER_KEYWORDS: &[&str] = &[
    "squashfs", "jffs2", "cramfs", "ubi", "ext2", "ext3", "ext4", "elf", "trx", "uimage",
    "u-boot", "device tree", "gzip", "lzma", "xz", "zlib", "bzip2",
];

/// Parse one carver output line of the form `<decimal offset> <description>`.
pub fn parse_carver_line(line: &str) -> Option<CarverHit> {
    let trimmed = line.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let offset = parts.next()?.parse::<u64>().ok()?;
    let description = parts.next()?.trim().to_string();
    if description.is_empty() {
        return None;
    }
    Some(CarverHit { offset, description })
}

fn has_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    CARVER_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Run the carver and summarize its report.
///
/// `None` means the tool was unavailable, timed out or produced
/// nothing usable; the caller proceeds without this evidence.
pub fn run_carver(firmware: &Path, cfg: &CarverConfig) -> Option<CarverReport> {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            warn!("carver runtime unavailable: {}", e);
            return None;
        }
    };

    let stdout = match runtime.block_on(capture_stdout(firmware, cfg)) {
        Ok(out) => out,
        Err(e) => {
            warn!("carver skipped: {}", e);
            return None;
        }
    };

    let report = summarize(&stdout, cfg);
    info!(
        "carver '{}': {} excerpt line(s), {} key finding(s), {} hit(s)",
        cfg.command,
        report.excerpt.len(),
        report.key_findings.len(),
        report.hits.len()
    );
    Some(report)
}

async fn capture_stdout(firmware: &Path, cfg: &CarverConfig) -> Result<Vec<u8>> {
    debug!(
        "launching carver: {} {:?} (deadline {}s)",
        cfg.command, firmware, cfg.timeout_secs
    );
    let fut = Command::new(&cfg.command)
        .arg(firmware)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        // Dropping the future on timeout tears the child down.
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(Duration::from_secs(cfg.timeout_secs), fut).await {
        Ok(Ok(output)) => Ok(output.stdout),
        Ok(Err(e)) => Err(FirmscopeError::ToolFailed {
            tool: cfg.command.clone(),
            message: e.to_string(),
        }),
        Err(_) => Err(FirmscopeError::ToolTimeout {
            tool: cfg.command.clone(),
            seconds: cfg.timeout_secs,
        }),
    }
}

fn summarize(stdout: &[u8], cfg: &CarverConfig) -> CarverReport {
    let rendered = text::decode_lossy(stdout);
    let lines: Vec<&str> = rendered
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let excerpt: Vec<String> = lines
        .iter()
        .take(cfg.excerpt_lines)
        .map(|l| l.to_string())
        .collect();

    let key_findings: Vec<String> = lines
        .iter()
        .filter(|l| has_keyword(l))
        .take(cfg.key_finding_lines)
        .map(|l| l.to_string())
        .collect();

    let hits: Vec<CarverHit> = key_findings
        .iter()
        .filter_map(|l| parse_carver_line(l))
        .collect();

    CarverReport {
        excerpt,
        key_findings,
        hits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::config::CarverConfig;

    #[test]
    fn parses_offset_description_lines() {
        let hit =
            parse_carver_line("131072    Squashfs filesystem, little endian, version 4.0").unwrap();
        assert_eq!(hit.offset, 131072);
        assert!(hit.description.starts_with("Squashfs"));

        assert!(parse_carver_line("DECIMAL  HEXADECIMAL  DESCRIPTION").is_none());
        assert!(parse_carver_line("").is_none());
        assert!(parse_carver_line("1024").is_none());
    }

    #[test]
    fn summarize_filters_and_caps() {
        let stdout = b"DECIMAL  HEXADECIMAL  DESCRIPTION\n\
            ---------------------------------\n\
            0        0x0          TRX firmware header\n\
            512      0x200        uImage header, MIPS\n\
            131072   0x20000      Squashfs filesystem, big endian\n\
            900000   0xDBBA0      ELF, 32-bit MSB executable\n\
            950000   0xE7EF0      Nothing of note\n";
        let cfg = CarverConfig {
            excerpt_lines: 3,
            key_finding_lines: 2,
            ..CarverConfig::default()
        };
        let report = summarize(stdout, &cfg);
        assert_eq!(report.excerpt.len(), 3);
        assert_eq!(report.key_findings.len(), 2);
        assert_eq!(report.hits.len(), 2);
        assert_eq!(report.hits[0].offset, 0);
        assert_eq!(report.hits[1].offset, 512);
    }

    #[test]
    fn missing_tool_degrades_to_none() {
        let cfg = CarverConfig {
            command: "firmscope-test-no-such-carver".to_string(),
            timeout_secs: 5,
            ..CarverConfig::default()
        };
        assert!(run_carver(Path::new("/dev/null"), &cfg).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn deadline_expiry_degrades_to_none_promptly() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-carver.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cfg = CarverConfig {
            command: script.to_string_lossy().into_owned(),
            timeout_secs: 1,
            ..CarverConfig::default()
        };
        let started = Instant::now();
        assert!(run_carver(Path::new("/dev/null"), &cfg).is_none());
        assert!(
            started.elapsed().as_secs() < 10,
            "deadline not enforced: took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn harmless_tool_yields_report_without_hits() {
        let cfg = CarverConfig {
            command: "echo".to_string(),
            timeout_secs: 5,
            ..CarverConfig::default()
        };
        let report = run_carver(Path::new("/dev/null"), &cfg).unwrap();
        assert_eq!(report.excerpt.len(), 1);
        assert!(report.hits.is_empty());
    }
}

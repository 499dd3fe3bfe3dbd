//! Architecture, endianness and confidence types shared across detection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The CPU architecture a firmware image targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    /// 32-bit x86
    X86,
    /// 64-bit x86
    X86_64,
    /// 32-bit ARM
    ARM,
    /// 64-bit ARM
    AArch64,
    /// MIPS (32-bit)
    MIPS,
    /// MIPS (64-bit)
    MIPS64,
    /// PowerPC (32-bit)
    PPC,
    /// PowerPC (64-bit)
    PPC64,
    /// RISC-V
    RISCV,
    /// Unknown or unsupported architecture
    Unknown,
}

impl Arch {
    /// The byte order this architecture ships with in the overwhelming
    /// majority of consumer firmware. Used only as a last-resort fallback
    /// when no direct endianness evidence exists.
    pub fn implied_endianness(self) -> Option<Endianness> {
        match self {
            Arch::MIPS | Arch::MIPS64 | Arch::PPC | Arch::PPC64 => Some(Endianness::Big),
            Arch::X86 | Arch::X86_64 | Arch::ARM | Arch::AArch64 | Arch::RISCV => {
                Some(Endianness::Little)
            }
            Arch::Unknown => None,
        }
    }

    /// QEMU system emulator binary for this architecture. Consumed by the
    /// emulation subsystem when it selects a machine profile; detection
    /// itself never launches an emulator.
    pub fn qemu_system_binary(self, endianness: Endianness) -> Option<&'static str> {
        match (self, endianness) {
            (Arch::ARM, _) => Some("qemu-system-arm"),
            (Arch::AArch64, _) => Some("qemu-system-aarch64"),
            (Arch::MIPS, Endianness::Little) => Some("qemu-system-mipsel"),
            (Arch::MIPS, Endianness::Big) => Some("qemu-system-mips"),
            (Arch::MIPS64, Endianness::Little) => Some("qemu-system-mips64el"),
            (Arch::MIPS64, Endianness::Big) => Some("qemu-system-mips64"),
            (Arch::PPC, _) => Some("qemu-system-ppc"),
            (Arch::PPC64, _) => Some("qemu-system-ppc64"),
            (Arch::X86, _) => Some("qemu-system-i386"),
            (Arch::X86_64, _) => Some("qemu-system-x86_64"),
            (Arch::RISCV, _) => Some("qemu-system-riscv64"),
            (Arch::Unknown, _) => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::ARM => "arm",
            Arch::AArch64 => "aarch64",
            Arch::MIPS => "mips",
            Arch::MIPS64 => "mips64",
            Arch::PPC => "ppc",
            Arch::PPC64 => "ppc64",
            Arch::RISCV => "riscv",
            Arch::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Byte order used to interpret multi-byte integer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Endianness {
    Little,
    Big,
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => write!(f, "little"),
            Endianness::Big => write!(f, "big"),
        }
    }
}

/// Coarse confidence tier for a finding: how direct the supporting
/// evidence was, from inferred (`Low`) to measured out of a structured
/// header (`High`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

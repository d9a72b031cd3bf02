//! Coarse platform fingerprint used to suffix cache keys.
//!
//! Only two operating systems and two architectures are distinguished.
//! Anything unrecognised folds into `linux` / `amd64`.

use std::fmt;

/// Operating system axis of the fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// macOS
    Darwin,
    /// Linux and everything unrecognised
    Linux,
}

impl Os {
    /// Get the current OS.
    #[must_use]
    pub fn current() -> Self {
        Self::from_name(std::env::consts::OS)
    }

    /// Normalise an OS name (`std::env::consts::OS` style).
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "darwin" | "macos" => Self::Darwin,
            _ => Self::Linux,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Darwin => write!(f, "darwin"),
            Self::Linux => write!(f, "linux"),
        }
    }
}

/// CPU architecture axis of the fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// `arm64` / `aarch64`
    Arm64,
    /// `x86_64` and everything unrecognised
    Amd64,
}

impl Arch {
    /// Get the current architecture.
    #[must_use]
    pub fn current() -> Self {
        Self::from_name(std::env::consts::ARCH)
    }

    /// Normalise an architecture name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "arm64" | "aarch64" => Self::Arm64,
            _ => Self::Amd64,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arm64 => write!(f, "arm64"),
            Self::Amd64 => write!(f, "amd64"),
        }
    }
}

/// An OS/architecture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Operating system
    pub os: Os,
    /// CPU architecture
    pub arch: Arch,
}

impl Platform {
    /// Create a new platform.
    #[must_use]
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Get the current platform.
    #[must_use]
    pub fn current() -> Self {
        Self {
            os: Os::current(),
            arch: Arch::current(),
        }
    }

    /// Key suffix for this platform.
    ///
    /// Empty when suffixing is disabled or when cross-OS archives are
    /// requested, since shared archives need platform-independent keys.
    #[must_use]
    pub fn suffix(&self, enable_suffix: bool, cross_os_archive: bool) -> String {
        if !enable_suffix || cross_os_archive {
            return String::new();
        }
        format!("-{self}")
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Key suffix for the current platform. See [`Platform::suffix`].
#[must_use]
pub fn platform_suffix(enable_suffix: bool, cross_os_archive: bool) -> String {
    Platform::current().suffix(enable_suffix, cross_os_archive)
}

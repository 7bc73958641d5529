use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

const WINDOWS_OS_NAME: &str = "windows";
const WINDOWS_EXE_EXTENSION: &str = "exe";

/// One (os, arch) pair and the release archive that carries its binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTarget {
    pub os: String,
    pub arch: String,
    pub archive: String,
}

impl PlatformTarget {
    pub fn new(os: impl Into<String>, arch: impl Into<String>, archive: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
            archive: archive.into(),
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os.eq_ignore_ascii_case(WINDOWS_OS_NAME)
    }

    /// Name of the staged file, e.g. `lispium-linux-x86_64` or `lispium-windows-x86_64.exe`.
    pub fn binary_file_name(&self, binary: &str) -> String {
        if self.is_windows() {
            format!(
                "{}-{}-{}.{}",
                binary, self.os, self.arch, WINDOWS_EXE_EXTENSION
            )
        } else {
            format!("{}-{}-{}", binary, self.os, self.arch)
        }
    }
}

impl Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Targets published with every release, in the order they are processed.
pub fn default_manifest() -> Vec<PlatformTarget> {
    vec![
        PlatformTarget::new("linux", "x86_64", "lispium-linux-x86_64.tar.gz"),
        PlatformTarget::new("darwin", "x86_64", "lispium-macos-x86_64.tar.gz"),
        PlatformTarget::new("darwin", "aarch64", "lispium-macos-aarch64.tar.gz"),
        PlatformTarget::new("windows", "x86_64", "lispium-windows-x86_64.zip"),
    ]
}

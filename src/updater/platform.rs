//! Update channel identifiers.
//!
//! A [`PlatformKey`] names one OS + architecture update channel. The set is
//! closed: the auto-update client only ever asks for one of these four keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::Error;

/// CPU architecture of an update channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    X86_64,
    /// AArch64 / ARM64 (64-bit) - Apple Silicon
    AArch64,
}

/// Operating system family, which decides how installers are found and archived.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PlatformFamily {
    /// `.app` bundles, archived as `.app.tar.gz`
    MacOs,
    /// AppImage files, archived as `.AppImage.tar.gz`
    Linux,
    /// NSIS or MSI installers, archived as `.nsis.zip` / `.msi.zip`
    Windows,
}

/// One update channel of a release.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum PlatformKey {
    /// macOS on Apple Silicon
    #[serde(rename = "darwin-aarch64")]
    DarwinAArch64,
    /// macOS on Intel
    #[serde(rename = "darwin-x86_64")]
    DarwinX86_64,
    /// Linux x86_64 (AppImage)
    #[serde(rename = "linux-x86_64")]
    LinuxX86_64,
    /// Windows x86_64
    #[serde(rename = "windows-x86_64")]
    WindowsX86_64,
}

impl PlatformKey {
    /// Every key, in the order fragments are read during a merge.
    pub const ALL: [PlatformKey; 4] = [
        PlatformKey::DarwinAArch64,
        PlatformKey::DarwinX86_64,
        PlatformKey::LinuxX86_64,
        PlatformKey::WindowsX86_64,
    ];

    /// Wire name used in manifests and file names.
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformKey::DarwinAArch64 => "darwin-aarch64",
            PlatformKey::DarwinX86_64 => "darwin-x86_64",
            PlatformKey::LinuxX86_64 => "linux-x86_64",
            PlatformKey::WindowsX86_64 => "windows-x86_64",
        }
    }

    pub fn family(self) -> PlatformFamily {
        match self {
            PlatformKey::DarwinAArch64 | PlatformKey::DarwinX86_64 => PlatformFamily::MacOs,
            PlatformKey::LinuxX86_64 => PlatformFamily::Linux,
            PlatformKey::WindowsX86_64 => PlatformFamily::Windows,
        }
    }

    pub fn arch(self) -> Arch {
        match self {
            PlatformKey::DarwinAArch64 => Arch::AArch64,
            _ => Arch::X86_64,
        }
    }

    /// Architecture label embedded in macOS archive and asset names.
    pub fn macos_arch_label(self) -> &'static str {
        match self.arch() {
            Arch::AArch64 => "aarch64",
            Arch::X86_64 => "x64",
        }
    }

    /// File name of this platform's manifest fragment.
    pub fn fragment_file_name(self) -> String {
        format!("latest-{}.json", self.as_str())
    }

    /// Name of the per-platform directory the CI uploads build artifacts into.
    pub fn build_dir_name(self) -> String {
        format!("build-{}", self.as_str())
    }

    /// Prefix applied to flattened release asset names.
    pub fn asset_prefix(self) -> &'static str {
        match self {
            PlatformKey::DarwinAArch64 => "macOS-AppleSilicon-",
            PlatformKey::DarwinX86_64 => "macOS-Intel-",
            PlatformKey::LinuxX86_64 => "Linux-",
            PlatformKey::WindowsX86_64 => "Windows-",
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| {
                Error::UsageError(format!(
                    "unknown platform `{s}`, expected one of: {}",
                    PlatformKey::ALL.map(PlatformKey::as_str).join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_wire_name() {
        for key in PlatformKey::ALL {
            assert_eq!(key.as_str().parse::<PlatformKey>().unwrap(), key);
        }
    }

    #[test]
    fn rejects_unknown_platform() {
        let err = "linux-aarch64".parse::<PlatformKey>().unwrap_err();
        assert!(matches!(err, Error::UsageError(_)));
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&PlatformKey::DarwinX86_64).unwrap();
        assert_eq!(json, "\"darwin-x86_64\"");
    }

    #[test]
    fn macos_labels() {
        assert_eq!(PlatformKey::DarwinAArch64.macos_arch_label(), "aarch64");
        assert_eq!(PlatformKey::DarwinX86_64.macos_arch_label(), "x64");
    }
}

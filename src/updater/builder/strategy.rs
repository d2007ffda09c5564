//! Installer discovery strategies.
//!
//! Each platform family has an ordered list of strategies. They are tried in
//! sequence and the first one that yields a candidate wins; the winning
//! strategy's name travels with the candidate so it can be logged.

use std::path::{Path, PathBuf};

use crate::updater::error::{Error, ErrorExt, Result};
use crate::updater::platform::{PlatformFamily, PlatformKey};

/// Kind of installer artifact an updater archive is derived from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InstallerKind {
    /// `.app` bundle directory
    AppBundle,
    /// `.AppImage` file
    AppImage,
    /// NSIS `.exe` setup
    Nsis,
    /// `.msi` package
    Msi,
}

impl InstallerKind {
    fn suffix(self) -> &'static str {
        match self {
            InstallerKind::AppBundle => ".app",
            InstallerKind::AppImage => ".AppImage",
            InstallerKind::Nsis => ".exe",
            InstallerKind::Msi => ".msi",
        }
    }

    fn is_directory(self) -> bool {
        matches!(self, InstallerKind::AppBundle)
    }

    /// Suffix appended to the installer's base name for the updater archive.
    pub fn archive_suffix(self) -> &'static str {
        match self {
            InstallerKind::AppBundle => ".app.tar.gz",
            InstallerKind::AppImage => ".tar.gz",
            InstallerKind::Nsis => ".nsis.zip",
            InstallerKind::Msi => ".msi.zip",
        }
    }

    /// Classify a file name. Windows kinds are only reported for Windows lookups.
    pub fn from_file_name(name: &str) -> Option<Self> {
        [
            InstallerKind::AppBundle,
            InstallerKind::AppImage,
            InstallerKind::Nsis,
            InstallerKind::Msi,
        ]
        .into_iter()
        .find(|kind| name.ends_with(kind.suffix()) && name.len() > kind.suffix().len())
    }
}

/// The installer an updater archive will be built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallerCandidate {
    pub path: PathBuf,
    pub file_name: String,
    pub kind: InstallerKind,
    /// Name of the strategy that found it.
    pub strategy: &'static str,
}

/// One way of looking for an installer.
#[derive(Clone, Copy, Debug)]
enum Strategy {
    /// Look in the first existing directory of `dirs` for `kinds`.
    Subdir {
        name: &'static str,
        dirs: &'static [&'static str],
        kinds: &'static [InstallerKind],
    },
    /// Scan every subdirectory (sorted) for any of `kinds`.
    Scan {
        name: &'static str,
        kinds: &'static [InstallerKind],
    },
}

fn strategies(family: PlatformFamily) -> &'static [Strategy] {
    const MACOS: &[Strategy] = &[Strategy::Subdir {
        name: "macos-app-bundle",
        dirs: &["macos"],
        kinds: &[InstallerKind::AppBundle],
    }];
    const LINUX: &[Strategy] = &[Strategy::Subdir {
        name: "appimage-dir",
        dirs: &["appimage", "AppImage"],
        kinds: &[InstallerKind::AppImage],
    }];
    const WINDOWS: &[Strategy] = &[
        Strategy::Subdir {
            name: "nsis-dir",
            dirs: &["nsis"],
            kinds: &[InstallerKind::Nsis],
        },
        Strategy::Subdir {
            name: "msi-dir",
            dirs: &["msi"],
            kinds: &[InstallerKind::Msi],
        },
        Strategy::Scan {
            name: "installer-scan",
            kinds: &[InstallerKind::Nsis, InstallerKind::Msi],
        },
    ];

    match family {
        PlatformFamily::MacOs => MACOS,
        PlatformFamily::Linux => LINUX,
        PlatformFamily::Windows => WINDOWS,
    }
}

/// Find the installer for `platform` under `bundle_root`.
///
/// Blocking; call from `spawn_blocking` in async contexts.
pub fn resolve_installer(platform: PlatformKey, bundle_root: &Path) -> Result<InstallerCandidate> {
    let mut searched = Vec::new();

    for strategy in strategies(platform.family()) {
        let found = match *strategy {
            Strategy::Subdir { name, dirs, kinds } => {
                let Some(dir) = dirs
                    .iter()
                    .map(|d| bundle_root.join(d))
                    .find(|d| d.is_dir())
                else {
                    searched.extend(dirs.iter().map(|d| bundle_root.join(d)));
                    continue;
                };
                searched.push(dir.clone());
                pick_in_dir(&dir, kinds, name)?
            }
            Strategy::Scan { name, kinds } => {
                let mut found = None;
                for dir in subdirectories(bundle_root)? {
                    let dir = bundle_root.join(dir);
                    searched.push(dir.clone());
                    if let Some(candidate) = pick_in_dir(&dir, kinds, name)? {
                        found = Some(candidate);
                        break;
                    }
                }
                found
            }
        };

        match found {
            Some(candidate) => {
                log::info!(
                    "Installer for {} found by strategy `{}`: {}",
                    platform,
                    candidate.strategy,
                    candidate.path.display()
                );
                return Ok(candidate);
            }
            None => log::debug!("Strategy did not match for {}", platform),
        }
    }

    Err(Error::MissingInstaller {
        platform,
        bundle_root: bundle_root.to_path_buf(),
        searched,
        present: subdirectories(bundle_root).unwrap_or_default(),
    })
}

/// Pick one installer in `dir`, trying `kinds` in preference order.
///
/// Several matches of the same kind resolve to the first file name in
/// lexicographic order rather than failing.
fn pick_in_dir(
    dir: &Path,
    kinds: &[InstallerKind],
    strategy: &'static str,
) -> Result<Option<InstallerCandidate>> {
    let mut entries: Vec<(String, bool)> = Vec::new();
    for entry in std::fs::read_dir(dir).fs_context("reading installer directory", dir)? {
        let entry = entry.fs_context("reading installer directory entry", dir)?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_dir = entry.path().is_dir();
        entries.push((name, is_dir));
    }
    entries.sort();

    for &kind in kinds {
        let matches: Vec<&String> = entries
            .iter()
            .filter(|(name, is_dir)| {
                *is_dir == kind.is_directory() && InstallerKind::from_file_name(name) == Some(kind)
            })
            .map(|(name, _)| name)
            .collect();

        let Some(first) = matches.first() else {
            continue;
        };
        if matches.len() > 1 {
            log::warn!(
                "{} candidate installers in {}, using the first: {} (others: {})",
                matches.len(),
                dir.display(),
                first,
                matches[1..]
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        return Ok(Some(InstallerCandidate {
            path: dir.join(first.as_str()),
            file_name: (*first).clone(),
            kind,
            strategy,
        }));
    }

    Ok(None)
}

/// Names of the immediate subdirectories of `dir`, sorted.
fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).fs_context("reading bundle root", dir)? {
        let entry = entry.fs_context("reading bundle root entry", dir)?;
        if entry.path().is_dir()
            && let Ok(name) = entry.file_name().into_string()
        {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

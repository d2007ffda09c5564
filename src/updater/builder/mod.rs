//! Updater archive creation.
//!
//! Produces exactly one compressed updater archive per platform from the
//! installer found in a [`BuildOutputTree`]:
//!
//! | Family | Installer | Archive |
//! |--------|-----------|---------|
//! | macOS | `<App>.app` | `<App>_<version>_<arch>.app.tar.gz` |
//! | Linux | `<file>.AppImage` | `<file>.AppImage.tar.gz` |
//! | Windows | `<base>.exe` / `<base>.msi` | `<base>.nsis.zip` / `<base>.msi.zip` |
//!
//! The archive is written next to the installer it was built from.
//!
//! # Module Organization
//!
//! - [`strategy`] - ordered installer discovery strategies
//! - `archive` - tar.gz / zip writers
//! - `checksum` - SHA-256 of the finished archive

mod archive;
mod checksum;
pub mod strategy;

use std::path::PathBuf;

use crate::updater::error::{Context, ErrorExt, Result};
use crate::updater::locator::BuildOutputTree;
use crate::updater::platform::{PlatformFamily, PlatformKey};

pub use checksum::calculate_sha256;
pub use strategy::{InstallerCandidate, InstallerKind, resolve_installer};

/// A finished updater archive.
#[derive(Debug, Clone)]
pub struct BundledArchive {
    pub platform: PlatformKey,
    /// Full path of the archive.
    pub path: PathBuf,
    /// Final asset name, as uploaded to the release.
    pub file_name: String,
    /// Installer the archive was built from.
    pub installer: InstallerCandidate,
    /// Archive size in bytes.
    pub size: u64,
    /// SHA-256 of the archive.
    pub checksum: String,
}

impl BundledArchive {
    /// Where the signing tool leaves the detached signature.
    pub fn signature_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".sig");
        PathBuf::from(name)
    }
}

/// Updater archive name for an installer.
///
/// A pure function of platform, version and installer file name; the
/// architecture comes from the platform key.
pub fn updater_archive_name(platform: PlatformKey, version: &str, installer_file_name: &str) -> String {
    match platform.family() {
        PlatformFamily::MacOs => {
            let app = installer_file_name
                .strip_suffix(".app")
                .unwrap_or(installer_file_name);
            format!(
                "{app}_{version}_{}{}",
                platform.macos_arch_label(),
                InstallerKind::AppBundle.archive_suffix()
            )
        }
        PlatformFamily::Linux => {
            format!("{installer_file_name}{}", InstallerKind::AppImage.archive_suffix())
        }
        PlatformFamily::Windows => {
            let (base, kind) = match installer_file_name.strip_suffix(".msi") {
                Some(base) => (base, InstallerKind::Msi),
                None => (
                    installer_file_name
                        .strip_suffix(".exe")
                        .unwrap_or(installer_file_name),
                    InstallerKind::Nsis,
                ),
            };
            format!("{base}{}", kind.archive_suffix())
        }
    }
}

/// Build the updater archive for one platform.
///
/// Any archive left over from a previous run under the same name is replaced.
pub async fn build_updater_archive(tree: &BuildOutputTree, version: &str) -> Result<BundledArchive> {
    let platform = tree.platform;
    let root = tree.root.clone();
    let installer = tokio::task::spawn_blocking(move || resolve_installer(platform, &root))
        .await
        .context("installer discovery task panicked")??;

    let file_name = updater_archive_name(platform, version, &installer.file_name);
    let dir = installer
        .path
        .parent()
        .context("installer has no parent directory")?
        .to_path_buf();
    let path = dir.join(&file_name);

    match tokio::fs::remove_file(&path).await {
        Ok(()) => log::debug!("Removed stale updater archive {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).fs_context("removing stale updater archive", &path),
    }

    log::info!("Creating {} from {}", file_name, installer.path.display());
    {
        let source = installer.path.clone();
        let target = path.clone();
        let kind = installer.kind;
        tokio::task::spawn_blocking(move || match kind {
            InstallerKind::AppBundle | InstallerKind::AppImage => {
                archive::write_tar_gz(&source, &target)
            }
            InstallerKind::Nsis | InstallerKind::Msi => archive::write_zip(&source, &target),
        })
        .await
        .context("archive task panicked")??;
    }

    let size = tokio::fs::metadata(&path)
        .await
        .fs_context("reading updater archive metadata", &path)?
        .len();
    let checksum = calculate_sha256(&path).await?;

    log::info!(
        "✓ Created updater archive {} ({} bytes, sha256 {})",
        path.display(),
        size,
        checksum
    );

    Ok(BundledArchive {
        platform,
        path,
        file_name,
        installer,
        size,
        checksum,
    })
}

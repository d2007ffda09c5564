//! Per-job release artifact collection.
//!
//! A platform build job uploads only what the release needs: installers,
//! updater archives, signatures and the platform's manifest fragment. This
//! copies exactly those out of the [`BuildOutputTree`].

use std::path::{Path, PathBuf};

use super::error::{Error, ErrorExt, Result};
use super::locator::BuildOutputTree;
use super::platform::PlatformFamily;
use super::utils::fs::{copy_dir, copy_file, create_dir_all, remove_dir_all};

/// What [`collect_release_artifacts`] copied.
#[derive(Clone, Debug, Default)]
pub struct CollectReport {
    pub copied: Vec<PathBuf>,
    /// Entries in the output directory afterwards, including earlier runs' files.
    pub item_count: usize,
}

/// Subdirectories of the bundle root that hold this family's release files.
fn source_dirs(family: PlatformFamily) -> &'static [&'static str] {
    match family {
        PlatformFamily::MacOs => &["macos"],
        PlatformFamily::Linux => &["appimage", "AppImage"],
        PlatformFamily::Windows => &["nsis", "msi"],
    }
}

/// Whether an entry of a source directory belongs in the release.
fn is_release_file(family: PlatformFamily, name: &str, is_dir: bool) -> bool {
    match family {
        PlatformFamily::MacOs if is_dir => name.ends_with(".app"),
        PlatformFamily::MacOs => name.ends_with(".app.tar.gz") || name.ends_with(".sig"),
        PlatformFamily::Linux => {
            !is_dir && (name.ends_with(".AppImage.tar.gz") || name.ends_with(".sig"))
        }
        PlatformFamily::Windows => {
            !is_dir
                && [".nsis.zip", ".msi.zip", ".sig", ".exe", ".msi"]
                    .iter()
                    .any(|suffix| name.ends_with(suffix))
        }
    }
}

/// Copy the release files of `tree` into `out_dir`.
///
/// macOS requires its `macos/` directory; Linux uses the first of `appimage/`
/// and `AppImage/` that exists; Windows reads both `nsis/` and `msi/`.
pub async fn collect_release_artifacts(tree: &BuildOutputTree, out_dir: &Path) -> Result<CollectReport> {
    let family = tree.platform.family();
    let mut dirs = Vec::new();
    for name in source_dirs(family) {
        let dir = tree.root.join(name);
        if tokio::fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            dirs.push(dir);
            if family == PlatformFamily::Linux {
                break;
            }
        }
    }
    if family == PlatformFamily::MacOs && dirs.is_empty() {
        return Err(Error::MissingInput {
            what: format!("macOS bundle directory for {}", tree.platform),
            attempted: vec![tree.root.join("macos")],
        });
    }

    create_dir_all(out_dir, false).await?;
    let mut report = CollectReport::default();

    for dir in &dirs {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .fs_context("reading bundle directory", dir)?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .fs_context("reading bundle directory entry", dir)?
        {
            let is_dir = entry
                .file_type()
                .await
                .fs_context("reading file type", entry.path())?
                .is_dir();
            if let Ok(name) = entry.file_name().into_string() {
                names.push((name, is_dir));
            }
        }
        names.sort();

        for (name, is_dir) in names {
            if !is_release_file(family, &name, is_dir) {
                continue;
            }
            let source = dir.join(&name);
            let destination = out_dir.join(&name);
            if is_dir {
                remove_dir_all(&destination).await?;
                copy_dir(&source, &destination).await?;
            } else {
                copy_file(&source, &destination).await?;
            }
            report.copied.push(destination);
        }
    }

    let fragment = tree.fragment_path();
    if tokio::fs::try_exists(&fragment).await.unwrap_or(false) {
        let destination = out_dir.join(tree.platform.fragment_file_name());
        copy_file(&fragment, &destination).await?;
        report.copied.push(destination);
    } else {
        log::warn!("No manifest fragment at {}", fragment.display());
    }

    let mut entries = tokio::fs::read_dir(out_dir)
        .await
        .fs_context("reading output directory", out_dir)?;
    while entries
        .next_entry()
        .await
        .fs_context("reading output directory entry", out_dir)?
        .is_some()
    {
        report.item_count += 1;
    }

    log::info!(
        "Collected {} file(s) for {} into {}",
        report.copied.len(),
        tree.platform,
        out_dir.display()
    );
    Ok(report)
}

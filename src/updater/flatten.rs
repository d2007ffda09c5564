//! Release asset flattening.
//!
//! CI downloads every platform job's artifacts into `artifacts/build-<key>/`.
//! Release pages want one flat directory, and both macOS jobs produce an
//! identically named `.app`, so every asset gets a platform prefix and `.app`
//! bundles additionally get an architecture suffix.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::{Context, Result};
use super::manifest::MANIFEST_FILE_NAME;
use super::platform::{PlatformFamily, PlatformKey};
use super::utils::fs::{copy_dir, copy_file, create_dir_all, remove_dir_all};

/// One asset placed in the flat directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlattenedAsset {
    pub platform: PlatformKey,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// `.app` bundles are copied as whole directories.
    pub is_bundle: bool,
}

/// What [`flatten_release_assets`] did.
#[derive(Clone, Debug, Default)]
pub struct FlattenReport {
    pub assets: Vec<FlattenedAsset>,
    /// Platforms whose `build-<key>` directory was absent.
    pub skipped_platforms: Vec<PlatformKey>,
    /// Where `latest.json` was copied, if it existed.
    pub manifest: Option<PathBuf>,
}

impl FlattenReport {
    /// Entries written to the output directory.
    pub fn item_count(&self) -> usize {
        self.assets.len() + usize::from(self.manifest.is_some())
    }
}

/// Name of an asset in the flat directory.
pub fn flattened_name(platform: PlatformKey, name: &str, is_bundle: bool) -> String {
    let name = match (is_bundle, platform.family(), name.strip_suffix(".app")) {
        (true, PlatformFamily::MacOs, Some(stem)) => {
            format!("{stem}_{}.app", platform.macos_arch_label())
        }
        _ => name.to_string(),
    };
    format!("{}{}", platform.asset_prefix(), name)
}

fn is_fragment(name: &str) -> bool {
    name.starts_with("latest-") && name.ends_with(".json")
}

/// Walk one platform tree and decide what goes where.
///
/// Blocking; `.app` directories are not descended into.
fn plan_platform(platform: PlatformKey, tree: &Path, out_dir: &Path) -> Result<Vec<FlattenedAsset>> {
    let mut planned = Vec::new();
    let mut seen: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut walker = WalkDir::new(tree)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str() else {
            log::warn!("Skipping non UTF-8 path {}", entry.path().display());
            continue;
        };

        // The walk does not follow links, so a linked directory shows up as a link.
        if entry.path_is_symlink() && std::fs::metadata(entry.path()).is_ok_and(|m| m.is_dir()) {
            log::warn!("Skipping symlinked directory {}", entry.path().display());
            continue;
        }

        let is_bundle = entry.file_type().is_dir() && name.ends_with(".app");
        if entry.file_type().is_dir() && !is_bundle {
            continue;
        }
        if is_bundle {
            walker.skip_current_dir();
        } else if is_fragment(name) {
            continue;
        }

        let destination = out_dir.join(flattened_name(platform, name, is_bundle));
        if let Some(previous) = seen.insert(destination.clone(), entry.path().to_path_buf()) {
            log::warn!(
                "{} and {} both flatten to {}; keeping the latter",
                previous.display(),
                entry.path().display(),
                destination.display()
            );
            planned.retain(|a: &FlattenedAsset| a.destination != destination);
        }
        planned.push(FlattenedAsset {
            platform,
            source: entry.path().to_path_buf(),
            destination,
            is_bundle,
        });
    }

    Ok(planned)
}

/// Flatten `artifacts_dir/build-<key>/**` into `out_dir`.
///
/// `latest.json` at `manifest`, when present, is copied without a prefix.
pub async fn flatten_release_assets(
    artifacts_dir: &Path,
    out_dir: &Path,
    manifest: &Path,
) -> Result<FlattenReport> {
    create_dir_all(out_dir, false).await?;
    let mut report = FlattenReport::default();

    for platform in PlatformKey::ALL {
        let tree = artifacts_dir.join(platform.build_dir_name());
        if !tokio::fs::metadata(&tree).await.map(|m| m.is_dir()).unwrap_or(false) {
            log::debug!("No artifacts for {} at {}", platform, tree.display());
            report.skipped_platforms.push(platform);
            continue;
        }

        let planned = {
            let out_dir = out_dir.to_path_buf();
            tokio::task::spawn_blocking(move || plan_platform(platform, &tree, &out_dir))
                .await
                .context("asset planning task panicked")??
        };

        for asset in planned {
            if asset.is_bundle {
                remove_dir_all(&asset.destination).await?;
                copy_dir(&asset.source, &asset.destination).await?;
            } else {
                copy_file(&asset.source, &asset.destination).await?;
            }
            log::debug!(
                "{} -> {}",
                asset.source.display(),
                asset.destination.display()
            );
            report.assets.push(asset);
        }
    }

    if tokio::fs::try_exists(manifest).await.unwrap_or(false) {
        let destination = out_dir.join(MANIFEST_FILE_NAME);
        copy_file(manifest, &destination).await?;
        report.manifest = Some(destination);
    }

    log::info!(
        "Flattened {} item(s) into {}",
        report.item_count(),
        out_dir.display()
    );
    Ok(report)
}

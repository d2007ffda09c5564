//! Update manifest types and fragment merging.
//!
//! Each signing job writes one `latest-<platform>.json` fragment. Once every
//! job has finished, [`merge_fragments`] folds them into the single
//! `latest.json` the auto-update client polls.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{Error, ErrorExt, Result};
use super::platform::PlatformKey;
use super::utils::fs::write_atomic;

/// Release notes used when none are configured.
pub const DEFAULT_NOTES: &str = "See release notes on GitHub";

/// Manifest file name.
pub const MANIFEST_FILE_NAME: &str = "latest.json";

/// Where one platform's archive lives and how to verify it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub signature: String,
    pub url: String,
}

/// One platform's contribution to the manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFragment {
    pub platform_key: PlatformKey,
    pub version: String,
    pub platform_info: PlatformInfo,
}

impl ManifestFragment {
    /// Pretty JSON, as written to disk.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The unified version manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub notes: String,
    pub pub_date: String,
    pub platforms: BTreeMap<PlatformKey, PlatformInfo>,
}

/// Format a timestamp the way the update client expects: UTC, whole seconds, `Z`.
pub fn format_pub_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Merge the fragments found in `dirs`, stamping the current time.
pub async fn merge_fragments(dirs: &[PathBuf], notes: &str) -> Result<Manifest> {
    merge_fragments_at(dirs, notes, Utc::now()).await
}

/// Merge the fragments found in `dirs` with an explicit publication time.
///
/// Directories are read in the given order and, within each, platforms in
/// [`PlatformKey::ALL`] order. A later fragment for the same platform replaces
/// an earlier one.
pub async fn merge_fragments_at(
    dirs: &[PathBuf],
    notes: &str,
    now: DateTime<Utc>,
) -> Result<Manifest> {
    let mut platforms: BTreeMap<PlatformKey, (PlatformInfo, PathBuf)> = BTreeMap::new();
    let mut version = String::new();

    for dir in dirs {
        if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
            log::debug!("Fragment directory absent, skipping: {}", dir.display());
            continue;
        }

        for key in PlatformKey::ALL {
            let path = dir.join(key.fragment_file_name());
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                continue;
            }

            let Some(fragment) = read_fragment(&path).await else {
                continue;
            };

            if !fragment.version.is_empty() {
                version = fragment.version.clone();
            }
            if let Some((_, previous)) = platforms.get(&fragment.platform_key) {
                log::warn!(
                    "Duplicate fragment for {}: {} overrides {}",
                    fragment.platform_key,
                    path.display(),
                    previous.display()
                );
            }
            log::info!("Added {} from {}", fragment.platform_key, path.display());
            platforms.insert(fragment.platform_key, (fragment.platform_info, path));
        }
    }

    if platforms.is_empty() {
        return Err(Error::MergeNoData {
            dirs: dirs.to_vec(),
        });
    }

    Ok(Manifest {
        version,
        notes: notes.to_string(),
        pub_date: format_pub_date(now),
        platforms: platforms
            .into_iter()
            .map(|(key, (info, _))| (key, info))
            .collect(),
    })
}

/// Parse a fragment leniently.
///
/// Unreadable or malformed files, and fragments missing `platformKey` or
/// `platformInfo`, are skipped with a warning rather than failing the merge.
async fn read_fragment(path: &Path) -> Option<ManifestFragment> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Skipping unreadable fragment {}: {}", path.display(), e);
            return None;
        }
    };
    let raw: Value = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Skipping malformed fragment {}: {}", path.display(), e);
            return None;
        }
    };

    let platform_key = raw
        .get("platformKey")
        .and_then(Value::as_str)
        .and_then(|key| key.parse::<PlatformKey>().ok());
    let platform_info = raw
        .get("platformInfo")
        .cloned()
        .and_then(|info| serde_json::from_value::<PlatformInfo>(info).ok());

    let (Some(platform_key), Some(platform_info)) = (platform_key, platform_info) else {
        log::warn!(
            "Skipping fragment without a usable platformKey/platformInfo: {}",
            path.display()
        );
        return None;
    };

    Some(ManifestFragment {
        platform_key,
        version: raw
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        platform_info,
    })
}

/// Write the manifest as pretty JSON with a trailing newline.
pub async fn write_manifest(manifest: &Manifest, path: &Path) -> Result<()> {
    let mut rendered = serde_json::to_string_pretty(manifest)?;
    rendered.push('\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating manifest directory", parent)?;
    }
    write_atomic(path, rendered).await?;
    log::info!(
        "Wrote {} with {} platform(s)",
        path.display(),
        manifest.platforms.len()
    );
    Ok(())
}

//! Build output discovery.
//!
//! Cross-compiled builds (`--target <triple>`) put bundles under
//! `target/<triple>/release/bundle`; native builds use `target/release/bundle`.

use std::path::{Path, PathBuf};

use super::error::{Error, Result};
use super::platform::PlatformKey;

/// Root of one platform's native bundle output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOutputTree {
    pub platform: PlatformKey,
    pub root: PathBuf,
}

impl BuildOutputTree {
    /// Where this platform's manifest fragment lives.
    pub fn fragment_path(&self) -> PathBuf {
        self.root.join(self.platform.fragment_file_name())
    }
}

/// Candidate bundle roots for a target triple, most specific first.
pub fn candidate_roots(target_dir: &Path, target_triple: &str) -> [PathBuf; 2] {
    [
        target_dir.join(target_triple).join("release").join("bundle"),
        target_dir.join("release").join("bundle"),
    ]
}

/// Resolve the bundle root for `platform`.
///
/// A missing tree means the upstream build did not run or did not finish,
/// so this fails immediately with every attempted path.
pub async fn locate_build_output(
    platform: PlatformKey,
    target_triple: &str,
    target_dir: &Path,
) -> Result<BuildOutputTree> {
    if target_triple.trim().is_empty() {
        return Err(Error::UsageError("target triple must not be empty".to_string()));
    }

    let candidates = candidate_roots(target_dir, target_triple);
    for candidate in &candidates {
        let is_dir = tokio::fs::metadata(candidate)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if is_dir {
            log::info!("Using bundle root for {}: {}", platform, candidate.display());
            return Ok(BuildOutputTree {
                platform,
                root: candidate.clone(),
            });
        }
        log::debug!("Bundle root candidate absent: {}", candidate.display());
    }

    Err(Error::MissingInput {
        what: format!("bundle root for {platform} ({target_triple})"),
        attempted: candidates.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prefers_target_specific_tree() {
        let dir = tempfile::tempdir().unwrap();
        let specific = dir.path().join("aarch64-apple-darwin/release/bundle");
        std::fs::create_dir_all(&specific).unwrap();
        std::fs::create_dir_all(dir.path().join("release/bundle")).unwrap();

        let tree = locate_build_output(PlatformKey::DarwinAArch64, "aarch64-apple-darwin", dir.path())
            .await
            .unwrap();
        assert_eq!(tree.root, specific);
        assert_eq!(
            tree.fragment_path(),
            specific.join("latest-darwin-aarch64.json")
        );
    }

    #[tokio::test]
    async fn falls_back_to_native_tree() {
        let dir = tempfile::tempdir().unwrap();
        let native = dir.path().join("release/bundle");
        std::fs::create_dir_all(&native).unwrap();

        let tree = locate_build_output(PlatformKey::LinuxX86_64, "x86_64-unknown-linux-gnu", dir.path())
            .await
            .unwrap();
        assert_eq!(tree.root, native);
    }

    #[tokio::test]
    async fn missing_tree_reports_both_paths() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_build_output(PlatformKey::WindowsX86_64, "x86_64-pc-windows-msvc", dir.path())
            .await
            .unwrap_err();
        match err {
            Error::MissingInput { attempted, .. } => {
                assert_eq!(attempted.len(), 2);
                assert!(attempted[0].ends_with("x86_64-pc-windows-msvc/release/bundle"));
                assert!(attempted[1].ends_with("release/bundle"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! Updater archive signing.
//!
//! One signing run turns a [`BuildOutputTree`] into a signed updater archive
//! plus the platform's manifest fragment:
//!
//! ```text
//! Idle -> KeyValidated -> ArchiveReady -> Signed -> FragmentWritten
//!   \________________________\______________\________-> Failed
//! ```
//!
//! Key material and passphrase are checked before any archive is built. The
//! private key only exists on disk inside a [`ScopedKeyFile`] for the duration
//! of the signing tool invocation, and a fragment is written only when a
//! non-empty signature was actually produced.

mod download_url;
mod tool;

use std::future::Future;
use std::path::PathBuf;

pub use download_url::{DEFAULT_REPOSITORY, DEFAULT_URL_TEMPLATE, UrlTemplate};
pub use tool::{PASSPHRASE_ENV, SigningTool, TauriCli};

use super::builder::{BundledArchive, build_updater_archive};
use super::error::{Error, ErrorExt, Result};
use super::keys::{KeyPolicy, validate_key_material};
use super::locator::BuildOutputTree;
use super::manifest::{ManifestFragment, PlatformInfo};
use super::secret::{ScopedKeyFile, SecretString};
use super::utils::fs::write_atomic;

/// Progress of one signing run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SigningStage {
    Idle,
    KeyValidated,
    ArchiveReady,
    Signed,
    FragmentWritten,
    Failed,
}

/// Inputs of a signing run that do not change between platforms.
#[derive(Clone, Debug)]
pub struct SigningSettings {
    /// Base64 transport encoding of the private key.
    pub key_material: Option<SecretString>,
    pub passphrase: Option<SecretString>,
    pub key_policy: KeyPolicy,
    pub url_template: UrlTemplate,
    /// `owner/name` substituted into the URL template.
    pub repository: String,
    /// Directory for the temporary key file; the system temp dir when `None`.
    pub key_dir: Option<PathBuf>,
}

impl Default for SigningSettings {
    fn default() -> Self {
        Self {
            key_material: None,
            passphrase: None,
            key_policy: KeyPolicy::default(),
            url_template: UrlTemplate::default(),
            repository: DEFAULT_REPOSITORY.to_string(),
            key_dir: None,
        }
    }
}

/// Result of a successful signing run.
#[derive(Clone, Debug)]
pub struct SignOutcome {
    pub archive: BundledArchive,
    pub signature_path: PathBuf,
    pub fragment: ManifestFragment,
    pub fragment_path: PathBuf,
}

/// Drives one platform through the signing stages.
#[derive(Debug)]
pub struct UpdaterSigner<'a, T> {
    tool: &'a T,
    settings: &'a SigningSettings,
    stage: SigningStage,
}

impl<'a, T: SigningTool + Sync> UpdaterSigner<'a, T> {
    pub fn new(tool: &'a T, settings: &'a SigningSettings) -> Self {
        Self {
            tool,
            settings,
            stage: SigningStage::Idle,
        }
    }

    /// Stage reached by the most recent run.
    pub fn stage(&self) -> SigningStage {
        self.stage
    }

    /// Build, sign and describe the updater archive for `tree`.
    ///
    /// A termination signal (Ctrl-C, or SIGTERM on Unix) during the signing
    /// tool run aborts with [`Error::Interrupted`].
    pub async fn sign(&mut self, tree: &BuildOutputTree, version: &str) -> Result<SignOutcome> {
        self.sign_until(tree, version, termination_signal()).await
    }

    /// Like [`UpdaterSigner::sign`], aborting when `shutdown` completes.
    pub async fn sign_until(
        &mut self,
        tree: &BuildOutputTree,
        version: &str,
        shutdown: impl Future<Output = ()>,
    ) -> Result<SignOutcome> {
        self.stage = SigningStage::Idle;
        match self.run(tree, version, shutdown).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::error!(
                    "Signing {} failed after stage {:?}: {}",
                    tree.platform,
                    self.stage,
                    e
                );
                self.stage = SigningStage::Failed;
                Err(e)
            }
        }
    }

    async fn run(
        &mut self,
        tree: &BuildOutputTree,
        version: &str,
        shutdown: impl Future<Output = ()>,
    ) -> Result<SignOutcome> {
        let settings = self.settings;

        let material = settings
            .key_material
            .as_ref()
            .ok_or_else(|| Error::InvalidKeyMaterial {
                reason: "no private key material supplied".to_string(),
            })?;
        let key = validate_key_material(material, &settings.key_policy)?;
        let passphrase = settings
            .passphrase
            .as_ref()
            .filter(|p| !p.is_empty())
            .ok_or(Error::MissingPassphrase)?;
        self.stage = SigningStage::KeyValidated;

        let archive = build_updater_archive(tree, version).await?;
        let signature_path = archive.signature_path();
        self.stage = SigningStage::ArchiveReady;

        // A leftover signature from an earlier run would mask a silent tool failure.
        match tokio::fs::remove_file(&signature_path).await {
            Ok(()) => log::debug!("Removed stale signature {}", signature_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).fs_context("removing stale signature", &signature_path),
        }

        let key_file = ScopedKeyFile::materialize(key.encoded(), settings.key_dir.as_deref())?;
        let signed = {
            let signing = self.tool.sign(&archive.path, key_file.path(), passphrase);
            tokio::select! {
                biased;
                _ = shutdown => Err(Error::Interrupted("signing")),
                result = signing => result,
            }
        };
        match (signed, key_file.dispose()) {
            (Err(e), Err(cleanup)) => {
                log::warn!("Could not remove signing key file after a failed run: {cleanup}");
                return Err(e);
            }
            (signed, disposed) => {
                signed?;
                disposed?;
            }
        }

        let signature = read_signature(&signature_path).await?;
        self.stage = SigningStage::Signed;
        log::info!(
            "✓ Signed {} (signature {} bytes)",
            archive.file_name,
            signature.len()
        );

        let url = settings
            .url_template
            .render(&settings.repository, version, &archive.file_name)?;
        let fragment = ManifestFragment {
            platform_key: tree.platform,
            version: version.to_string(),
            platform_info: PlatformInfo {
                signature,
                url: url.to_string(),
            },
        };
        let fragment_path = tree.fragment_path();
        write_atomic(&fragment_path, fragment.to_json()?).await?;
        self.stage = SigningStage::FragmentWritten;
        log::info!("✓ Wrote {}", fragment_path.display());

        Ok(SignOutcome {
            archive,
            signature_path,
            fragment,
            fragment_path,
        })
    }
}

async fn read_signature(path: &std::path::Path) -> Result<String> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::SignatureNotProduced {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e).fs_context("reading signature", path),
    };

    let signature = content.trim();
    if signature.is_empty() {
        return Err(Error::SignatureNotProduced {
            path: path.to_path_buf(),
        });
    }
    Ok(signature.to_string())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix. Never resolves if no handler can be installed.
async fn termination_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    log::warn!("Cannot listen for SIGTERM: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updater::platform::PlatformKey;
    use base64::Engine;
    use std::path::Path;
    use std::sync::Mutex;

    const PRIVATE: &str = "untrusted comment: rsign encrypted secret key\n\
        RWRTY0IyQm9hcmRlZEtleU1hdGVyaWFsRm9yVGVzdGluZ09ubHlOb3RBUmVhbEtleQ==\n";

    /// Records the key file it was handed and optionally writes a signature.
    #[derive(Default)]
    struct FakeTool {
        signature: Option<&'static str>,
        fail: bool,
        remove_key: bool,
        key_files: Mutex<Vec<PathBuf>>,
    }

    impl SigningTool for FakeTool {
        async fn sign(&self, archive: &Path, key_file: &Path, _passphrase: &SecretString) -> Result<()> {
            assert!(key_file.exists());
            self.key_files.lock().unwrap().push(key_file.to_path_buf());
            if self.remove_key {
                std::fs::remove_file(key_file).unwrap();
            }
            if self.fail {
                return Err(Error::SigningToolFailed {
                    program: "fake".into(),
                    reason: "exit 1".into(),
                });
            }
            if let Some(sig) = self.signature {
                let mut path = archive.as_os_str().to_owned();
                path.push(".sig");
                std::fs::write(PathBuf::from(path), sig).unwrap();
            }
            Ok(())
        }

        async fn generate(&self, _key_path: &Path, _passphrase: &SecretString) -> Result<()> {
            unreachable!("not used by the signer")
        }
    }

    fn settings(key_dir: &Path) -> SigningSettings {
        SigningSettings {
            key_material: Some(SecretString::new(
                base64::engine::general_purpose::STANDARD.encode(PRIVATE),
            )),
            passphrase: Some(SecretString::new("pw")),
            repository: "acme/xy".into(),
            key_dir: Some(key_dir.to_path_buf()),
            ..SigningSettings::default()
        }
    }

    fn linux_tree(root: &Path) -> BuildOutputTree {
        std::fs::create_dir_all(root.join("appimage")).unwrap();
        std::fs::write(root.join("appimage/xy_1.0.0_amd64.AppImage"), b"ELF").unwrap();
        BuildOutputTree {
            platform: PlatformKey::LinuxX86_64,
            root: root.to_path_buf(),
        }
    }

    fn key_dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
    }

    #[tokio::test]
    async fn writes_fragment_after_signature() {
        let bundle = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let tree = linux_tree(bundle.path());
        let tool = FakeTool {
            signature: Some("  SIGNATURE\n"),
            ..FakeTool::default()
        };
        let settings = settings(keys.path());

        let mut signer = UpdaterSigner::new(&tool, &settings);
        let outcome = signer.sign_until(&tree, "1.0.0", std::future::pending()).await.unwrap();

        assert_eq!(signer.stage(), SigningStage::FragmentWritten);
        assert_eq!(outcome.fragment.platform_info.signature, "SIGNATURE");
        assert_eq!(
            outcome.fragment.platform_info.url,
            "https://github.com/acme/xy/releases/download/app-v1.0.0/xy_1.0.0_amd64.AppImage.tar.gz"
        );
        assert!(tree.fragment_path().exists());
        assert!(key_dir_is_empty(keys.path()));
    }

    #[tokio::test]
    async fn missing_signature_removes_key_and_writes_nothing() {
        let bundle = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let tree = linux_tree(bundle.path());
        let tool = FakeTool::default();
        let settings = settings(keys.path());

        let mut signer = UpdaterSigner::new(&tool, &settings);
        let err = signer.sign_until(&tree, "1.0.0", std::future::pending()).await.unwrap_err();

        assert!(matches!(err, Error::SignatureNotProduced { .. }));
        assert_eq!(signer.stage(), SigningStage::Failed);
        assert!(!tree.fragment_path().exists());
        let used = tool.key_files.lock().unwrap();
        assert_eq!(used.len(), 1);
        assert!(!used[0].exists());
    }

    #[tokio::test]
    async fn tool_failure_removes_key() {
        let bundle = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let tree = linux_tree(bundle.path());
        let tool = FakeTool {
            fail: true,
            ..FakeTool::default()
        };
        let settings = settings(keys.path());

        let err = UpdaterSigner::new(&tool, &settings)
            .sign_until(&tree, "1.0.0", std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SigningToolFailed { .. }));
        assert!(key_dir_is_empty(keys.path()));
        assert!(!tree.fragment_path().exists());
    }

    #[tokio::test]
    async fn tool_failure_outranks_key_cleanup_failure() {
        let bundle = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let tree = linux_tree(bundle.path());
        let tool = FakeTool {
            fail: true,
            remove_key: true,
            ..FakeTool::default()
        };
        let settings = settings(keys.path());

        let err = UpdaterSigner::new(&tool, &settings)
            .sign_until(&tree, "1.0.0", std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SigningToolFailed { .. }));
    }

    #[tokio::test]
    async fn interruption_removes_key() {
        let bundle = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let tree = linux_tree(bundle.path());
        let tool = FakeTool {
            signature: Some("SIG"),
            ..FakeTool::default()
        };
        let settings = settings(keys.path());

        let err = UpdaterSigner::new(&tool, &settings)
            .sign_until(&tree, "1.0.0", std::future::ready(()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Interrupted(_)));
        assert!(key_dir_is_empty(keys.path()));
        assert!(!tree.fragment_path().exists());
    }

    #[tokio::test]
    async fn missing_passphrase_fails_before_archive() {
        let bundle = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let tree = linux_tree(bundle.path());
        let tool = FakeTool::default();
        let mut settings = settings(keys.path());
        settings.passphrase = Some(SecretString::new("  "));

        let mut signer = UpdaterSigner::new(&tool, &settings);
        let err = signer.sign_until(&tree, "1.0.0", std::future::pending()).await.unwrap_err();

        assert!(matches!(err, Error::MissingPassphrase));
        assert!(!bundle.path().join("appimage/xy_1.0.0_amd64.AppImage.tar.gz").exists());
        assert!(tool.key_files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_signature_does_not_count() {
        let bundle = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let tree = linux_tree(bundle.path());
        std::fs::write(
            bundle.path().join("appimage/xy_1.0.0_amd64.AppImage.tar.gz.sig"),
            "OLD",
        )
        .unwrap();
        let tool = FakeTool::default();
        let settings = settings(keys.path());

        let err = UpdaterSigner::new(&tool, &settings)
            .sign_until(&tree, "1.0.0", std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SignatureNotProduced { .. }));
    }
}

//! External signing capability.
//!
//! The pipeline only needs two things from a signing tool: detached-sign an
//! archive, and generate a keypair. [`SigningTool`] captures exactly that so
//! the rest of the crate never sees a tool's argument conventions.

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::updater::error::{Error, Result};
use crate::updater::secret::SecretString;

/// Environment variable the tauri CLI reads the key passphrase from.
pub const PASSPHRASE_ENV: &str = "TAURI_SIGNING_PRIVATE_KEY_PASSWORD";

/// A detached-signature capability.
pub trait SigningTool {
    /// Sign `archive` with the key stored at `key_file`.
    ///
    /// On success the tool is expected to leave `<archive>.sig` next to the
    /// archive. Callers verify that file exists; an `Ok` here is not proof.
    fn sign(
        &self,
        archive: &Path,
        key_file: &Path,
        passphrase: &SecretString,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Generate a keypair: private key at `key_path`, public key at `<key_path>.pub`.
    fn generate(
        &self,
        key_path: &Path,
        passphrase: &SecretString,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// The `tauri signer` subcommands, run as a child process.
#[derive(Clone, Debug)]
pub struct TauriCli {
    program: PathBuf,
}

impl TauriCli {
    /// Use an explicit program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find the tauri CLI.
    ///
    /// Order: the configured program, `tauri` on `PATH`, then the project's
    /// `node_modules/.bin/tauri`.
    pub fn resolve(configured: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut attempted = Vec::new();

        if let Some(program) = configured {
            match which::which(program) {
                Ok(path) => {
                    log::debug!("Using configured signing tool at {}", path.display());
                    return Ok(Self::new(path));
                }
                Err(e) => {
                    log::debug!("Configured signing tool {} unusable: {}", program.display(), e);
                    attempted.push(program.to_path_buf());
                }
            }
        }

        match which::which("tauri") {
            Ok(path) => {
                log::debug!("Found tauri CLI at: {}", path.display());
                return Ok(Self::new(path));
            }
            Err(e) => {
                log::debug!("tauri not found in PATH: {}", e);
                attempted.push(PathBuf::from("tauri"));
            }
        }

        let local = project_root
            .join("node_modules")
            .join(".bin")
            .join(if cfg!(windows) { "tauri.cmd" } else { "tauri" });
        if local.is_file() {
            log::debug!("Using project-local tauri CLI at {}", local.display());
            return Ok(Self::new(local));
        }
        attempted.push(local);

        Err(Error::MissingInput {
            what: "tauri signing CLI".to_string(),
            attempted,
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        // A hung or interrupted signing run must not outlive this process.
        cmd.kill_on_drop(true);
        cmd
    }

    async fn run(&self, mut cmd: tokio::process::Command, what: &str) -> Result<()> {
        let status = cmd.status().await.map_err(|e| Error::SigningToolFailed {
            program: self.program.display().to_string(),
            reason: format!("failed to execute for {what}: {e}"),
        })?;

        if !status.success() {
            return Err(Error::SigningToolFailed {
                program: self.program.display().to_string(),
                reason: format!("{what} exited with code {:?}", status.code()),
            });
        }
        Ok(())
    }
}

impl SigningTool for TauriCli {
    async fn sign(&self, archive: &Path, key_file: &Path, passphrase: &SecretString) -> Result<()> {
        let mut cmd = self.command();
        // The CLI does not reliably pick the passphrase up from the environment
        // in non-interactive sessions, so it is passed explicitly as well.
        cmd.arg("signer")
            .arg("sign")
            .arg("-f")
            .arg(key_file)
            .arg("-p")
            .arg(passphrase.expose())
            .arg(archive)
            .env(PASSPHRASE_ENV, passphrase.expose());

        log::info!("Signing {} with {}", archive.display(), self.program.display());
        self.run(cmd, "signer sign").await
    }

    async fn generate(&self, key_path: &Path, passphrase: &SecretString) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("signer")
            .arg("generate")
            .arg("-w")
            .arg(key_path)
            .arg("-p")
            .arg(passphrase.expose())
            .arg("-f")
            .arg("--ci");

        log::info!("Generating signing keypair with {}", self.program.display());
        self.run(cmd, "signer generate").await
    }
}

//! Git access for the release orchestrator.

use std::future::Future;
use std::path::{Path, PathBuf};

use super::error::{Error, Result};

/// Runs git subcommands in the project repository.
pub trait GitClient {
    /// Run `git <args>`; a nonzero exit is [`Error::GitFailed`].
    fn run(&self, args: &[String]) -> impl Future<Output = Result<()>> + Send;
}

/// The `git` binary, run as a child process.
///
/// Authentication is whatever the ambient git configuration provides
/// (ssh-agent, a credential helper, or the CI token).
#[derive(Clone, Debug)]
pub struct GitCli {
    repo_root: PathBuf,
    program: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            program: PathBuf::from("git"),
        }
    }

    /// Use a `git` found on `PATH`, failing early when there is none.
    pub fn detect(repo_root: impl Into<PathBuf>) -> Result<Self> {
        let program = which::which("git").map_err(|e| Error::MissingInput {
            what: format!("git executable ({e})"),
            attempted: vec![PathBuf::from("git")],
        })?;
        log::debug!("Found git at: {}", program.display());
        Ok(Self {
            repo_root: repo_root.into(),
            program,
        })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}

impl GitClient for GitCli {
    async fn run(&self, args: &[String]) -> Result<()> {
        let command = args.join(" ");
        log::debug!("git {} (in {})", command, self.repo_root.display());

        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .current_dir(&self.repo_root)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::GitFailed {
                command: command.clone(),
                reason: format!("failed to execute git: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let reason = [stderr.trim(), stdout.trim()]
                .into_iter()
                .find(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("exit code {:?}", output.status.code()));
            return Err(Error::GitFailed { command, reason });
        }

        Ok(())
    }
}

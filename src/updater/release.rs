//! Version bump, tag and push.
//!
//! Pushing a `v<version>` tag is what starts the per-platform build jobs, so
//! the orchestrator always (re)creates the tag on the bump commit. An existing
//! tag of the same name is deleted locally and, when pushing, remotely.

use std::path::{Path, PathBuf};

use super::error::Result;
use super::git::GitClient;
use super::sync::{SyncedDescriptor, sync_version, write_canonical_version};
use super::version::ReleaseVersion;

/// What to release and where to push it.
#[derive(Clone, Debug)]
pub struct ReleaseOptions {
    pub version: ReleaseVersion,
    /// `false` keeps every git operation local.
    pub push: bool,
    pub remote: String,
    pub branch: String,
}

/// Files the orchestrator edits.
#[derive(Clone, Debug)]
pub struct ReleaseFiles {
    /// Repository root; git paths are made relative to it.
    pub project_root: PathBuf,
    pub package_json: PathBuf,
    pub descriptors: Vec<PathBuf>,
}

/// Outcome of a release run.
#[derive(Clone, Debug)]
pub struct ReleaseReport {
    pub version: String,
    pub tag: String,
    /// `false` when there was nothing to commit.
    pub committed: bool,
    pub synced: Vec<SyncedDescriptor>,
    /// Commands the operator still has to run when pushing was skipped.
    pub manual_push_commands: Vec<String>,
}

/// Bumps the version and publishes the release tag through a [`GitClient`].
#[derive(Debug)]
pub struct ReleaseOrchestrator<'a, G> {
    git: &'a G,
    files: &'a ReleaseFiles,
}

impl<'a, G: GitClient + Sync> ReleaseOrchestrator<'a, G> {
    pub fn new(git: &'a G, files: &'a ReleaseFiles) -> Self {
        Self { git, files }
    }

    pub async fn release(&self, options: &ReleaseOptions) -> Result<ReleaseReport> {
        let version = options.version.as_str();
        let tag = options.version.tag_name();
        log::info!("Preparing release {} (tag {})", version, tag);

        write_canonical_version(&self.files.package_json, version).await?;
        log::info!("Set {} version to {}", self.files.package_json.display(), version);
        let (_, synced) = sync_version(&self.files.package_json, &self.files.descriptors).await?;

        let mut add = vec!["add".to_string(), self.git_path(&self.files.package_json)];
        add.extend(self.files.descriptors.iter().map(|d| self.git_path(d)));
        self.git.run(&add).await?;

        let committed = match self
            .git
            .run(&args(&["commit", "-m", &format!("chore: bump version to {version}")]))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                log::info!("Skipping commit (nothing to commit or already committed): {}", e);
                false
            }
        };

        match self.git.run(&args(&["tag", "-d", &tag])).await {
            Ok(()) => log::info!("Deleted local tag {}", tag),
            Err(e) => log::debug!("No local tag {} to delete: {}", tag, e),
        }
        if options.push {
            let refspec = format!(":refs/tags/{tag}");
            match self.git.run(&args(&["push", &options.remote, &refspec])).await {
                Ok(()) => log::info!("Deleted remote tag {}", tag),
                Err(e) => log::debug!("No remote tag {} to delete: {}", tag, e),
            }
        }

        self.git.run(&args(&["tag", &tag])).await?;
        log::info!("Created tag {}", tag);

        let push_commands = [
            args(&["push", &options.remote, &options.branch]),
            args(&["push", &options.remote, &tag]),
        ];
        let mut manual_push_commands = Vec::new();
        if options.push {
            for command in &push_commands {
                self.git.run(command).await?;
            }
            log::info!("Pushed {} and {} to {}", options.branch, tag, options.remote);
        } else {
            manual_push_commands = push_commands
                .iter()
                .map(|c| format!("git {}", c.join(" ")))
                .collect();
            log::info!("Skipping push; run later: {}", manual_push_commands.join(" && "));
        }

        Ok(ReleaseReport {
            version: version.to_string(),
            tag,
            committed,
            synced,
            manual_push_commands,
        })
    }

    fn git_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.files.project_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updater::error::Error;
    use std::sync::Mutex;

    /// Records every command; fails those whose first words match `failing`.
    #[derive(Default)]
    struct FakeGit {
        calls: Mutex<Vec<String>>,
        failing: Vec<&'static str>,
    }

    impl GitClient for FakeGit {
        async fn run(&self, args: &[String]) -> Result<()> {
            let line = args.join(" ");
            self.calls.lock().unwrap().push(line.clone());
            if self.failing.iter().any(|f| line.starts_with(f)) {
                return Err(Error::GitFailed {
                    command: line,
                    reason: "simulated".into(),
                });
            }
            Ok(())
        }
    }

    fn project() -> (tempfile::TempDir, ReleaseFiles) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{\n  \"name\": \"xy\",\n  \"version\": \"0.1.0\"\n}\n").unwrap();
        std::fs::create_dir_all(dir.path().join("src-tauri")).unwrap();
        std::fs::write(
            dir.path().join("src-tauri/Cargo.toml"),
            "[package]\nname = \"xy\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        let files = ReleaseFiles {
            project_root: dir.path().to_path_buf(),
            package_json: dir.path().join("package.json"),
            descriptors: vec![dir.path().join("src-tauri/Cargo.toml")],
        };
        (dir, files)
    }

    fn options(push: bool) -> ReleaseOptions {
        ReleaseOptions {
            version: ReleaseVersion::parse("v1.2.3").unwrap(),
            push,
            remote: "origin".into(),
            branch: "main".into(),
        }
    }

    #[tokio::test]
    async fn full_release_runs_git_in_order() {
        let (dir, files) = project();
        let git = FakeGit::default();

        let report = ReleaseOrchestrator::new(&git, &files)
            .release(&options(true))
            .await
            .unwrap();

        assert_eq!(report.tag, "v1.2.3");
        assert!(report.committed);
        assert!(report.manual_push_commands.is_empty());
        assert_eq!(
            *git.calls.lock().unwrap(),
            vec![
                "add package.json src-tauri/Cargo.toml",
                "commit -m chore: bump version to 1.2.3",
                "tag -d v1.2.3",
                "push origin :refs/tags/v1.2.3",
                "tag v1.2.3",
                "push origin main",
                "push origin v1.2.3",
            ]
        );
        let cargo = std::fs::read_to_string(dir.path().join("src-tauri/Cargo.toml")).unwrap();
        assert!(cargo.contains("version = \"1.2.3\""));
    }

    #[tokio::test]
    async fn tolerates_commit_and_tag_delete_failures() {
        let (_dir, files) = project();
        let git = FakeGit {
            failing: vec!["commit", "tag -d", "push origin :refs"],
            ..FakeGit::default()
        };

        let report = ReleaseOrchestrator::new(&git, &files)
            .release(&options(true))
            .await
            .unwrap();
        assert!(!report.committed);
    }

    #[tokio::test]
    async fn no_push_stays_local() {
        let (_dir, files) = project();
        let git = FakeGit::default();

        let report = ReleaseOrchestrator::new(&git, &files)
            .release(&options(false))
            .await
            .unwrap();

        assert!(git.calls.lock().unwrap().iter().all(|c| !c.starts_with("push")));
        assert_eq!(
            report.manual_push_commands,
            vec!["git push origin main", "git push origin v1.2.3"]
        );
    }

    #[tokio::test]
    async fn tag_creation_failure_is_fatal() {
        let (_dir, files) = project();
        let git = FakeGit {
            failing: vec!["tag v"],
            ..FakeGit::default()
        };

        let err = ReleaseOrchestrator::new(&git, &files)
            .release(&options(true))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GitFailed { .. }));
        assert!(!git.calls.lock().unwrap().iter().any(|c| c == "push origin main"));
    }
}

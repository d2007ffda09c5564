//! Resolved pipeline configuration.
//!
//! Values come from three layers, highest precedence first: command-line
//! flags and environment variables (handled by the CLI), an optional
//! `release.toml` at the project root, and built-in defaults matching the
//! standard tauri project layout. [`SettingsBuilder::build`] folds them into
//! an immutable [`Settings`] that every command receives.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::{Error, ErrorExt, Result};
use super::keys::KeyPolicy;
use super::manifest::{DEFAULT_NOTES, MANIFEST_FILE_NAME};
use super::release::ReleaseFiles;
use super::secret::SecretString;
use super::signer::{DEFAULT_REPOSITORY, SigningSettings, UrlTemplate};

/// Optional configuration file, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "release.toml";

/// Contents of `release.toml`. Relative paths are relative to the project root.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    pub app_config: Option<PathBuf>,
    pub package_json: Option<PathBuf>,
    pub descriptors: Option<Vec<PathBuf>>,
    pub target_dir: Option<PathBuf>,
    pub url_template: Option<String>,
    pub notes: Option<String>,
    pub branch: Option<String>,
    pub remote: Option<String>,
    pub signer_program: Option<PathBuf>,
}

impl FileSettings {
    /// Parse a configuration file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading release config", path)?;
        toml::from_str(&content)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))
    }

    /// Load `explicit` (which must exist) or `<project_root>/release.toml` if present.
    pub async fn discover(project_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            log::debug!("Loading release config from {}", path.display());
            return Self::load(path).await;
        }

        let default = project_root.join(CONFIG_FILE_NAME);
        if tokio::fs::try_exists(&default).await.unwrap_or(false) {
            log::debug!("Loading release config from {}", default.display());
            Self::load(&default).await
        } else {
            Ok(Self::default())
        }
    }
}

/// Immutable configuration shared by every command.
#[derive(Clone, Debug)]
pub struct Settings {
    project_root: PathBuf,
    package_json: PathBuf,
    descriptors: Vec<PathBuf>,
    app_config: PathBuf,
    target_dir: PathBuf,
    artifacts_dir: PathBuf,
    release_assets_dir: PathBuf,
    collect_dir: PathBuf,
    manifest_path: PathBuf,
    notes: String,
    branch: String,
    remote: String,
    signer_program: Option<PathBuf>,
    signing: SigningSettings,
}

impl Settings {
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Canonical version source.
    pub fn package_json(&self) -> &Path {
        &self.package_json
    }

    /// Secondary descriptors kept in sync with `package.json`.
    pub fn descriptors(&self) -> &[PathBuf] {
        &self.descriptors
    }

    /// Application config that receives the updater public key.
    pub fn app_config(&self) -> &Path {
        &self.app_config
    }

    /// Cargo target directory of the desktop app.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Downloaded `build-<platform>` artifact trees.
    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// Flat upload directory.
    pub fn release_assets_dir(&self) -> &Path {
        &self.release_assets_dir
    }

    /// Per-job collection directory.
    pub fn collect_dir(&self) -> &Path {
        &self.collect_dir
    }

    /// Merged `latest.json`.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn signer_program(&self) -> Option<&Path> {
        self.signer_program.as_deref()
    }

    pub fn signing(&self) -> &SigningSettings {
        &self.signing
    }

    pub fn release_files(&self) -> ReleaseFiles {
        ReleaseFiles {
            project_root: self.project_root.clone(),
            package_json: self.package_json.clone(),
            descriptors: self.descriptors.clone(),
        }
    }
}

/// Builder for constructing [`Settings`].
///
/// Values set on the builder override the file layer.
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    project_root: Option<PathBuf>,
    file: FileSettings,
    target_dir: Option<PathBuf>,
    notes: Option<String>,
    url_template: Option<String>,
    branch: Option<String>,
    remote: Option<String>,
    signer_program: Option<PathBuf>,
    repository: Option<String>,
    key_material: Option<SecretString>,
    passphrase: Option<SecretString>,
    key_dir: Option<PathBuf>,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project root. Default: the current directory.
    pub fn project_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// The `release.toml` layer.
    pub fn file_settings(mut self, file: FileSettings) -> Self {
        self.file = file;
        self
    }

    pub fn target_dir(mut self, path: Option<PathBuf>) -> Self {
        self.target_dir = path.or(self.target_dir);
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.or(self.notes);
        self
    }

    pub fn url_template(mut self, template: Option<String>) -> Self {
        self.url_template = template.or(self.url_template);
        self
    }

    pub fn branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch.or(self.branch);
        self
    }

    pub fn remote(mut self, remote: Option<String>) -> Self {
        self.remote = remote.or(self.remote);
        self
    }

    pub fn signer_program(mut self, program: Option<PathBuf>) -> Self {
        self.signer_program = program.or(self.signer_program);
        self
    }

    /// `owner/name` of the hosting repository.
    pub fn repository(mut self, repository: Option<String>) -> Self {
        self.repository = repository.filter(|r| !r.trim().is_empty()).or(self.repository);
        self
    }

    pub fn key_material(mut self, material: Option<SecretString>) -> Self {
        self.key_material = material.or(self.key_material);
        self
    }

    pub fn passphrase(mut self, passphrase: Option<SecretString>) -> Self {
        self.passphrase = passphrase.or(self.passphrase);
        self
    }

    /// Directory for the temporary signing key file.
    pub fn key_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.key_dir = dir.or(self.key_dir);
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] when the URL template is unusable or a
    /// configured descriptor list is empty.
    pub fn build(self) -> Result<Settings> {
        let project_root = match self.project_root {
            Some(root) => root,
            None => std::env::current_dir().fs_context("resolving project root", ".")?,
        };
        let file = self.file;
        let under_root = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else {
                project_root.join(path)
            }
        };

        let descriptors = file
            .descriptors
            .unwrap_or_else(|| vec![PathBuf::from("src-tauri/Cargo.toml")]);
        if descriptors.is_empty() {
            return Err(Error::InvalidConfig(
                "`descriptors` must name at least one file".to_string(),
            ));
        }

        let url_template = match self.url_template.or(file.url_template) {
            Some(template) => UrlTemplate::new(template)?,
            None => UrlTemplate::default(),
        };

        let signing = SigningSettings {
            key_material: self.key_material,
            passphrase: self.passphrase,
            key_policy: KeyPolicy::default(),
            url_template,
            repository: self
                .repository
                .unwrap_or_else(|| DEFAULT_REPOSITORY.to_string()),
            key_dir: self.key_dir.map(under_root),
        };

        Ok(Settings {
            package_json: under_root(file.package_json.unwrap_or_else(|| "package.json".into())),
            descriptors: descriptors.into_iter().map(under_root).collect(),
            app_config: under_root(
                file.app_config
                    .unwrap_or_else(|| "src-tauri/tauri.conf.json".into()),
            ),
            target_dir: under_root(
                self.target_dir
                    .or(file.target_dir)
                    .unwrap_or_else(|| "src-tauri/target".into()),
            ),
            artifacts_dir: under_root("artifacts".into()),
            release_assets_dir: under_root("release-assets".into()),
            collect_dir: under_root("release-artifacts".into()),
            manifest_path: under_root(MANIFEST_FILE_NAME.into()),
            notes: self
                .notes
                .or(file.notes)
                .unwrap_or_else(|| DEFAULT_NOTES.to_string()),
            branch: self.branch.or(file.branch).unwrap_or_else(|| "main".to_string()),
            remote: self.remote.or(file.remote).unwrap_or_else(|| "origin".to_string()),
            signer_program: self.signer_program.or(file.signer_program),
            signing,
            project_root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_tauri_layout() {
        let settings = SettingsBuilder::new().project_root("/work/app").build().unwrap();

        assert_eq!(settings.package_json(), Path::new("/work/app/package.json"));
        assert_eq!(
            settings.descriptors(),
            &[PathBuf::from("/work/app/src-tauri/Cargo.toml")]
        );
        assert_eq!(settings.target_dir(), Path::new("/work/app/src-tauri/target"));
        assert_eq!(settings.manifest_path(), Path::new("/work/app/latest.json"));
        assert_eq!(settings.notes(), DEFAULT_NOTES);
        assert_eq!(settings.branch(), "main");
        assert_eq!(settings.remote(), "origin");
        assert_eq!(settings.signing().repository, DEFAULT_REPOSITORY);
    }

    #[test]
    fn flags_override_file_which_overrides_defaults() {
        let file: FileSettings = toml::from_str(
            r#"
            notes = "From file"
            branch = "release"
            target_dir = "build/target"
            descriptors = ["src-tauri/Cargo.toml", "src-tauri/tauri.conf.json"]
            "#,
        )
        .unwrap();

        let settings = SettingsBuilder::new()
            .project_root("/p")
            .file_settings(file)
            .notes(Some("From flag".into()))
            .branch(None)
            .build()
            .unwrap();

        assert_eq!(settings.notes(), "From flag");
        assert_eq!(settings.branch(), "release");
        assert_eq!(settings.target_dir(), Path::new("/p/build/target"));
        assert_eq!(settings.descriptors().len(), 2);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        assert!(toml::from_str::<FileSettings>("colour = \"blue\"").is_err());
    }

    #[test]
    fn bad_url_template_is_invalid_config() {
        let err = SettingsBuilder::new()
            .project_root("/p")
            .url_template(Some("not a url {asset}".into()))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn discover_without_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileSettings::discover(dir.path(), None).await.unwrap();
        assert_eq!(file, FileSettings::default());
    }

    #[tokio::test]
    async fn discover_reads_project_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "remote = \"upstream\"\n").unwrap();
        let file = FileSettings::discover(dir.path(), None).await.unwrap();
        assert_eq!(file.remote.as_deref(), Some("upstream"));
    }
}

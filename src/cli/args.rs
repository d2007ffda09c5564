//! Command line argument parsing and validation.
//!
//! This module provides comprehensive CLI argument parsing using clap,
//! with proper validation and error handling. Secrets arrive through
//! environment variables and are held as [`SecretString`] from the start.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::updater::{PlatformKey, SecretString, Settings, SettingsBuilder};

/// Build, sign and publish tauri updater artifacts
#[derive(Parser, Debug)]
#[command(
    name = "updater_release",
    version,
    about = "Build, sign and publish tauri updater artifacts",
    long_about = "Release pipeline for a tauri desktop application's auto-updater.

Each platform build job runs `sign-updater` and `collect`; the release job
runs `merge` and `flatten`; operators run `release` to start a build and
`keygen` to rotate the signing key.

Usage:
  updater_release release 1.2.0
  updater_release sign-updater darwin-aarch64 aarch64-apple-darwin
  updater_release merge artifacts/build-*
  updater_release flatten

Exit code 0 = success, 1 = pipeline failure, 2 = usage error."
)]
pub struct Args {
    /// Project root holding package.json and src-tauri/
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,

    /// Release config file (default: <project-root>/release.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print detail lines
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Pipeline steps.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy the package.json version into every build descriptor
    SyncVersion,

    /// Generate a new signing keypair and install its public key
    Keygen {
        /// Passphrase protecting the new private key
        #[arg(long, env = "TAURI_SIGNING_PRIVATE_KEY_PASSWORD", hide_env_values = true)]
        password: Option<SecretString>,

        #[command(flatten)]
        tool: ToolArgs,
    },

    /// Validate the configured private key material without signing
    CheckKey {
        /// Base64 private key
        #[arg(long, env = "TAURI_SIGNING_PRIVATE_KEY_BASE64", hide_env_values = true)]
        key: Option<SecretString>,
    },

    /// Build, sign and describe one platform's updater archive
    SignUpdater {
        /// Platform key (darwin-aarch64, darwin-x86_64, linux-x86_64, windows-x86_64)
        #[arg(value_parser = parse_platform)]
        platform: PlatformKey,

        /// Rust target triple the app was built for
        target: String,

        #[command(flatten)]
        signing: SigningArgs,

        #[command(flatten)]
        tool: ToolArgs,

        /// Cargo target directory
        #[arg(long, value_name = "DIR")]
        target_dir: Option<PathBuf>,
    },

    /// Copy one platform's release files into release-artifacts/
    Collect {
        /// Platform key
        #[arg(value_parser = parse_platform)]
        platform: PlatformKey,

        /// Rust target triple the app was built for
        target: String,

        /// Cargo target directory
        #[arg(long, value_name = "DIR")]
        target_dir: Option<PathBuf>,
    },

    /// Merge platform fragments into latest.json
    Merge {
        /// Directories holding latest-<platform>.json fragments, in merge order
        #[arg(required = true, value_name = "DIR")]
        dirs: Vec<PathBuf>,

        /// Release notes for the manifest
        #[arg(long)]
        notes: Option<String>,

        /// Output path (default: <project-root>/latest.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Flatten artifacts/build-* trees into release-assets/
    Flatten,

    /// Bump the version, commit, tag and push to start a release build
    Release {
        /// Version to release, e.g. 1.2.0 or v1.2.0-beta.1
        version: String,

        /// Keep every git operation local and print the push commands
        #[arg(long)]
        no_push: bool,

        /// Remote to push to
        #[arg(long)]
        remote: Option<String>,

        /// Branch to push
        #[arg(long)]
        branch: Option<String>,
    },
}

/// Key material and download URL settings for signing.
#[derive(clap::Args, Debug)]
pub struct SigningArgs {
    /// Base64 private key
    #[arg(long, env = "TAURI_SIGNING_PRIVATE_KEY_BASE64", hide_env_values = true)]
    pub key: Option<SecretString>,

    /// Private key passphrase
    #[arg(long, env = "TAURI_SIGNING_PRIVATE_KEY_PASSWORD", hide_env_values = true)]
    pub password: Option<SecretString>,

    /// Hosting repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Download URL template with {repository}, {version} and {asset}
    #[arg(long, value_name = "TEMPLATE")]
    pub url_template: Option<String>,

    /// Directory for the temporary key file
    #[arg(long, value_name = "DIR")]
    pub key_dir: Option<PathBuf>,
}

/// Signing tool location.
#[derive(clap::Args, Debug)]
pub struct ToolArgs {
    /// tauri CLI executable (default: `tauri` on PATH, then node_modules/.bin/tauri)
    #[arg(long, value_name = "PROGRAM")]
    pub signer_program: Option<PathBuf>,
}

fn parse_platform(value: &str) -> Result<PlatformKey, String> {
    value.parse::<PlatformKey>().map_err(|e| e.to_string())
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::SignUpdater { target, .. } | Command::Collect { target, .. }
                if target.trim().is_empty() =>
            {
                Err("Target triple cannot be empty".to_string())
            }
            Command::Release { version, .. } if version.trim().is_empty() => {
                Err("Version cannot be empty".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Settings builder carrying this invocation's overrides.
    pub fn settings_builder(&self) -> SettingsBuilder {
        let builder = SettingsBuilder::new().project_root(&self.project_root);

        match &self.command {
            Command::Keygen { tool, .. } => builder.signer_program(tool.signer_program.clone()),
            Command::CheckKey { key } => builder.key_material(key.clone()),
            Command::SignUpdater {
                signing,
                tool,
                target_dir,
                ..
            } => builder
                .key_material(signing.key.clone())
                .passphrase(signing.password.clone())
                .repository(signing.repository.clone())
                .url_template(signing.url_template.clone())
                .key_dir(signing.key_dir.clone())
                .signer_program(tool.signer_program.clone())
                .target_dir(target_dir.clone()),
            Command::Collect { target_dir, .. } => builder.target_dir(target_dir.clone()),
            Command::Merge { notes, .. } => builder.notes(notes.clone()),
            Command::Release { remote, branch, .. } => {
                builder.remote(remote.clone()).branch(branch.clone())
            }
            Command::SyncVersion | Command::Flatten => builder,
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
    settings: Settings,
}

impl RuntimeConfig {
    pub fn new(args: &Args, settings: Settings) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
            settings,
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success_println(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sign_updater() {
        let args = Args::try_parse_from([
            "updater_release",
            "sign-updater",
            "darwin-aarch64",
            "aarch64-apple-darwin",
            "--repository",
            "acme/xy",
        ])
        .unwrap();

        match args.command {
            Command::SignUpdater {
                platform, signing, ..
            } => {
                assert_eq!(platform, PlatformKey::DarwinAArch64);
                assert_eq!(signing.repository.as_deref(), Some("acme/xy"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_platform() {
        let err = Args::try_parse_from(["updater_release", "collect", "beos-x86", "x86_64-beos"])
            .unwrap_err();
        assert!(err.to_string().contains("unknown platform"));
    }

    #[test]
    fn merge_requires_a_directory() {
        assert!(Args::try_parse_from(["updater_release", "merge"]).is_err());
    }

    #[test]
    fn validate_rejects_blank_target() {
        let args =
            Args::try_parse_from(["updater_release", "collect", "linux-x86_64", " "]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn secret_arguments_never_debug_print() {
        let args = Args::try_parse_from([
            "updater_release",
            "check-key",
            "--key",
            "c2VjcmV0LWtleS1tYXRlcmlhbA==",
        ])
        .unwrap();
        assert!(!format!("{args:?}").contains("c2VjcmV0"));
    }
}

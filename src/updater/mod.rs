//! Updater release pipeline for tauri desktop applications.
//!
//! Takes the installers produced by each platform's native build, turns each
//! into a signed updater archive, and publishes one `latest.json` manifest
//! the auto-update client polls.
//!
//! # Pipeline
//!
//! | Step | Module | Runs in |
//! |------|--------|---------|
//! | Bump version, tag, push | [`release`] | operator machine |
//! | Locate bundle output | [`locator`] | each platform job |
//! | Build updater archive | [`builder`] | each platform job |
//! | Sign, write fragment | [`signer`] | each platform job |
//! | Collect job artifacts | [`collect`] | each platform job |
//! | Merge fragments | [`manifest`] | release job |
//! | Flatten assets | [`flatten`] | release job |
//!
//! [`keys`] (key generation and validation) and [`sync`] (version
//! propagation) run outside the pipeline as well as inside it.
//!
//! # Platforms
//!
//! | Key | Installer | Updater archive |
//! |-----|-----------|-----------------|
//! | `darwin-aarch64` | `.app` | `.app.tar.gz` |
//! | `darwin-x86_64` | `.app` | `.app.tar.gz` |
//! | `linux-x86_64` | `.AppImage` | `.AppImage.tar.gz` |
//! | `windows-x86_64` | NSIS `.exe` / `.msi` | `.nsis.zip` / `.msi.zip` |

pub mod builder;
pub mod collect;
mod error;
pub mod flatten;
pub mod git;
pub mod keys;
pub mod locator;
pub mod manifest;
pub mod platform;
pub mod release;
pub mod secret;
pub mod settings;
pub mod signer;
pub mod sync;
pub(crate) mod utils;
pub mod version;

// Public re-exports
pub use builder::{BundledArchive, build_updater_archive, updater_archive_name};
pub use collect::{CollectReport, collect_release_artifacts};
pub use error::{Context, Error, ErrorExt, Result};
pub use flatten::{FlattenReport, flatten_release_assets};
pub use git::{GitCli, GitClient};
pub use keys::{GeneratedKey, KeyPolicy, ValidatedKey, generate_keypair, validate_key_material};
pub use locator::{BuildOutputTree, locate_build_output};
pub use manifest::{Manifest, ManifestFragment, PlatformInfo, merge_fragments, write_manifest};
pub use platform::{Arch, PlatformFamily, PlatformKey};
pub use release::{ReleaseFiles, ReleaseOptions, ReleaseOrchestrator, ReleaseReport};
pub use secret::{ScopedKeyFile, SecretString};
pub use settings::{FileSettings, Settings, SettingsBuilder};
pub use signer::{SignOutcome, SigningSettings, SigningStage, SigningTool, TauriCli, UpdaterSigner};
pub use sync::{read_canonical_version, sync_version};
pub use version::ReleaseVersion;

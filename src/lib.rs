//! Release pipeline library for tauri desktop application updates.
//!
//! This library provides the core functionality for:
//! - Keeping the app version consistent across build descriptors
//! - Generating and validating updater signing keys
//! - Packaging and signing per-platform updater archives
//! - Merging platform fragments into the update manifest
//! - Preparing upload-ready release assets
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod updater;

// Re-export commonly used types
pub use error::{CliError, ReleaseError, Result};

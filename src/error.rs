//! Top-level error types for the release CLI.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use thiserror::Error;

use crate::updater;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// Pipeline errors
    #[error("{0}")]
    Updater(#[from] updater::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use updater::Error as E;

        match self {
            ReleaseError::Updater(E::InvalidKeyMaterial { .. }) => vec![
                "Run `updater_release keygen` and store the printed base64 private key as TAURI_SIGNING_PRIVATE_KEY_BASE64".to_string(),
                "Make sure the secret holds the private key, not the public key".to_string(),
            ],
            ReleaseError::Updater(E::MissingPassphrase) => vec![
                "Set TAURI_SIGNING_PRIVATE_KEY_PASSWORD to the passphrase chosen at key generation".to_string(),
            ],
            ReleaseError::Updater(E::MissingInput { .. }) => vec![
                "Check that the native build for this target ran and finished".to_string(),
                "Pass --target-dir if the cargo target directory is not src-tauri/target".to_string(),
            ],
            ReleaseError::Updater(E::MissingInstaller { .. }) => vec![
                "Check the bundle targets configured for this platform in the app config".to_string(),
            ],
            ReleaseError::Updater(E::SignatureNotProduced { .. } | E::SigningToolFailed { .. }) => vec![
                "Run `tauri signer sign` manually with the same key to see the tool's output".to_string(),
                "Verify the passphrase matches the key".to_string(),
            ],
            ReleaseError::Updater(E::MergeNoData { .. }) => vec![
                "Check that every platform job uploaded its latest-<platform>.json fragment".to_string(),
            ],
            ReleaseError::Updater(E::MissingVersionField { .. }) => vec![
                "Add a \"version\" field to package.json".to_string(),
            ],
            ReleaseError::Updater(E::GitFailed { .. }) => vec![
                "Check git authentication (ssh-agent or a credential helper)".to_string(),
                "Retry with --no-push and push manually".to_string(),
            ],
            ReleaseError::Updater(E::InvalidConfig(_)) => vec![
                "Fix release.toml or the corresponding command-line flag".to_string(),
            ],
            ReleaseError::Updater(E::UsageError(_)) | ReleaseError::Cli(_) => vec![
                "Run with --help for usage".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passphrase_error_points_at_env_var() {
        let err = ReleaseError::from(updater::Error::MissingPassphrase);
        assert!(
            err.recovery_suggestions()
                .iter()
                .any(|s| s.contains("TAURI_SIGNING_PRIVATE_KEY_PASSWORD"))
        );
    }

    #[test]
    fn updater_errors_display_unwrapped() {
        let err = ReleaseError::from(updater::Error::UsageError("bad".into()));
        assert_eq!(err.to_string(), "usage error: bad");
    }
}

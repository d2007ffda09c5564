//! Error types for the updater release pipeline.
//!
//! Every variant is fatal at the point of detection. Nothing here is retried;
//! re-running a whole job is the responsibility of the surrounding CI.

use std::path::PathBuf;

use super::platform::PlatformKey;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the pipeline components.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An expected path (build output tree, descriptor, fragment dir) is absent.
    #[error("missing input for {what}: tried {}", display_paths(.attempted))]
    MissingInput {
        /// What was being looked up
        what: String,
        /// Every path that was tried, in order
        attempted: Vec<PathBuf>,
    },

    /// The canonical version source has no `version` field.
    #[error("no version field found in {}", .path.display())]
    MissingVersionField {
        /// Canonical source that was read
        path: PathBuf,
    },

    /// Key material failed the validation heuristics.
    #[error("invalid key material: {reason}")]
    InvalidKeyMaterial {
        /// Which check failed
        reason: String,
    },

    /// The signing key passphrase was not supplied.
    #[error(
        "no signing key passphrase configured; keys without a passphrase are not supported for CI signing"
    )]
    MissingPassphrase,

    /// No installer artifact was found for the platform.
    #[error(
        "no installer found for {platform} under {} (searched: {}; present subdirectories: {})",
        .bundle_root.display(),
        display_paths(.searched),
        display_names(.present)
    )]
    MissingInstaller {
        /// Platform being packaged
        platform: PlatformKey,
        /// BuildOutputTree root
        bundle_root: PathBuf,
        /// Directories the strategies looked in
        searched: Vec<PathBuf>,
        /// Subdirectories that actually exist under the root
        present: Vec<String>,
    },

    /// The signing tool reported success but left no signature behind.
    #[error("signing tool reported success but no signature exists at {}", .path.display())]
    SignatureNotProduced {
        /// Expected signature path
        path: PathBuf,
    },

    /// No manifest fragments were found in any input directory.
    #[error("no platform fragments found in {}", display_paths(.dirs))]
    MergeNoData {
        /// Directories that were scanned
        dirs: Vec<PathBuf>,
    },

    /// Malformed invocation parameters.
    #[error("usage error: {0}")]
    UsageError(String),

    /// The external signing tool could not run or exited unsuccessfully.
    #[error("signing tool `{program}` failed: {reason}")]
    SigningToolFailed {
        /// Program that was invoked
        program: String,
        /// Exit status or spawn error
        reason: String,
    },

    /// A git command failed in a step that does not tolerate failure.
    #[error("git {command} failed: {reason}")]
    GitFailed {
        /// Git subcommand line
        command: String,
        /// Captured stderr or spawn error
        reason: String,
    },

    /// A termination signal arrived while an operation was in flight.
    #[error("interrupted by signal during {0}")]
    Interrupted(&'static str),

    /// The release configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem error with the operation and path attached.
    #[error("{context} {}: {error}", .path.display())]
    Fs {
        /// Operation being performed
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        error: std::io::Error,
    },

    /// IO errors without path context.
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Cargo manifest editing errors.
    #[error("{0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    /// Zip archive errors.
    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory traversal errors.
    #[error("{0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix stripping errors.
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "<none>".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_names(names: &[String]) -> String {
    if names.is_empty() {
        "<empty>".to_string()
    } else {
        names.join(", ")
    }
}

/// Attach a message to `Option`/`Result` values.
pub trait Context<T> {
    /// Convert into a pipeline result, using `context` as the message on failure.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Like [`Context::context`], computing the message lazily.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Attach filesystem context to IO results.
pub trait ErrorExt<T> {
    /// Wrap an IO error with the operation being performed and the path involved.
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Return early with a [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::updater::Error::GenericError(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::updater::Error::GenericError(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_lists_every_attempted_path() {
        let err = Error::MissingInput {
            what: "bundle root".into(),
            attempted: vec![PathBuf::from("/a/bundle"), PathBuf::from("/b/bundle")],
        };
        let msg = err.to_string();
        assert!(msg.contains("/a/bundle"));
        assert!(msg.contains("/b/bundle"));
    }

    #[test]
    fn fs_context_keeps_path() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = res.fs_context("reading fragment", "/tmp/x.json").unwrap_err();
        assert_eq!(err.to_string(), "reading fragment /tmp/x.json: gone");
    }
}

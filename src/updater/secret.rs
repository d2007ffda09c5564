//! Secret values and the on-disk lifetime of signing keys.

use std::fmt;
use std::io::Write;
use std::path::Path;

use super::error::{ErrorExt, Result};

/// A string that never prints its contents.
///
/// `Debug` and `Display` are hand-written so a stray `{:?}` on a config
/// struct cannot leak key material or passphrases into CI logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the secret. Callers must not log the returned value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<hidden>")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<hidden>")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Private key material written to an owner-only temporary file.
///
/// The file is removed when the guard is dropped, so every exit path of the
/// signing operation (success, tool failure, panic unwind, interruption)
/// cleans it up. [`ScopedKeyFile::dispose`] removes it eagerly and reports
/// removal errors.
pub struct ScopedKeyFile {
    file: tempfile::NamedTempFile,
}

impl ScopedKeyFile {
    /// Write `material` to a fresh file in `dir`, or the system temp dir.
    pub fn materialize(material: &SecretString, dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".updater-signing-").suffix(".key");

        let mut file = match dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).fs_context("creating signing key directory", dir)?;
                builder
                    .tempfile_in(dir)
                    .fs_context("creating signing key file", dir)?
            }
            None => builder
                .tempfile()
                .fs_context("creating signing key file", std::env::temp_dir())?,
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600))
                .fs_context("restricting signing key file", file.path())?;
        }

        let path = file.path().to_path_buf();
        file.write_all(material.expose().as_bytes())
            .fs_context("writing signing key file", &path)?;
        file.flush().fs_context("flushing signing key file", &path)?;

        log::debug!("Materialized signing key at {}", path.display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the key file now.
    pub fn dispose(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file
            .close()
            .fs_context("removing signing key file", &path)?;
        log::debug!("Removed signing key file {}", path.display());
        Ok(())
    }
}

impl fmt::Debug for ScopedKeyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedKeyFile")
            .field("path", &self.file.path())
            .finish()
    }
}

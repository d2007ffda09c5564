//! Release version strings.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::error::{Error, Result};

/// `MAJOR.MINOR.PATCH[-prerelease]`, no build metadata.
static VERSION_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+(-[a-zA-Z0-9.-]+)?$").expect("version regex is valid")
});

/// A validated release version.
///
/// This is the single source of truth for a release; every file that embeds
/// the version must carry exactly [`ReleaseVersion::as_str`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReleaseVersion {
    raw: String,
    parsed: semver::Version,
}

impl ReleaseVersion {
    /// Parse operator input, tolerating a leading `v` (`v1.2.3`).
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        let raw = raw.strip_prefix('v').unwrap_or(raw);

        if !VERSION_FORMAT.is_match(raw) {
            return Err(Error::UsageError(format!(
                "invalid version `{raw}`, expected e.g. 1.0.0 or 1.0.0-beta.1"
            )));
        }

        let parsed = semver::Version::parse(raw)
            .map_err(|e| Error::UsageError(format!("invalid version `{raw}`: {e}")))?;

        Ok(Self {
            raw: raw.to_string(),
            parsed,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Git tag that triggers the release build (`v1.2.3`).
    pub fn tag_name(&self) -> String {
        format!("v{}", self.raw)
    }

    pub fn is_prerelease(&self) -> bool {
        !self.parsed.pre.is_empty()
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

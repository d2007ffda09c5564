//! Download URL templates.

use std::fmt;

use url::Url;

use crate::updater::error::{Error, Result};

/// Default download location: a GitHub release asset.
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://github.com/{repository}/releases/download/app-v{version}/{asset}";

/// Repository used when `GITHUB_REPOSITORY` is not set.
pub const DEFAULT_REPOSITORY: &str = "OWNER/REPO";

/// A download URL pattern with `{repository}`, `{version}` and `{asset}` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Accept a template that names the asset and renders to a valid URL.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = UrlTemplate(template.into());
        if !template.0.contains("{asset}") {
            return Err(Error::InvalidConfig(format!(
                "url template `{}` has no {{asset}} placeholder",
                template.0
            )));
        }
        template.render("owner/repo", "0.0.0", "asset.tar.gz")?;
        Ok(template)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the download URL of one release asset.
    ///
    /// The asset name is percent-encoded as a single path segment; the
    /// repository and version are inserted verbatim.
    pub fn render(&self, repository: &str, version: &str, asset: &str) -> Result<Url> {
        let rendered = self
            .0
            .replace("{repository}", repository)
            .replace("{version}", version)
            .replace("{asset}", &encode_path_segment(asset)?);

        Url::parse(&rendered)
            .map_err(|e| Error::InvalidConfig(format!("download url `{rendered}` is invalid: {e}")))
    }
}

impl Default for UrlTemplate {
    fn default() -> Self {
        UrlTemplate(DEFAULT_URL_TEMPLATE.to_string())
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Percent-encode `segment` the way `url` encodes a pushed path segment.
fn encode_path_segment(segment: &str) -> Result<String> {
    let mut scratch = Url::parse("https://localhost/")
        .map_err(|e| Error::GenericError(format!("scratch url: {e}")))?;
    scratch
        .path_segments_mut()
        .map_err(|()| Error::GenericError("scratch url cannot be a base".to_string()))?
        .pop_if_empty()
        .push(segment);
    Ok(scratch.path().trim_start_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_default_github_url() {
        let url = UrlTemplate::default()
            .render("acme/xy", "1.2.0", "xy_1.2.0_amd64.AppImage.tar.gz")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/acme/xy/releases/download/app-v1.2.0/xy_1.2.0_amd64.AppImage.tar.gz"
        );
    }

    #[test]
    fn encodes_spaces_in_asset_names() {
        let url = UrlTemplate::default()
            .render(DEFAULT_REPOSITORY, "1.0.0", "XY Todo_1.0.0_x64.app.tar.gz")
            .unwrap();
        assert!(url.as_str().ends_with("/XY%20Todo_1.0.0_x64.app.tar.gz"));
    }

    #[test]
    fn rejects_template_without_asset() {
        let err = UrlTemplate::new("https://example.com/{version}").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn rejects_template_that_is_not_a_url() {
        let err = UrlTemplate::new("downloads/{asset}").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}

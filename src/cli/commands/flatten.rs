//! `flatten`: build the upload-ready release-assets/ directory.

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::updater::flatten_release_assets;

pub async fn execute(config: &RuntimeConfig) -> Result<i32> {
    let settings = config.settings();
    let report = flatten_release_assets(
        settings.artifacts_dir(),
        settings.release_assets_dir(),
        settings.manifest_path(),
    )
    .await?;

    for asset in &report.assets {
        config.verbose_println(&format!(
            "   {} -> {}",
            asset.source.display(),
            asset.destination.display()
        ))?;
    }
    for platform in &report.skipped_platforms {
        config.verbose_println(&format!("   no artifacts for {platform}"))?;
    }
    if report.manifest.is_none() {
        config.warn(&format!(
            "{} not found; release will have no update manifest",
            settings.manifest_path().display()
        ))?;
    }
    config.success_println(&format!(
        "Flattened {} item(s) into {}",
        report.item_count(),
        settings.release_assets_dir().display()
    ))?;
    Ok(0)
}

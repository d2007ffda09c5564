//! `collect`: gather one platform job's release files.

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::updater::{PlatformKey, collect_release_artifacts, locate_build_output};

pub async fn execute(config: &RuntimeConfig, platform: PlatformKey, target: &str) -> Result<i32> {
    let settings = config.settings();
    let tree = locate_build_output(platform, target, settings.target_dir()).await?;

    let report = collect_release_artifacts(&tree, settings.collect_dir()).await?;
    for path in &report.copied {
        config.verbose_println(&format!("   {}", path.display()))?;
    }
    config.success_println(&format!(
        "Collected {} item(s) into {}",
        report.item_count,
        settings.collect_dir().display()
    ))?;
    Ok(0)
}

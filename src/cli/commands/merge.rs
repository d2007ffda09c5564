//! `merge`: combine platform fragments into latest.json.

use std::path::{Path, PathBuf};

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::updater::{PlatformKey, merge_fragments, write_manifest};

pub async fn execute(config: &RuntimeConfig, dirs: &[PathBuf], output: Option<&Path>) -> Result<i32> {
    let settings = config.settings();
    let output = output.unwrap_or(settings.manifest_path());

    let manifest = merge_fragments(dirs, settings.notes()).await?;
    write_manifest(&manifest, output).await?;

    for (platform, info) in &manifest.platforms {
        config.indent(&format!("{platform}: {}", info.url))?;
    }
    if manifest.platforms.len() < PlatformKey::ALL.len() {
        config.warn(&format!(
            "Manifest only covers {} of {} platforms",
            manifest.platforms.len(),
            PlatformKey::ALL.len()
        ))?;
    }
    config.success_println(&format!(
        "Wrote {} for version {}",
        output.display(),
        manifest.version
    ))?;
    Ok(0)
}

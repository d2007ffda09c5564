//! `sync-version`: propagate the package.json version.

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::updater::sync_version;

pub async fn execute(config: &RuntimeConfig) -> Result<i32> {
    let settings = config.settings();
    config.progress(&format!(
        "Reading version from {}",
        settings.package_json().display()
    ))?;

    let (version, synced) = sync_version(settings.package_json(), settings.descriptors()).await?;

    for descriptor in &synced {
        if descriptor.changed {
            config.indent(&format!("updated {}", descriptor.path.display()))?;
        } else {
            config.verbose_println(&format!("   unchanged {}", descriptor.path.display()))?;
        }
    }
    config.success_println(&format!(
        "Version {} synced to {} descriptor(s)",
        version,
        synced.len()
    ))?;
    Ok(0)
}

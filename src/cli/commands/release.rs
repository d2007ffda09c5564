//! `release`: bump the version and push the tag that starts the build.

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::updater::{GitCli, ReleaseOptions, ReleaseOrchestrator, ReleaseVersion};

pub async fn execute(config: &RuntimeConfig, version: &str, push: bool) -> Result<i32> {
    let settings = config.settings();
    let version = ReleaseVersion::parse(version)?;
    config.section(&format!(
        "Releasing {} (tag {})",
        version,
        version.tag_name()
    ))?;
    if version.is_prerelease() {
        config.verbose_println("   Pre-release version")?;
    }

    let git = GitCli::detect(settings.project_root())?;
    let files = settings.release_files();
    let options = ReleaseOptions {
        version,
        push,
        remote: settings.remote().to_string(),
        branch: settings.branch().to_string(),
    };
    let report = ReleaseOrchestrator::new(&git, &files).release(&options).await?;

    for descriptor in report.synced.iter().filter(|d| d.changed) {
        config.indent(&format!("updated {}", descriptor.path.display()))?;
    }
    if !report.committed {
        config.indent("nothing to commit; tagging the current HEAD")?;
    }

    if report.manual_push_commands.is_empty() {
        config.success_println(&format!(
            "Pushed {}; the release build will start shortly",
            report.tag
        ))?;
    } else {
        config.success_println(&format!("Created {} locally (--no-push). Push later with:", report.tag))?;
        for command in &report.manual_push_commands {
            config.indent(command)?;
        }
    }
    Ok(0)
}

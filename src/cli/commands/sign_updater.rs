//! `sign-updater`: locate, archive and sign one platform's installer.

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::updater::{
    PlatformKey, TauriCli, UpdaterSigner, locate_build_output, read_canonical_version,
};

pub async fn execute(config: &RuntimeConfig, platform: PlatformKey, target: &str) -> Result<i32> {
    let settings = config.settings();

    let version = read_canonical_version(settings.package_json()).await?;
    config.section(&format!("Signing {platform} updater for {version}"))?;

    let tree = locate_build_output(platform, target, settings.target_dir()).await?;
    config.verbose_println(&format!("   Bundle root: {}", tree.root.display()))?;

    let tool = TauriCli::resolve(settings.signer_program(), settings.project_root())?;
    config.verbose_println(&format!("   Signing tool: {}", tool.program().display()))?;

    let mut signer = UpdaterSigner::new(&tool, settings.signing());
    let outcome = signer.sign(&tree, &version).await?;

    config.success_println(&format!(
        "{} ({} bytes)",
        outcome.archive.path.display(),
        outcome.archive.size
    ))?;
    config.indent(&format!("sha256    {}", outcome.archive.checksum))?;
    config.indent(&format!("signature {}", outcome.signature_path.display()))?;
    config.indent(&format!("url       {}", outcome.fragment.platform_info.url))?;
    config.indent(&format!("fragment  {}", outcome.fragment_path.display()))?;
    Ok(0)
}

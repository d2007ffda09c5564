//! `keygen`: rotate the updater signing keypair.

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::updater::{SecretString, TauriCli, generate_keypair};

pub async fn execute(config: &RuntimeConfig, password: Option<&SecretString>) -> Result<i32> {
    let settings = config.settings();
    let tool = TauriCli::resolve(settings.signer_program(), settings.project_root())?;
    config.verbose_println(&format!("   Using {}", tool.program().display()))?;

    config.progress("Generating signing keypair")?;
    let generated = generate_keypair(&tool, settings.app_config(), password).await?;

    config.success_println(&format!(
        "Public key installed into {}",
        settings.app_config().display()
    ))?;
    config.section("Private key")?;
    config.indent("Store this value as TAURI_SIGNING_PRIVATE_KEY_BASE64 in the CI secret store.")?;
    config.indent("It is shown once and is not written anywhere else.")?;

    // The operator's only copy; goes to stdout, never to the log.
    let output = config.output();
    output.println(&"─".repeat(60))?;
    output.println(generated.private_key.expose())?;
    output.println(&"─".repeat(60))?;
    config.warn("Keep TAURI_SIGNING_PRIVATE_KEY_PASSWORD in sync with the passphrase used here")?;
    Ok(0)
}

//! `check-key`: validate signing key material without signing anything.

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::updater::{Error, validate_key_material};

pub async fn execute(config: &RuntimeConfig) -> Result<i32> {
    let signing = config.settings().signing();
    let material = signing
        .key_material
        .as_ref()
        .ok_or_else(|| Error::InvalidKeyMaterial {
            reason: "TAURI_SIGNING_PRIVATE_KEY_BASE64 is not set".to_string(),
        })?;

    let key = validate_key_material(material, &signing.key_policy)?;
    config.success_println(&format!(
        "Key material looks like a private key ({} bytes decoded)",
        key.decoded_len()
    ))?;
    Ok(0)
}

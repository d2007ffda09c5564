//! Signing key generation and validation.
//!
//! Key material travels through CI as base64 of the key file the tauri CLI
//! writes (itself a minisign-style text block). Validation decodes it and
//! checks for the markers a private key must carry, which catches the most
//! common operator mistake: pasting the public key into the private key
//! secret.

use std::path::Path;

use base64::Engine;
use serde_json::{Map, Value};

use super::error::{Error, ErrorExt, Result};
use super::secret::SecretString;
use super::signer::SigningTool;

/// Characters of the decoded first line shown in diagnostics.
const PREVIEW_CHARS: usize = 80;

/// What valid private key material must (and must not) look like.
#[derive(Clone, Debug)]
pub struct KeyPolicy {
    /// Minimum decoded length in bytes.
    pub min_decoded_len: usize,
    /// Markers that identify a public key; any match rejects the material.
    pub public_markers: Vec<String>,
    /// Markers that must all be present in a private key.
    pub private_markers: Vec<String>,
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self {
            min_decoded_len: 50,
            public_markers: vec!["minisign public key".to_string()],
            private_markers: vec!["untrusted comment".to_string(), "rsign".to_string()],
        }
    }
}

/// Key material that passed [`validate_key_material`].
#[derive(Clone, Debug)]
pub struct ValidatedKey {
    encoded: SecretString,
    decoded_len: usize,
}

impl ValidatedKey {
    /// The whitespace-free base64 text, as the signing tool expects it in a key file.
    pub fn encoded(&self) -> &SecretString {
        &self.encoded
    }

    pub fn decoded_len(&self) -> usize {
        self.decoded_len
    }
}

/// Check base64 key material before any signing attempt.
pub fn validate_key_material(material: &SecretString, policy: &KeyPolicy) -> Result<ValidatedKey> {
    let compact: String = material
        .expose()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if compact.is_empty() {
        return Err(Error::InvalidKeyMaterial {
            reason: "no private key material supplied".to_string(),
        });
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::InvalidKeyMaterial {
            reason: format!("not valid base64 ({e}); copy the complete base64 key output"),
        })?;
    let text = String::from_utf8_lossy(&decoded);

    let first_line = text.lines().next().unwrap_or_default();
    let preview: String = first_line.chars().take(PREVIEW_CHARS).collect();
    log::info!(
        "Key material: base64 length {}, decoded {} bytes, first line: {}",
        compact.len(),
        decoded.len(),
        preview
    );

    if decoded.len() < policy.min_decoded_len {
        return Err(Error::InvalidKeyMaterial {
            reason: format!(
                "decoded key is {} bytes, expected at least {}; the secret looks truncated",
                decoded.len(),
                policy.min_decoded_len
            ),
        });
    }

    if let Some(marker) = policy
        .public_markers
        .iter()
        .find(|m| text.contains(m.as_str()))
    {
        return Err(Error::InvalidKeyMaterial {
            reason: format!("material contains `{marker}`: this is a public key, not a private key"),
        });
    }

    let missing: Vec<&str> = policy
        .private_markers
        .iter()
        .filter(|m| !text.contains(m.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(Error::InvalidKeyMaterial {
            reason: format!("decoded key lacks private key markers: {}", missing.join(", ")),
        });
    }

    Ok(ValidatedKey {
        decoded_len: decoded.len(),
        encoded: SecretString::new(compact),
    })
}

/// Result of [`generate_keypair`].
#[derive(Debug)]
pub struct GeneratedKey {
    /// Public key, now stored in the application config.
    pub public_key: String,
    /// Private key in its transport encoding, for the operator's secret store.
    pub private_key: SecretString,
}

/// Generate a new keypair and install its public half into the app config.
///
/// The private key is produced inside a temporary directory that is removed
/// before this returns; it is handed back to the caller only in memory.
pub async fn generate_keypair<T: SigningTool>(
    tool: &T,
    app_config: &Path,
    passphrase: Option<&SecretString>,
) -> Result<GeneratedKey> {
    let passphrase = passphrase
        .filter(|p| !p.is_empty())
        .ok_or(Error::MissingPassphrase)?;

    let workdir = tempfile::Builder::new()
        .prefix("updater-keygen-")
        .tempdir()
        .fs_context("creating key generation directory", std::env::temp_dir())?;
    let key_path = workdir.path().join("updater.key");
    let pub_path = workdir.path().join("updater.key.pub");

    tool.generate(&key_path, passphrase).await?;

    let private_key = tokio::fs::read_to_string(&key_path)
        .await
        .fs_context("reading generated private key", &key_path)?;
    let public_key = tokio::fs::read_to_string(&pub_path)
        .await
        .fs_context("reading generated public key", &pub_path)?
        .trim()
        .to_string();
    if public_key.is_empty() {
        crate::bail!("signing tool wrote an empty public key to {}", pub_path.display());
    }

    let private_key = SecretString::new(private_key.trim().to_string());
    validate_key_material(&private_key, &KeyPolicy::default())?;

    install_public_key(app_config, &public_key).await?;

    workdir
        .close()
        .fs_context("removing key generation directory", std::env::temp_dir())?;

    Ok(GeneratedKey {
        public_key,
        private_key,
    })
}

/// Write `public_key` to `plugins.updater.pubkey` in a JSON app config.
pub async fn install_public_key(app_config: &Path, public_key: &str) -> Result<()> {
    let content = tokio::fs::read_to_string(app_config)
        .await
        .fs_context("reading application config", app_config)?;
    let mut doc: Value = serde_json::from_str(&content)?;

    let root = doc.as_object_mut().ok_or_else(|| {
        Error::InvalidConfig(format!("{} is not a JSON object", app_config.display()))
    })?;
    let updater = child_object(child_object(root, "plugins")?, "updater")?;
    updater.insert("pubkey".to_string(), Value::String(public_key.to_string()));

    let mut rendered = serde_json::to_string_pretty(&doc)?;
    rendered.push('\n');
    tokio::fs::write(app_config, rendered)
        .await
        .fs_context("writing application config", app_config)?;

    log::info!("Installed updater public key into {}", app_config.display());
    Ok(())
}

fn child_object<'a>(parent: &'a mut Map<String, Value>, key: &str) -> Result<&'a mut Map<String, Value>> {
    parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| Error::InvalidConfig(format!("`{key}` in the app config is not an object")))
}

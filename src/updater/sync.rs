//! Version synchronization between the canonical `package.json` and the
//! secondary build descriptors.
//!
//! Every edit is anchored to one field: `package.version` in a Cargo manifest
//! or the top-level `version` key of a JSON descriptor. Nothing else in the
//! file is touched, and a descriptor that already carries the version is left
//! byte-for-byte alone.

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::error::{Error, ErrorExt, Result};

/// How a descriptor file stores its version.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DescriptorKind {
    /// `[package] version = "..."` in a Cargo manifest
    CargoManifest,
    /// Top-level `"version"` key in a JSON document
    Json,
}

impl DescriptorKind {
    /// Infer the kind from the file name.
    pub fn detect(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(DescriptorKind::CargoManifest),
            Some("json") => Ok(DescriptorKind::Json),
            _ => Err(Error::InvalidConfig(format!(
                "cannot tell how to store a version in {}",
                path.display()
            ))),
        }
    }
}

/// Outcome for one descriptor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncedDescriptor {
    pub path: PathBuf,
    /// False when the file already carried the version.
    pub changed: bool,
}

/// Read the canonical version from a `package.json`.
pub async fn read_canonical_version(package_json: &Path) -> Result<String> {
    let content = tokio::fs::read_to_string(package_json)
        .await
        .fs_context("reading canonical version source", package_json)?;
    let doc: Value = serde_json::from_str(&content)?;

    doc.get("version")
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::MissingVersionField {
            path: package_json.to_path_buf(),
        })
}

/// Set the version in the canonical `package.json`.
///
/// An existing `version` value is replaced in place; a file without one gets
/// the key appended and is re-rendered with its key order kept.
pub async fn write_canonical_version(package_json: &Path, version: &str) -> Result<bool> {
    let content = tokio::fs::read_to_string(package_json)
        .await
        .fs_context("reading canonical version source", package_json)?;
    let mut doc: Value = serde_json::from_str(&content)?;

    let Some(object) = doc.as_object_mut() else {
        return Err(Error::InvalidConfig(format!(
            "{} is not a JSON object",
            package_json.display()
        )));
    };

    let updated = match object.get("version") {
        Some(Value::String(_)) => set_json_version(&content, version, package_json)?,
        _ => {
            object.insert("version".to_string(), Value::String(version.to_string()));
            render_json(&doc)?
        }
    };
    write_if_changed(package_json, &content, &updated).await
}

/// Propagate the canonical version into every descriptor.
///
/// Returns the canonical version and the per-file outcome.
pub async fn sync_version(
    package_json: &Path,
    descriptors: &[PathBuf],
) -> Result<(String, Vec<SyncedDescriptor>)> {
    let version = read_canonical_version(package_json).await?;
    let mut synced = Vec::with_capacity(descriptors.len());

    for path in descriptors {
        let changed = sync_descriptor(path, &version).await?;
        if changed {
            log::info!("Synced version {} into {}", version, path.display());
        } else {
            log::debug!("{} already at version {}", path.display(), version);
        }
        synced.push(SyncedDescriptor {
            path: path.clone(),
            changed,
        });
    }

    Ok((version, synced))
}

/// Write `version` into a single descriptor. Returns whether the file changed.
pub async fn sync_descriptor(path: &Path, version: &str) -> Result<bool> {
    let kind = DescriptorKind::detect(path)?;
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::MissingInput {
                what: "version descriptor".to_string(),
                attempted: vec![path.to_path_buf()],
            });
        }
        Err(e) => return Err(e).fs_context("reading version descriptor", path),
    };

    let updated = match kind {
        DescriptorKind::CargoManifest => set_cargo_version(&content, version, path)?,
        DescriptorKind::Json => set_json_version(&content, version, path)?,
    };

    write_if_changed(path, &content, &updated).await
}

fn set_cargo_version(content: &str, version: &str, path: &Path) -> Result<String> {
    let mut doc: toml_edit::DocumentMut = content.parse()?;

    let package = doc
        .get_mut("package")
        .and_then(|item| item.as_table_like_mut())
        .ok_or_else(|| Error::MissingVersionField {
            path: path.to_path_buf(),
        })?;

    match package.get_mut("version") {
        Some(item) if item.is_str() => {
            let current = item.as_str().unwrap_or_default();
            if current == version {
                return Ok(content.to_string());
            }
            // Keep the original decor (spacing, trailing comments) of the value.
            let decor = item.as_value().map(|v| v.decor().clone());
            let mut value = toml_edit::Value::from(version);
            if let Some(decor) = decor {
                *value.decor_mut() = decor;
            }
            *item = toml_edit::Item::Value(value);
        }
        // `version.workspace = true` or a missing key: nothing we may rewrite.
        _ => {
            return Err(Error::MissingVersionField {
                path: path.to_path_buf(),
            });
        }
    }

    Ok(doc.to_string())
}

fn set_json_version(content: &str, version: &str, path: &Path) -> Result<String> {
    let doc: Value = serde_json::from_str(content)?;
    let missing = || Error::MissingVersionField {
        path: path.to_path_buf(),
    };

    let current = doc
        .as_object()
        .and_then(|o| o.get("version"))
        .and_then(Value::as_str)
        .ok_or_else(missing)?;
    if current == version {
        return Ok(content.to_string());
    }

    let span = top_level_version_span(content).ok_or_else(missing)?;
    let replacement = serde_json::to_string(version)?;

    let mut updated = String::with_capacity(content.len() + replacement.len());
    updated.push_str(&content[..span.start]);
    updated.push_str(&replacement);
    updated.push_str(&content[span.end..]);
    Ok(updated)
}

/// Byte range of the root object's `"version"` string value, quotes included.
fn top_level_version_span(content: &str) -> Option<Range<usize>> {
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            b'"' => {
                let end = string_end(bytes, i)?;
                // At depth 1 only keys are followed by a colon.
                if depth == 1 && &content[i + 1..end] == "version" {
                    let colon = skip_whitespace(bytes, end + 1);
                    if bytes.get(colon) == Some(&b':') {
                        let start = skip_whitespace(bytes, colon + 1);
                        if bytes.get(start) == Some(&b'"') {
                            return Some(start..string_end(bytes, start)? + 1);
                        }
                    }
                }
                i = end;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index of the quote closing the string that opens at `start`.
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

fn render_json(doc: &Value) -> Result<String> {
    let mut rendered = serde_json::to_string_pretty(doc)?;
    rendered.push('\n');
    Ok(rendered)
}

async fn write_if_changed(path: &Path, original: &str, updated: &str) -> Result<bool> {
    if original == updated {
        return Ok(false);
    }
    tokio::fs::write(path, updated)
        .await
        .fs_context("writing version descriptor", path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARGO: &str = r#"[package]
name = "xy-todo-list"
version = "0.1.0" # bumped by release
edition = "2021"

[dependencies]
serde = { version = "1", features = ["derive"] }
"#;

    #[test]
    fn cargo_edit_only_touches_package_version() {
        let out = set_cargo_version(CARGO, "1.2.3", Path::new("Cargo.toml")).unwrap();
        assert!(out.contains("version = \"1.2.3\" # bumped by release"));
        assert!(out.contains("serde = { version = \"1\", features = [\"derive\"] }"));
        assert_eq!(out.lines().count(), CARGO.lines().count());
    }

    #[test]
    fn cargo_edit_is_identity_when_already_synced() {
        let once = set_cargo_version(CARGO, "1.2.3", Path::new("Cargo.toml")).unwrap();
        let twice = set_cargo_version(&once, "1.2.3", Path::new("Cargo.toml")).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn workspace_inherited_version_is_rejected() {
        let manifest = "[package]\nname = \"a\"\nversion.workspace = true\n";
        let err = set_cargo_version(manifest, "1.0.0", Path::new("Cargo.toml")).unwrap_err();
        assert!(matches!(err, Error::MissingVersionField { .. }));
    }

    #[test]
    fn json_edit_requires_existing_key() {
        let err = set_json_version("{\"name\":\"x\"}", "1.0.0", Path::new("a.json")).unwrap_err();
        assert!(matches!(err, Error::MissingVersionField { .. }));
    }

    #[test]
    fn json_edit_preserves_key_order() {
        let out = set_json_version(
            "{\"productName\":\"x\",\"version\":\"0.1.0\",\"identifier\":\"a.b\"}\n",
            "0.2.0",
            Path::new("tauri.conf.json"),
        )
        .unwrap();
        let product = out.find("productName").unwrap();
        let version = out.find("\"version\"").unwrap();
        let identifier = out.find("identifier").unwrap();
        assert!(product < version && version < identifier);
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn json_edit_changes_only_the_version_value() {
        let original = "{\n    \"version\": \"0.1.0\",\n    \"identifier\": \"a\\/b\",\n    \"n\": 1.0\n}\n";
        let out = set_json_version(original, "0.2.0", Path::new("tauri.conf.json")).unwrap();
        assert_eq!(
            out,
            "{\n    \"version\": \"0.2.0\",\n    \"identifier\": \"a\\/b\",\n    \"n\": 1.0\n}\n"
        );
    }

    #[test]
    fn json_edit_skips_nested_version_keys() {
        let original = r#"{"build":{"version":"9.9.9"},"note":"say \"version\": here","version":"0.1.0"}"#;
        let out = set_json_version(original, "0.2.0", Path::new("a.json")).unwrap();
        assert_eq!(
            out,
            r#"{"build":{"version":"9.9.9"},"note":"say \"version\": here","version":"0.2.0"}"#
        );
    }

    #[tokio::test]
    async fn canonical_version_requires_a_non_empty_field() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("package.json");

        for content in ["{\"name\": \"xy\"}", "{\"name\": \"xy\", \"version\": \"\"}"] {
            std::fs::write(&package, content).unwrap();
            let err = read_canonical_version(&package).await.unwrap_err();
            assert!(matches!(err, Error::MissingVersionField { ref path } if path == &package));
        }
    }

    #[tokio::test]
    async fn canonical_write_keeps_formatting() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("package.json");
        std::fs::write(&package, "{\n    \"name\": \"xy\",\n    \"version\": \"0.1.0\"\n}\n").unwrap();

        assert!(write_canonical_version(&package, "1.0.0").await.unwrap());
        assert_eq!(
            std::fs::read_to_string(&package).unwrap(),
            "{\n    \"name\": \"xy\",\n    \"version\": \"1.0.0\"\n}\n"
        );
    }

    #[tokio::test]
    async fn second_sync_leaves_descriptors_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("package.json");
        let cargo = dir.path().join("Cargo.toml");
        let conf = dir.path().join("tauri.conf.json");
        std::fs::write(&package, "{\n  \"name\": \"xy\",\n  \"version\": \"1.2.3\"\n}\n").unwrap();
        std::fs::write(&cargo, CARGO).unwrap();
        std::fs::write(&conf, "{\n    \"productName\": \"xy\",\n    \"version\": \"0.1.0\"\n}\n").unwrap();
        let descriptors = vec![cargo.clone(), conf.clone()];

        let (version, first) = sync_version(&package, &descriptors).await.unwrap();
        assert_eq!(version, "1.2.3");
        assert!(first.iter().all(|d| d.changed));
        let cargo_after = std::fs::read(&cargo).unwrap();
        let conf_after = std::fs::read(&conf).unwrap();

        let (_, second) = sync_version(&package, &descriptors).await.unwrap();
        assert!(second.iter().all(|d| !d.changed));
        assert_eq!(std::fs::read(&cargo).unwrap(), cargo_after);
        assert_eq!(std::fs::read(&conf).unwrap(), conf_after);
    }

    #[test]
    fn detects_descriptor_kind() {
        assert_eq!(
            DescriptorKind::detect(Path::new("src-tauri/Cargo.toml")).unwrap(),
            DescriptorKind::CargoManifest
        );
        assert_eq!(
            DescriptorKind::detect(Path::new("tauri.conf.json")).unwrap(),
            DescriptorKind::Json
        );
        assert!(DescriptorKind::detect(Path::new("VERSION")).is_err());
    }
}

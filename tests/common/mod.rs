//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use base64::Engine;
use updater_release::updater::{Error, Result, SecretString, SigningTool};

/// Decoded private key text in the shape the tauri CLI produces.
pub const PRIVATE_KEY_TEXT: &str = "untrusted comment: rsign encrypted secret key\n\
    RWRTY0IyQm9hcmRlZEtleU1hdGVyaWFsRm9yVGVzdGluZ09ubHlOb3RBUmVhbEtleQ==\n";

pub fn private_key_base64() -> String {
    base64::engine::general_purpose::STANDARD.encode(PRIVATE_KEY_TEXT)
}

/// Signs by writing `sig:<archive name>` next to the archive; generates the fixture key.
#[derive(Clone, Debug, Default)]
pub struct FakeSigner;

impl SigningTool for FakeSigner {
    async fn sign(&self, archive: &Path, key_file: &Path, passphrase: &SecretString) -> Result<()> {
        let key = std::fs::read_to_string(key_file)?;
        if key != private_key_base64() || passphrase.expose() != "pw" {
            return Err(Error::SigningToolFailed {
                program: "fake".into(),
                reason: "wrong key or passphrase".into(),
            });
        }
        let name = archive.file_name().unwrap().to_string_lossy().into_owned();
        std::fs::write(sig_path(archive), format!("sig:{name}\n"))?;
        Ok(())
    }

    async fn generate(&self, key_path: &Path, _passphrase: &SecretString) -> Result<()> {
        std::fs::write(key_path, private_key_base64())?;
        let mut public = key_path.as_os_str().to_owned();
        public.push(".pub");
        std::fs::write(PathBuf::from(public), "PUBLIC-KEY-BASE64\n")?;
        Ok(())
    }
}

pub fn sig_path(archive: &Path) -> PathBuf {
    let mut path = archive.as_os_str().to_owned();
    path.push(".sig");
    PathBuf::from(path)
}

pub fn touch(path: &Path, content: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A tauri project with one installer per platform already built.
pub fn built_project(root: &Path, version: &str) {
    touch(
        &root.join("package.json"),
        format!("{{\n  \"name\": \"xy-todo\",\n  \"version\": \"{version}\"\n}}\n").as_bytes(),
    );
    touch(
        &root.join("src-tauri/Cargo.toml"),
        format!("[package]\nname = \"xy-todo\"\nversion = \"{version}\"\nedition = \"2021\"\n").as_bytes(),
    );
    touch(
        &root.join("src-tauri/tauri.conf.json"),
        br#"{"productName":"XY Todo","plugins":{"updater":{"endpoints":[]}}}"#,
    );

    let target = root.join("src-tauri/target");
    for triple in ["aarch64-apple-darwin", "x86_64-apple-darwin"] {
        touch(
            &target.join(triple).join("release/bundle/macos/XY Todo.app/Contents/MacOS/xy-todo"),
            b"mach-o",
        );
    }
    touch(
        &target
            .join("x86_64-unknown-linux-gnu/release/bundle/appimage")
            .join(format!("xy-todo_{version}_amd64.AppImage")),
        b"ELF",
    );
    touch(
        &target
            .join("release/bundle/nsis")
            .join(format!("xy-todo_{version}_x64-setup.exe")),
        b"MZ",
    );
}

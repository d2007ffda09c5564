//! Updater archive writers.
//!
//! Archives are written with fixed metadata (zeroed timestamps and owners) so
//! the same installer always produces the same bytes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::updater::error::{Context, ErrorExt, Result};

/// Write `source` (file or directory) into a gzip-compressed tarball.
///
/// The entry is stored under the source's own file name, and symlinks inside
/// bundles are kept as symlinks.
pub fn write_tar_gz(source: &Path, archive: &Path) -> Result<()> {
    let name = source
        .file_name()
        .context("installer path has no file name")?;

    let file = File::create(archive).fs_context("creating updater archive", archive)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.mode(tar::HeaderMode::Deterministic);
    builder.follow_symlinks(false);

    if source.is_dir() {
        builder
            .append_dir_all(name, source)
            .fs_context("adding bundle to updater archive", source)?;
    } else {
        builder
            .append_path_with_name(source, name)
            .fs_context("adding installer to updater archive", source)?;
    }

    let encoder = builder
        .into_inner()
        .fs_context("finishing tar stream", archive)?;
    let mut writer = encoder
        .finish()
        .fs_context("finishing gzip stream", archive)?;
    writer.flush().fs_context("flushing updater archive", archive)?;

    Ok(())
}

/// Write a single installer file into a deflate zip.
pub fn write_zip(source: &Path, archive: &Path) -> Result<()> {
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .context("installer file name is not valid UTF-8")?;

    let file = File::create(archive).fs_context("creating updater archive", archive)?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(file));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    zip.start_file(name, options)?;
    let mut input = File::open(source).fs_context("opening installer", source)?;
    std::io::copy(&mut input, &mut zip).fs_context("compressing installer", source)?;

    let mut writer = zip.finish()?;
    writer.flush().fs_context("flushing updater archive", archive)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn tarball_contains_bundle_under_its_own_name() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("XY.app");
        std::fs::create_dir_all(app.join("Contents/MacOS")).unwrap();
        std::fs::write(app.join("Contents/MacOS/xy"), b"binary").unwrap();
        let archive = dir.path().join("XY_1.0.0_x64.app.tar.gz");

        write_tar_gz(&app, &archive).unwrap();

        let decoder = flate2::read::GzDecoder::new(File::open(&archive).unwrap());
        let mut tar = tar::Archive::new(decoder);
        let names: Vec<String> = tar
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.trim_end_matches('/') == "XY.app"));
        assert!(names.iter().any(|n| n == "XY.app/Contents/MacOS/xy"));
    }

    #[test]
    fn tarball_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("xy.AppImage");
        std::fs::write(&image, b"appimage bytes").unwrap();
        let first = dir.path().join("first.tar.gz");
        let second = dir.path().join("second.tar.gz");

        write_tar_gz(&image, &first).unwrap();
        write_tar_gz(&image, &second).unwrap();

        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
    }

    #[test]
    fn zip_holds_installer() {
        let dir = tempfile::tempdir().unwrap();
        let setup = dir.path().join("xy_1.0.0_x64-setup.exe");
        std::fs::write(&setup, b"MZ installer").unwrap();
        let archive = dir.path().join("xy_1.0.0_x64-setup.nsis.zip");

        write_zip(&setup, &archive).unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        let mut entry = zip.by_name("xy_1.0.0_x64-setup.exe").unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"MZ installer");
    }
}

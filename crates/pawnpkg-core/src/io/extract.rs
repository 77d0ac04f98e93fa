//! Archive extraction module
//!
//! Turns archive bytes into a flat list of entries. Zip and tar.gz are decoded
//! in memory. RAR and 7z go through a fallback decoder that unpacks into a
//! scoped directory under the caller's staging area and reads the files back.
//! Nested archives are returned as plain entries; nothing is expanded twice.

use std::io::{self, Cursor, Read};
use std::path::{Component, Path};

use bytes::Bytes;
use pawnpkg_schema::ArchiveFormat;
use thiserror::Error;
use walkdir::WalkDir;
use zip::ZipArchive;

use super::download::MAX_PREALLOC;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to decode archive '{name}': {reason}")]
    Decode { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ExtractError {
    fn decode(name: &str, reason: impl ToString) -> Self {
        Self::Decode {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// One regular file read out of an archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// `/`-separated path relative to the archive root.
    pub path: String,
    pub bytes: Bytes,
}

/// Pick a decoder: the filename suffix wins, magic bytes decide otherwise.
pub fn detect_format(name: &str, bytes: &[u8]) -> Option<ArchiveFormat> {
    ArchiveFormat::from_name(name).or_else(|| ArchiveFormat::sniff(bytes))
}

/// Extract every regular file of an archive.
///
/// `staging` is only written to by the fallback decoder; whatever it writes
/// there is removed before this function returns.
///
/// # Errors
///
/// Returns [`ExtractError::Decode`] naming the archive when its content cannot
/// be decoded with the selected format.
pub fn extract(
    name: &str,
    bytes: &[u8],
    format: ArchiveFormat,
    staging: &Path,
) -> Result<Vec<ArchiveEntry>, ExtractError> {
    let entries = match format {
        ArchiveFormat::Zip => extract_zip(name, bytes)?,
        ArchiveFormat::TarGz => extract_tar_gz(name, bytes)?,
        ArchiveFormat::Rar | ArchiveFormat::SevenZ => {
            extract_fallback(name, bytes, format, staging)?
        }
    };
    tracing::debug!("extracted {} entries from {name} ({format})", entries.len());
    Ok(entries)
}

fn extract_zip(name: &str, bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ExtractError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::decode(name, e))?;
    let mut entries = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExtractError::decode(name, e))?;
        if file.is_dir() {
            continue;
        }
        // Zip Slip: entries escaping the root are dropped.
        let Some(path) = file.enclosed_name().as_deref().and_then(entry_path) else {
            tracing::warn!("skipping unsafe entry '{}' in {name}", file.name());
            continue;
        };

        let declared = usize::try_from(file.size()).unwrap_or(MAX_PREALLOC);
        let mut buf = Vec::with_capacity(declared.min(MAX_PREALLOC));
        file.read_to_end(&mut buf)
            .map_err(|e| ExtractError::decode(name, e))?;
        entries.push(ArchiveEntry {
            path,
            bytes: Bytes::from(buf),
        });
    }

    Ok(entries)
}

fn extract_tar_gz(name: &str, bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ExtractError> {
    let gz_decoder = flate2::read::GzDecoder::new(bytes);
    let mut archive = tar::Archive::new(gz_decoder);
    let mut entries = Vec::new();

    for entry in archive.entries().map_err(|e| ExtractError::decode(name, e))? {
        let mut entry = entry.map_err(|e| ExtractError::decode(name, e))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let raw = entry
            .path()
            .map_err(|e| ExtractError::decode(name, e))?
            .into_owned();
        let Some(path) = entry_path(&raw) else {
            tracing::warn!("skipping unsafe entry '{}' in {name}", raw.display());
            continue;
        };

        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|e| ExtractError::decode(name, e))?;
        entries.push(ArchiveEntry {
            path,
            bytes: Bytes::from(buf),
        });
    }

    Ok(entries)
}

fn extract_fallback(
    name: &str,
    bytes: &[u8],
    format: ArchiveFormat,
    staging: &Path,
) -> Result<Vec<ArchiveEntry>, ExtractError> {
    std::fs::create_dir_all(staging)?;
    let scratch = tempfile::Builder::new()
        .prefix("unpack-")
        .tempdir_in(staging)?;
    let archive_path = scratch.path().join(format!("archive.{format}"));
    let out_dir = scratch.path().join("out");
    std::fs::write(&archive_path, bytes)?;
    std::fs::create_dir_all(&out_dir)?;

    match format {
        ArchiveFormat::SevenZ => sevenz_rust::decompress_file(&archive_path, &out_dir)
            .map_err(|e| ExtractError::decode(name, e))?,
        _ => {
            let (Some(src), Some(dest)) = (archive_path.to_str(), out_dir.to_str()) else {
                return Err(ExtractError::decode(name, "staging path is not valid UTF-8"));
            };
            rar::Archive::extract_all(src, dest, "")
                .map_err(|e| ExtractError::decode(name, format!("{e:?}")))?;
        }
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(&out_dir).follow_links(false) {
        let entry = entry.map_err(|e| ExtractError::decode(name, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = entry
            .path()
            .strip_prefix(&out_dir)
            .ok()
            .and_then(entry_path)
        else {
            continue;
        };
        entries.push(ArchiveEntry {
            path,
            bytes: Bytes::from(std::fs::read(entry.path())?),
        });
    }
    // `scratch` drops here and takes the unpacked tree with it.
    Ok(entries)
}

/// Normalize a relative path to `/`-separated form, rejecting anything that
/// is absolute or climbs out of the root.
fn entry_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default();
            for (path, content) in files {
                if path.ends_with('/') {
                    writer.add_directory(*path, options).unwrap();
                } else {
                    writer.start_file(*path, options).unwrap();
                    writer.write_all(content).unwrap();
                }
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    fn tar_gz_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, *content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_extract_zip_flat_list() {
        let staging = tempdir().unwrap();
        let data = zip_bytes(&[
            ("include/", b""),
            ("include/a.inc", b"native A();"),
            ("plugins/b.so", b"\x7fELF"),
        ]);

        let entries = extract("bundle.zip", &data, ArchiveFormat::Zip, staging.path()).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["include/a.inc", "plugins/b.so"]);
        assert_eq!(&entries[0].bytes[..], b"native A();");
    }

    #[test]
    fn test_extract_tar_gz() {
        let staging = tempdir().unwrap();
        let data = tar_gz_bytes(&[("pkg/components/x.dll", b"MZ"), ("pkg/a.inc", b"//")]);

        let entries =
            extract("bundle.tar.gz", &data, ArchiveFormat::TarGz, staging.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "pkg/components/x.dll");
    }

    #[test]
    fn test_nested_archive_is_not_expanded() {
        let staging = tempdir().unwrap();
        let inner = zip_bytes(&[("deep.inc", b"x")]);
        let data = zip_bytes(&[("inner.zip", &inner)]);

        let entries = extract("outer.zip", &data, ArchiveFormat::Zip, staging.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "inner.zip");
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let staging = tempdir().unwrap();
        for format in [ArchiveFormat::Zip, ArchiveFormat::TarGz, ArchiveFormat::SevenZ] {
            let err = extract("broken.bin", b"not an archive", format, staging.path()).unwrap_err();
            match err {
                ExtractError::Decode { name, .. } => assert_eq!(name, "broken.bin"),
                ExtractError::Io(e) => panic!("expected decode error, got {e}"),
            }
        }
    }

    #[test]
    fn test_fallback_cleans_staging() {
        let staging = tempdir().unwrap();
        let _ = extract("broken.7z", b"garbage", ArchiveFormat::SevenZ, staging.path());
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_extract_7z_through_staging() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("pkg/components")).unwrap();
        std::fs::write(src.join("pkg/a.inc"), b"native a();").unwrap();
        std::fs::write(src.join("pkg/components/c.dll"), b"MZ").unwrap();
        let archive = dir.path().join("bundle.7z");
        sevenz_rust::compress_to_path(&src, &archive).unwrap();
        let bytes = std::fs::read(&archive).unwrap();

        let staging = dir.path().join("staging");
        let mut entries = extract("bundle.7z", &bytes, ArchiveFormat::SevenZ, &staging).unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["pkg/a.inc", "pkg/components/c.dll"]);
        assert_eq!(&entries[1].bytes[..], b"MZ");
        assert_eq!(std::fs::read_dir(&staging).unwrap().count(), 0);
    }

    #[test]
    fn test_detect_format() {
        let zip = zip_bytes(&[("a.inc", b"")]);
        assert_eq!(detect_format("download", &zip), Some(ArchiveFormat::Zip));
        assert_eq!(detect_format("x.tgz", b""), Some(ArchiveFormat::TarGz));
        assert_eq!(detect_format("x.dll", b"MZ"), None);
    }

    #[test]
    fn test_entry_path_rejects_escape() {
        assert_eq!(entry_path(Path::new("a/./b.inc")).as_deref(), Some("a/b.inc"));
        assert_eq!(entry_path(Path::new("../b.inc")), None);
        assert_eq!(entry_path(Path::new("/etc/passwd")), None);
        assert_eq!(entry_path(Path::new("")), None);
    }
}

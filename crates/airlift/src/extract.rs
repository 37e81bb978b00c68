//! Zip archive extraction into a version directory.

use crate::error::UpdateError;
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use zip::ZipArchive;

/// Extract `bytes` (a zip archive) under `dest_dir`, creating it if needed.
///
/// Entries are written in stream order, overwriting existing files. Entry
/// names that would resolve outside `dest_dir` (parent segments, absolute
/// paths) abort the extraction: archives are untrusted input.
pub fn extract_archive(bytes: &[u8], dest_dir: &Path) -> Result<(), UpdateError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| UpdateError::Extraction(format!("invalid zip archive: {}", e)))?;

    fs::create_dir_all(dest_dir).map_err(|e| {
        UpdateError::Extraction(format!("failed to create {}: {}", dest_dir.display(), e))
    })?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| UpdateError::Extraction(format!("failed to read entry {}: {}", index, e)))?;

        let relative_path = entry.enclosed_name().ok_or_else(|| {
            UpdateError::Extraction(format!(
                "entry '{}' escapes the destination directory",
                entry.name()
            ))
        })?;
        let target = dest_dir.join(relative_path);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| {
                UpdateError::Extraction(format!("failed to create {}: {}", target.display(), e))
            })?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                UpdateError::Extraction(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let mut output = fs::File::create(&target).map_err(|e| {
            UpdateError::Extraction(format!("failed to create {}: {}", target.display(), e))
        })?;
        io::copy(&mut entry, &mut output).map_err(|e| {
            UpdateError::Extraction(format!("failed to write {}: {}", target.display(), e))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, contents) in entries {
            match contents {
                Some(bytes) => {
                    writer.start_file(*name, options).unwrap();
                    writer.write_all(bytes).unwrap();
                }
                None => {
                    writer.add_directory(*name, options).unwrap();
                }
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn reproduces_entry_bytes_and_paths() {
        let bytes = build_zip(&[
            ("index.bundle", Some(b"abc".as_slice())),
            ("assets/", None),
            ("assets/logo.png", Some(b"\x89PNG".as_slice())),
            ("assets/nested/deep.txt", Some(b"deep".as_slice())),
        ]);

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("v1");
        extract_archive(&bytes, &dest).unwrap();

        assert_eq!(fs::read(dest.join("index.bundle")).unwrap(), b"abc");
        assert_eq!(fs::read(dest.join("assets/logo.png")).unwrap(), b"\x89PNG");
        assert_eq!(fs::read(dest.join("assets/nested/deep.txt")).unwrap(), b"deep");
    }

    #[test]
    fn overwrites_existing_files() {
        let bytes = build_zip(&[("index.bundle", Some(b"new".as_slice()))]);

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("v1");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("index.bundle"), b"old").unwrap();

        extract_archive(&bytes, &dest).unwrap();
        assert_eq!(fs::read(dest.join("index.bundle")).unwrap(), b"new");
    }

    #[test]
    fn rejects_path_traversal_entries() {
        let bytes = build_zip(&[("../evil.txt", Some(b"pwned".as_slice()))]);

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("v1");
        let err = extract_archive(&bytes, &dest).unwrap_err();
        assert!(matches!(err, UpdateError::Extraction(_)));
        assert!(!temp.path().join("evil.txt").exists());
    }

    #[test]
    fn extraction_is_deterministic_across_destinations() {
        let bytes = build_zip(&[
            ("a.txt", Some(b"one".as_slice())),
            ("dir/b.txt", Some(b"two".as_slice())),
        ]);

        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        extract_archive(&bytes, &first).unwrap();
        extract_archive(&bytes, &second).unwrap();

        for file in ["a.txt", "dir/b.txt"] {
            assert_eq!(
                fs::read(first.join(file)).unwrap(),
                fs::read(second.join(file)).unwrap()
            );
        }
    }

    #[test]
    fn garbage_bytes_are_an_extraction_error() {
        let temp = TempDir::new().unwrap();
        let err = extract_archive(b"definitely not a zip", &temp.path().join("v1")).unwrap_err();
        assert!(matches!(err, UpdateError::Extraction(_)));
    }
}

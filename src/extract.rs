use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::domain::ResourceName;
use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractInfo {
    pub files: usize,
}

pub trait ArchiveExtractor: Send + Sync {
    fn extract(
        &self,
        resource: &ResourceName,
        archive: &Path,
        target_dir: &Path,
    ) -> Result<ExtractInfo, FetchError>;
}

/// Unpacks zip archives entry by entry, keeping the archive's own directory layout.
/// Existing files at the same relative path are overwritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        resource: &ResourceName,
        archive: &Path,
        target_dir: &Path,
    ) -> Result<ExtractInfo, FetchError> {
        let fail = |message: String| FetchError::Extract {
            resource: resource.to_string(),
            message,
        };

        let file = fs::File::open(archive)
            .map_err(|err| fail(format!("open archive {}: {err}", archive.display())))?;
        let mut zip = ZipArchive::new(file)
            .map_err(|err| fail(format!("read archive {}: {err}", archive.display())))?;

        let mut files = 0;
        for i in 0..zip.len() {
            let mut entry = zip
                .by_index(i)
                .map_err(|err| fail(format!("read entry #{i}: {err}")))?;
            let entry_path = match entry.enclosed_name() {
                Some(path) => target_dir.join(path),
                None => {
                    return Err(fail(format!(
                        "zip entry {} escapes the extraction directory",
                        entry.name()
                    )));
                }
            };

            if entry.is_dir() {
                fs::create_dir_all(&entry_path)
                    .map_err(|err| fail(format!("create dir {}: {err}", entry_path.display())))?;
                continue;
            }

            if let Some(parent) = entry_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|err| fail(format!("create dir {}: {err}", parent.display())))?;
            }
            let mut outfile = fs::File::create(&entry_path)
                .map_err(|err| fail(format!("create {}: {err}", entry_path.display())))?;
            io::copy(&mut entry, &mut outfile)
                .map_err(|err| fail(format!("write entry {}: {err}", entry.name())))?;
            files += 1;
        }

        debug!(%resource, files, target = %target_dir.display(), "archive extracted");
        Ok(ExtractInfo { files })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_nested_layout() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("maps.zip");
        write_zip(
            &archive,
            &[
                ("empty/", ""),
                ("top.map", "type octile"),
                ("sub/inner.scen", "version 1"),
            ],
        );
        let target = temp.path().join("maps");
        fs::create_dir_all(&target).unwrap();

        let name: ResourceName = "maps".parse().unwrap();
        let info = ZipExtractor.extract(&name, &archive, &target).unwrap();

        assert_eq!(info.files, 2);
        assert_eq!(fs::read(target.join("top.map")).unwrap(), b"type octile");
        assert_eq!(fs::read(target.join("sub/inner.scen")).unwrap(), b"version 1");
        assert!(target.join("empty").is_dir());
    }

    #[test]
    fn merges_into_existing_directory() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("maps.zip");
        write_zip(&archive, &[("a.map", "new")]);
        let target = temp.path().join("maps");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("a.map"), b"old").unwrap();
        fs::write(target.join("keep.txt"), b"keep").unwrap();

        let name: ResourceName = "maps".parse().unwrap();
        ZipExtractor.extract(&name, &archive, &target).unwrap();

        assert_eq!(fs::read(target.join("a.map")).unwrap(), b"new");
        assert_eq!(fs::read(target.join("keep.txt")).unwrap(), b"keep");
    }

    #[test]
    fn rejects_invalid_archive() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"<html>not found</html>").unwrap();

        let name: ResourceName = "broken".parse().unwrap();
        let err = ZipExtractor
            .extract(&name, &archive, temp.path())
            .unwrap_err();
        assert!(matches!(err, FetchError::Extract { resource, .. } if resource == "broken"));
    }

    #[test]
    fn rejects_entries_escaping_the_target() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("../evil.map", "outside")]);
        let target = temp.path().join("evil");
        fs::create_dir_all(&target).unwrap();

        let name: ResourceName = "evil".parse().unwrap();
        let err = ZipExtractor.extract(&name, &archive, &target).unwrap_err();

        assert!(
            matches!(&err, FetchError::Extract { resource, message }
                if resource == "evil" && message.contains("escapes the extraction directory")),
            "{err:?}"
        );
        assert!(!temp.path().join("evil.map").exists());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }

    #[test]
    fn error_names_the_failing_step() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("maps.zip");
        write_zip(&archive, &[("sub/inner.scen", "version 1")]);
        let target = temp.path().join("maps");
        fs::create_dir_all(&target).unwrap();
        // A plain file where the entry needs a directory.
        fs::write(target.join("sub"), b"blocker").unwrap();

        let name: ResourceName = "maps".parse().unwrap();
        let err = ZipExtractor.extract(&name, &archive, &target).unwrap_err();

        assert!(
            matches!(&err, FetchError::Extract { message, .. } if message.starts_with("create dir ")),
            "{err:?}"
        );
    }
}

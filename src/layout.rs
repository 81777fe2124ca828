use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::domain::{ARCHIVE_EXT, ResourceName};
use crate::error::FetchError;

/// Paths under the output root. Every path is a pure function of the resource name.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: Utf8PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn archive_path(&self, name: &ResourceName) -> Utf8PathBuf {
        self.root.join(name.archive_file_name())
    }

    pub fn extraction_dir(&self, name: &ResourceName) -> Utf8PathBuf {
        self.root.join(name.as_str())
    }

    pub fn ensure_root(&self) -> Result<(), FetchError> {
        fs::create_dir_all(self.root.as_std_path()).map_err(|err| {
            FetchError::Filesystem(format!("create output root {}: {err}", self.root))
        })
    }

    pub fn ensure_extraction_dir(&self, name: &ResourceName) -> Result<Utf8PathBuf, FetchError> {
        let dir = self.extraction_dir(name);
        fs::create_dir_all(dir.as_std_path()).map_err(|err| FetchError::Write {
            resource: name.to_string(),
            message: format!("create {dir}: {err}"),
        })?;
        Ok(dir)
    }

    /// Archive files currently sitting directly in the output root, sorted by path.
    pub fn list_archives(&self) -> Result<Vec<Utf8PathBuf>, FetchError> {
        let entries = fs::read_dir(self.root.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("read {}: {err}", self.root)))?;
        let mut archives = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| FetchError::Filesystem(err.to_string()))?;
            let file_type = entry
                .file_type()
                .map_err(|err| FetchError::Filesystem(err.to_string()))?;
            if !file_type.is_file() {
                continue;
            }
            // Match on the raw OS name so unrelated non-UTF-8 siblings are skipped.
            let path = entry.path();
            let is_archive = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXT));
            if !is_archive {
                continue;
            }
            let path = Utf8PathBuf::from_path_buf(path).map_err(|path| {
                FetchError::Filesystem(format!(
                    "non-utf8 archive path in output root: {}",
                    path.display()
                ))
            })?;
            archives.push(path);
        }
        archives.sort();
        Ok(archives)
    }

    /// Deletes every archive in the output root, whichever resource wrote it.
    /// Extraction directories are left alone.
    pub fn remove_archives(&self) -> Result<Vec<Utf8PathBuf>, FetchError> {
        let archives = self.list_archives()?;
        for path in &archives {
            debug!(%path, "removing archive");
            fs::remove_file(path.as_std_path()).map_err(|err| FetchError::Cleanup {
                path: path.clone(),
                message: err.to_string(),
            })?;
        }
        Ok(archives)
    }
}

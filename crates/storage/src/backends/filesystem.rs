//! Local filesystem content backend.

use crate::error::{StorageError, StorageResult};
use crate::traits::ContentBackend;
use async_trait::async_trait;
use bytes::Bytes;
use scout_core::{ContentClass, ContentPath};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// Local filesystem content backend.
///
/// Every fetch goes to disk; nothing is cached, so edits to the content
/// roots are visible on the next request.
#[derive(Debug, Clone)]
pub struct FilesystemBackend {
    scripts_root: PathBuf,
    bin_root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend over the scripts and bin roots.
    pub fn new(scripts_root: impl AsRef<Path>, bin_root: impl AsRef<Path>) -> Self {
        Self {
            scripts_root: scripts_root.as_ref().to_path_buf(),
            bin_root: bin_root.as_ref().to_path_buf(),
        }
    }

    /// Content root for a class.
    pub fn root(&self, class: ContentClass) -> &Path {
        match class {
            ContentClass::Scripts => &self.scripts_root,
            ContentClass::Bin => &self.bin_root,
        }
    }

    /// Read `relative` under `root`.
    ///
    /// Returns `Ok(None)` when the path does not exist or is not a regular
    /// file. Other I/O failures are returned as errors.
    pub async fn read_file(root: &Path, relative: &str) -> StorageResult<Option<Bytes>> {
        let root_owned = root.to_path_buf();
        let relative_owned = relative.to_string();
        let resolved =
            tokio::task::spawn_blocking(move || Self::resolve_file_sync(&root_owned, &relative_owned))
                .await
                .map_err(|e| {
                    StorageError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
                })??;

        let Some(path) = resolved else {
            return Ok(None);
        };

        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            // Removed between the stat and the read.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Synchronous path resolution with path traversal protection.
    ///
    /// Returns `Ok(None)` for missing paths and directories, and an error if
    /// the resolved file would escape the content root (including through a
    /// symlink inside the root).
    fn resolve_file_sync(root: &Path, relative: &str) -> StorageResult<Option<PathBuf>> {
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(StorageError::InvalidKey(format!(
                        "contains unsafe path component: {relative}"
                    )));
                }
            }
        }

        let path = root.join(relative);

        let metadata = match std::fs::metadata(&path) {
            Ok(meta) => meta,
            // Names the filesystem cannot hold (ENAMETOOLONG) cannot exist either.
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::InvalidFilename
                ) =>
            {
                return Ok(None);
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        if !metadata.is_file() {
            return Ok(None);
        }

        let root_canonical = root.canonicalize().map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to canonicalize root: {e}"),
            ))
        })?;
        let canonical = path.canonicalize().map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to canonicalize path: {e}"),
            ))
        })?;

        if !canonical.starts_with(&root_canonical) {
            return Err(StorageError::InvalidKey(format!(
                "resolved path escapes content root: {relative}"
            )));
        }

        Ok(Some(path))
    }
}

#[async_trait]
impl ContentBackend for FilesystemBackend {
    #[instrument(skip(self, path), fields(backend = "filesystem", key = %path))]
    async fn fetch(&self, path: &ContentPath) -> StorageResult<Option<Bytes>> {
        let root = self.root(path.class());
        let content = Self::read_file(root, &path.relative_path()).await?;
        if content.is_none() {
            tracing::debug!("content not found on local filesystem");
        }
        Ok(content)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn health_check(&self) -> StorageResult<()> {
        for root in [&self.scripts_root, &self.bin_root] {
            match fs::metadata(root).await {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => {
                    return Err(StorageError::Config(format!(
                        "content root is not a directory: {}",
                        root.display()
                    )));
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::warn!(root = %root.display(), "Content root does not exist, all lookups under it will miss");
                }
                Err(e) => return Err(StorageError::Io(e)),
            }
        }
        Ok(())
    }
}

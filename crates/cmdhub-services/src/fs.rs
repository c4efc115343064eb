//! `FileSystem` backed by `tokio::fs`

use async_trait::async_trait;
use cmdhub_foundation::{DirEntry, FileSystem, FsError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

/// Sibling temp file used for write-then-rename, unique per call
fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let nonce = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{}.{}.{}.tmp", file_name, std::process::id(), nonce))
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn read_file(&self, path: &Path) -> Result<String, FsError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FsError::from_io(path, e))
    }

    /// Readers never observe a half-written file
    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), FsError> {
        let temp = temp_path_for(path);
        tokio::fs::write(&temp, contents)
            .await
            .map_err(|e| FsError::from_io(path, e))?;

        if let Err(e) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(FsError::from_io(path, e));
        }
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn mkdir(&self, path: &Path, recursive: bool) -> Result<(), FsError> {
        let result = if recursive {
            tokio::fs::create_dir_all(path).await
        } else {
            tokio::fs::create_dir(path).await
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(FsError::from_io(path, e)),
        }
    }

    async fn delete_file(&self, path: &Path) -> Result<(), FsError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| FsError::from_io(path, e))
    }

    /// Symlinked directories are reported as files and never descended into
    async fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|e| FsError::from_io(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FsError::from_io(path, e))?
        {
            let entry_path = entry.path();
            match entry.file_type().await {
                Ok(file_type) => entries.push(DirEntry {
                    path: entry_path,
                    is_dir: file_type.is_dir(),
                }),
                Err(e) => debug!(path = %entry_path.display(), error = %e, "Skipping entry"),
            }
        }
        Ok(entries)
    }
}

//! Injected capabilities for file and network access
//!
//! The resolution and caching core never touches `std::fs` or an HTTP client
//! directly. Production implementations live in `cmdhub-services`; tests use
//! the mocks from `cmdhub-test-support`.

use crate::error::{FsError, HttpError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One entry returned by [`FileSystem::list_dir`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }
}

/// File access capability
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read a whole file as UTF-8 text
    async fn read_file(&self, path: &Path) -> Result<String, FsError>;

    /// Replace a file's content
    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), FsError>;

    async fn exists(&self, path: &Path) -> bool;

    async fn mkdir(&self, path: &Path, recursive: bool) -> Result<(), FsError>;

    async fn delete_file(&self, path: &Path) -> Result<(), FsError>;

    /// List the direct children of a directory (non-recursive)
    async fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FsError>;
}

/// Response of a successful HTTP GET
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: String,
    /// URL after redirects
    pub final_url: String,
}

impl HttpResponse {
    /// Build a 200 response, mostly useful in tests
    pub fn ok(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            headers: HashMap::new(),
            body: body.into(),
            final_url: url.into(),
        }
    }
}

/// HTTP GET capability
///
/// Implementations map non-2xx statuses to [`HttpError::Status`], so an `Ok`
/// response always carries a success status.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

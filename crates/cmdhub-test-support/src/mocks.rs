//! Mock implementations for testing

use async_trait::async_trait;
use cmdhub_foundation::{DirEntry, FileSystem, FsError, HttpClient, HttpError, HttpResponse};
use mockall::mock;
use std::path::Path;

mock! {
    pub FileSystem {}

    #[async_trait]
    impl FileSystem for FileSystem {
        async fn read_file(&self, path: &Path) -> Result<String, FsError>;
        async fn write_file(&self, path: &Path, contents: &str) -> Result<(), FsError>;
        async fn exists(&self, path: &Path) -> bool;
        async fn mkdir(&self, path: &Path, recursive: bool) -> Result<(), FsError>;
        async fn delete_file(&self, path: &Path) -> Result<(), FsError>;
        async fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FsError>;
    }
}

mock! {
    pub HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
    }
}

/// Create a mock file system for testing
pub fn mock_file_system() -> MockFileSystem {
    MockFileSystem::new()
}

/// Create a mock HTTP client for testing
pub fn mock_http_client() -> MockHttpClient {
    MockHttpClient::new()
}

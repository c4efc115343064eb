//! Common interface of remote and local command sources

use async_trait::async_trait;
use cmdhub_foundation::{Manifest, Result};

/// Options for manifest and command lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Skip cached data and go to the source
    pub force_refresh: bool,
}

impl FetchOptions {
    pub fn refresh() -> Self {
        Self {
            force_refresh: true,
        }
    }
}

#[async_trait]
pub trait CommandRepository: Send + Sync {
    /// Catalog of commands for `language`
    async fn get_manifest(&self, language: &str, options: FetchOptions) -> Result<Manifest>;

    /// Raw command file content; fails with `CommandNotFound` when the catalog lacks `name`
    async fn get_command(&self, name: &str, language: &str, options: FetchOptions) -> Result<String>;
}

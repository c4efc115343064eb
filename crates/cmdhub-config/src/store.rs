//! Read/write a single configuration document at a fixed path

use crate::document::ConfigDocument;
use cmdhub_foundation::{CmdhubError, FileSystem, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Directory holding cmdhub's files under a home or project root
pub const CONFIG_DIR: &str = ".cmdhub";
pub const CONFIG_FILE: &str = "config.json";

pub struct ConfigStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl ConfigStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    /// User-scoped store at `~/.cmdhub/config.json`
    pub fn user(fs: Arc<dyn FileSystem>, home: &Path) -> Self {
        Self::new(fs, home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Project-scoped store at `<root>/.cmdhub/config.json`
    pub fn project(fs: Arc<dyn FileSystem>, project_root: &Path) -> Self {
        Self::new(fs, project_root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, or `None` if it is missing, unparsable or invalid
    pub async fn get_config(&self) -> Option<ConfigDocument> {
        let content = match self.fs.read_file(&self.path).await {
            Ok(content) => content,
            Err(e) if e.is_not_found() => {
                debug!(path = %self.path.display(), "No configuration file");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable configuration file");
                return None;
            }
        };

        let document = serde_json::from_str::<serde_json::Value>(&content)
            .map_err(CmdhubError::from)
            .and_then(ConfigDocument::from_value)
            .and_then(|doc| doc.validate().map(|_| doc));

        match document {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring invalid configuration file");
                None
            }
        }
    }

    /// Load the raw document for a read-modify-write
    ///
    /// Unlike [`get_config`](Self::get_config) nothing is skipped: a missing
    /// file is an empty document, while an unreadable or unparsable file is an
    /// error so that an update never replaces content it could not read.
    /// Values are not validated here; `set_config` checks the edited result.
    pub async fn load_for_update(&self) -> Result<ConfigDocument> {
        let content = match self.fs.read_file(&self.path).await {
            Ok(content) => content,
            Err(e) if e.is_not_found() => return Ok(ConfigDocument::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(ConfigDocument::new());
        }
        ConfigDocument::from_value(serde_json::from_str(&content)?)
    }

    /// Validate and write the document as pretty-printed JSON
    ///
    /// A rejected document leaves the existing file untouched.
    pub async fn set_config(&self, document: &ConfigDocument) -> Result<()> {
        document.validate()?;

        if let Some(parent) = self.path.parent() {
            self.fs.mkdir(parent, true).await?;
        }

        let content = serde_json::to_string_pretty(document)?;
        self.fs.write_file(&self.path, &content).await?;

        info!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }

    /// Write an arbitrary JSON value, rejecting anything that is not an object
    pub async fn set_value(&self, value: serde_json::Value) -> Result<()> {
        let document = ConfigDocument::from_value(value)?;
        self.set_config(&document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdhub_test_support::MemoryFileSystem;
    use serde_json::json;

    fn store() -> (Arc<MemoryFileSystem>, ConfigStore) {
        let fs = Arc::new(MemoryFileSystem::new());
        let store = ConfigStore::user(fs.clone(), Path::new("/home/dev"));
        (fs, store)
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let (_fs, store) = store();
        assert!(store.get_config().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_and_invalid_files_are_none() {
        let (fs, store) = store();
        fs.insert(store.path(), "{not json");
        assert!(store.get_config().await.is_none());

        fs.insert(store.path(), "[1, 2]");
        assert!(store.get_config().await.is_none());

        fs.insert(store.path(), r#"{"preferredLanguage": "english"}"#);
        assert!(store.get_config().await.is_none());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_unknown_keys() {
        let (fs, store) = store();
        store
            .set_value(json!({"preferredLanguage": "ja", "futureKey": {"nested": [1]}}))
            .await
            .unwrap();

        let written = fs.contents(store.path()).unwrap();
        assert!(written.contains('\n'), "should be pretty-printed");

        let doc = store.get_config().await.unwrap();
        assert_eq!(doc.preferred_language(), Some("ja"));
        assert_eq!(doc.get("futureKey"), Some(&json!({"nested": [1]})));
    }

    #[tokio::test]
    async fn test_update_keeps_keys_of_an_invalid_document() {
        let (fs, store) = store();
        fs.insert(
            store.path(),
            r#"{"preferredLanguage": "english", "theme": "dark"}"#,
        );
        assert!(store.get_config().await.is_none());

        let mut doc = store.load_for_update().await.unwrap();
        doc.set_preferred_language("ja");
        store.set_config(&doc).await.unwrap();

        let saved = store.get_config().await.unwrap();
        assert_eq!(saved.preferred_language(), Some("ja"));
        assert_eq!(saved.get("theme"), Some(&json!("dark")));
    }

    #[tokio::test]
    async fn test_update_refuses_unparsable_document() {
        let (fs, store) = store();
        assert!(store.load_for_update().await.unwrap().as_map().is_empty());

        fs.insert(store.path(), "{not json");
        assert!(store.load_for_update().await.is_err());
        assert_eq!(fs.contents(store.path()).as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn test_rejected_write_leaves_file_untouched() {
        let (fs, store) = store();
        store
            .set_value(json!({"preferredLanguage": "fr"}))
            .await
            .unwrap();

        let err = store
            .set_value(json!({"repositoryURL": "::nope::"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
        assert!(store.set_value(json!("scalar")).await.is_err());

        assert_eq!(fs.write_count(), 1);
        assert_eq!(
            store.get_config().await.unwrap().preferred_language(),
            Some("fr")
        );
    }
}

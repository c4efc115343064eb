//! Per-language manifest cache on disk
//!
//! Layout under the base directory:
//!
//! ```text
//! {base}/{language}/manifest.json          {"manifest": ..., "timestamp": ms}
//! {base}/{language}/commands/{name}.json   {"file": "...", "content": "...", "timestamp": ms}
//! ```
//!
//! Corrupt, empty or expired entries read as a miss and are never reported
//! as errors. `clear` writes an empty file instead of deleting.

use chrono::Utc;
use cmdhub_foundation::{
    is_valid_language_code, validate_command_name, CacheEntry, CmdhubError, ContentCacheEntry,
    FileSystem, Manifest, Result,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default max age of a cached manifest
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60 * 60);

const MANIFEST_FILE: &str = "manifest.json";
const CONTENT_DIR: &str = "commands";

/// Aggregate numbers for `cmdhub cache stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub languages: usize,
    pub commands: usize,
    pub cached_content_files: usize,
}

pub struct CacheStore {
    base_dir: PathBuf,
    fs: Arc<dyn FileSystem>,
    max_age: Duration,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn max_age_ms(max_age: Duration) -> i64 {
    i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX)
}

impl CacheStore {
    pub fn new(fs: Arc<dyn FileSystem>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            fs,
            max_age: DEFAULT_MAX_AGE,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Directory for one language; the code is checked before it touches a path
    fn language_dir(&self, language: &str) -> Result<PathBuf> {
        if !is_valid_language_code(language) {
            return Err(CmdhubError::InvalidLanguageCode {
                code: language.to_string(),
            });
        }
        Ok(self.base_dir.join(language))
    }

    pub fn manifest_path(&self, language: &str) -> Result<PathBuf> {
        Ok(self.language_dir(language)?.join(MANIFEST_FILE))
    }

    pub fn content_path(&self, language: &str, name: &str) -> Result<PathBuf> {
        validate_command_name(name)?;
        Ok(self
            .language_dir(language)?
            .join(CONTENT_DIR)
            .join(format!("{name}.json")))
    }

    /// Cached manifest, or `None` on miss, corruption or expiry
    pub async fn get(&self, language: &str) -> Result<Option<Manifest>> {
        let path = self.manifest_path(language)?;
        let Some(entry) = self.read_entry::<CacheEntry>(&path).await else {
            return Ok(None);
        };

        if entry.is_expired(now_ms(), max_age_ms(self.max_age)) {
            debug!(language = %language, timestamp = entry.timestamp, "Cached manifest expired");
            return Ok(None);
        }

        debug!(language = %language, commands = entry.manifest.len(), "Manifest cache hit");
        Ok(Some(entry.manifest))
    }

    /// Replace the cached manifest; `timestamp` defaults to now
    pub async fn set(&self, language: &str, manifest: &Manifest, timestamp: Option<i64>) -> Result<()> {
        let path = self.manifest_path(language)?;
        let entry = CacheEntry {
            manifest: manifest.clone(),
            timestamp: timestamp.unwrap_or_else(now_ms),
        };
        self.write_entry(&path, &entry).await?;
        debug!(language = %language, commands = manifest.len(), "Manifest cached");
        Ok(())
    }

    /// Raw entry regardless of age, for callers that want the last snapshot
    pub async fn peek(&self, language: &str) -> Result<Option<CacheEntry>> {
        let path = self.manifest_path(language)?;
        Ok(self.read_entry::<CacheEntry>(&path).await)
    }

    /// Staleness check without handing out the manifest
    ///
    /// A missing or unreadable entry counts as expired.
    pub async fn is_expired(&self, language: &str, max_age: Option<Duration>) -> Result<bool> {
        let path = self.manifest_path(language)?;
        let max_age = max_age.unwrap_or(self.max_age);
        Ok(match self.read_entry::<CacheEntry>(&path).await {
            Some(entry) => entry.is_expired(now_ms(), max_age_ms(max_age)),
            None => true,
        })
    }

    /// Logical delete; a language with nothing cached is fine
    pub async fn clear(&self, language: &str) -> Result<()> {
        let path = self.manifest_path(language)?;
        if !self.fs.exists(&path).await {
            return Ok(());
        }
        self.fs.write_file(&path, "").await?;
        debug!(language = %language, "Manifest cache cleared");
        Ok(())
    }

    /// Cached body of `name`, valid only while the manifest still points at `file`
    pub async fn get_content(&self, language: &str, name: &str, file: &str) -> Result<Option<String>> {
        let path = self.content_path(language, name)?;
        let Some(entry) = self.read_entry::<ContentCacheEntry>(&path).await else {
            return Ok(None);
        };
        if entry.file != file {
            debug!(command = %name, cached = %entry.file, current = %file, "Command file moved, cached content is stale");
            return Ok(None);
        }
        if entry.is_expired(now_ms(), max_age_ms(self.max_age)) {
            return Ok(None);
        }
        Ok(Some(entry.content))
    }

    pub async fn set_content(&self, language: &str, name: &str, file: &str, content: &str) -> Result<()> {
        let path = self.content_path(language, name)?;
        let entry = ContentCacheEntry {
            file: file.to_string(),
            content: content.to_string(),
            timestamp: now_ms(),
        };
        self.write_entry(&path, &entry).await
    }

    /// Every language with a readable manifest entry, expired or not, sorted by code
    pub async fn cached_languages(&self) -> Vec<(String, Manifest)> {
        let entries = match self.fs.list_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %self.base_dir.display(), error = %e, "Cache directory not readable");
                return Vec::new();
            }
        };

        let mut languages = Vec::new();
        for entry in entries.into_iter().filter(|e| e.is_dir) {
            let Some(code) = entry.path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !is_valid_language_code(code) {
                continue;
            }
            let path = entry.path.join(MANIFEST_FILE);
            if let Some(cached) = self.read_entry::<CacheEntry>(&path).await {
                languages.push((code.to_string(), cached.manifest));
            }
        }
        languages.sort_by(|a, b| a.0.cmp(&b.0));
        languages
    }

    pub async fn stats(&self) -> CacheStats {
        let languages = self.cached_languages().await;
        let mut stats = CacheStats {
            languages: languages.len(),
            ..Default::default()
        };

        for (code, manifest) in &languages {
            stats.commands += manifest.len();
            let content_dir = self.base_dir.join(code).join(CONTENT_DIR);
            if let Ok(files) = self.fs.list_dir(&content_dir).await {
                stats.cached_content_files += files.iter().filter(|f| !f.is_dir).count();
            }
        }
        stats
    }

    async fn read_entry<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let content = match self.fs.read_file(path).await {
            Ok(content) => content,
            Err(e) if e.is_not_found() => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache entry unreadable, treating as miss");
                return None;
            }
        };

        if content.trim().is_empty() {
            return None;
        }

        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt cache entry, treating as miss");
                None
            }
        }
    }

    async fn write_entry<T: Serialize>(&self, path: &Path, entry: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.fs.mkdir(parent, true).await?;
        }
        let json = serde_json::to_string_pretty(entry)?;
        self.fs.write_file(path, &json).await?;
        Ok(())
    }
}

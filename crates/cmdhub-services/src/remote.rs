//! Remote command repository with transparent caching

use crate::cache::CacheStore;
use crate::repository::{CommandRepository, FetchOptions};
use async_trait::async_trait;
use cmdhub_foundation::language::language_display_name;
use cmdhub_foundation::{
    is_valid_language_code, validate_command_file, CmdhubError, HttpClient, LanguageInfo,
    Manifest, Result,
};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Fetches `{base}/{language}/index.json` and the files it lists
///
/// Fetches for one language are serialized: a caller that waited on another
/// caller's fetch re-reads the cache before going to the network, so a cache
/// miss costs one request per process no matter how many callers race on it.
pub struct RemoteRepository {
    base_url: String,
    http: Arc<dyn HttpClient>,
    cache: Arc<CacheStore>,
    fetch_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RemoteRepository {
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpClient>, cache: Arc<CacheStore>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http,
            cache,
            fetch_locks: DashMap::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn manifest_url(&self, language: &str) -> String {
        format!("{}/{}/index.json", self.base_url, language)
    }

    pub fn content_url(&self, language: &str, file: &str) -> String {
        format!("{}/{}/{}", self.base_url, language, file.trim_start_matches("./"))
    }

    /// One entry per cached manifest; never touches the network
    pub async fn get_available_languages(&self) -> Vec<LanguageInfo> {
        self.cache
            .cached_languages()
            .await
            .into_iter()
            .map(|(code, manifest)| LanguageInfo {
                name: language_display_name(&code),
                command_count: manifest.len(),
                code,
            })
            .collect()
    }

    fn fetch_lock(&self, language: &str) -> Arc<Mutex<()>> {
        self.fetch_locks
            .entry(language.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn fetch_manifest(&self, language: &str) -> Result<Manifest> {
        let url = self.manifest_url(language);
        info!(language = %language, url = %url, "Fetching manifest");

        let response = self
            .http
            .get(&url)
            .await
            .map_err(|e| CmdhubError::manifest(language, e))?;

        let manifest: Manifest = serde_json::from_str(&response.body).map_err(|e| {
            CmdhubError::manifest(language, format!("invalid manifest from {url}: {e}"))
        })?;
        check_manifest(language, &manifest)?;

        debug!(language = %language, commands = manifest.len(), version = %manifest.version, "Manifest fetched");
        Ok(manifest)
    }
}

/// Names must be unique and every declared file must stay under its language root
fn check_manifest(language: &str, manifest: &Manifest) -> Result<()> {
    let mut names = HashSet::new();
    for command in &manifest.commands {
        if !names.insert(command.name.as_str()) {
            return Err(CmdhubError::manifest(
                language,
                format!("duplicate command '{}'", command.name),
            ));
        }
        validate_command_file(&command.name, &command.file)
            .map_err(|e| CmdhubError::manifest(language, e))?;
    }
    Ok(())
}

#[async_trait]
impl CommandRepository for RemoteRepository {
    async fn get_manifest(&self, language: &str, options: FetchOptions) -> Result<Manifest> {
        if !is_valid_language_code(language) {
            return Err(CmdhubError::InvalidLanguageCode {
                code: language.to_string(),
            });
        }

        if !options.force_refresh {
            if let Some(manifest) = self.cache.get(language).await? {
                return Ok(manifest);
            }
        }

        let lock = self.fetch_lock(language);
        let _guard = lock.lock().await;

        if !options.force_refresh {
            if let Some(manifest) = self.cache.get(language).await? {
                debug!(language = %language, "Manifest cached by a concurrent fetch");
                return Ok(manifest);
            }
        }

        let manifest = self.fetch_manifest(language).await?;
        if let Err(e) = self.cache.set(language, &manifest, None).await {
            warn!(language = %language, error = %e, "Failed to cache manifest");
        }
        Ok(manifest)
    }

    async fn get_command(&self, name: &str, language: &str, options: FetchOptions) -> Result<String> {
        let manifest = self.get_manifest(language, options).await?;
        let command = manifest
            .find(name)
            .ok_or_else(|| CmdhubError::command_not_found(name, language))?;
        validate_command_file(name, &command.file)?;

        if !options.force_refresh {
            match self.cache.get_content(language, name, &command.file).await {
                Ok(Some(content)) => {
                    debug!(command = %name, language = %language, "Command content cache hit");
                    return Ok(content);
                }
                Ok(None) => {}
                Err(e) => debug!(command = %name, error = %e, "Command content not cacheable"),
            }
        }

        let url = self.content_url(language, &command.file);
        debug!(command = %name, url = %url, "Fetching command content");
        let response = self
            .http
            .get(&url)
            .await
            .map_err(|e| CmdhubError::command_content(name, &command.file, e))?;

        if let Err(e) = self
            .cache
            .set_content(language, name, &command.file, &response.body)
            .await
        {
            warn!(command = %name, language = %language, error = %e, "Failed to cache command content");
        }
        Ok(response.body)
    }
}

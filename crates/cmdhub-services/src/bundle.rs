//! Composition root: builds every service once and hands out shared handles

use crate::cache::CacheStore;
use crate::fs::LocalFileSystem;
use crate::http::ReqwestHttpClient;
use crate::local::LocalRepository;
use crate::remote::RemoteRepository;
use cmdhub_config::{AppSettings, ConfigResolver, ConfigStore, EnvSnapshot, ResolvedConfig};
use cmdhub_foundation::{CmdhubError, FileSystem, FsError, HttpClient, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Host locations the services are rooted at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub home: PathBuf,
    pub cwd: PathBuf,
}

impl HostPaths {
    pub fn detect() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CmdhubError::invalid_config("cannot determine home directory"))?;
        let cwd = std::env::current_dir().map_err(|e| FsError::from_io(&PathBuf::from("."), e))?;
        Ok(Self { home, cwd })
    }
}

/// Bundle of services used by the CLI
pub struct ServicesBundle {
    pub settings: AppSettings,
    pub paths: HostPaths,
    pub fs: Arc<dyn FileSystem>,
    pub config: ConfigResolver,
    /// Language and merged config document at construction time
    pub resolved: ResolvedConfig,
    pub cache: Arc<CacheStore>,
    pub remote: Arc<RemoteRepository>,
    pub local: Arc<LocalRepository>,
}

/// Create the services bundle from injected capabilities
///
/// A `repositoryURL` in the merged user/project config replaces
/// `settings.repository.base_url`.
pub async fn create_services_bundle(
    settings: AppSettings,
    paths: HostPaths,
    env: EnvSnapshot,
    fs: Arc<dyn FileSystem>,
    http: Arc<dyn HttpClient>,
    cli_language: Option<&str>,
) -> ServicesBundle {
    let config = ConfigResolver::new(
        ConfigStore::user(fs.clone(), &paths.home),
        ConfigStore::project(fs.clone(), &paths.cwd),
        env,
    );
    let resolved = config.resolve(cli_language).await;

    let base_url = resolved
        .repository_url()
        .unwrap_or(&settings.repository.base_url)
        .to_string();

    let cache = Arc::new(
        CacheStore::new(fs.clone(), settings.cache_dir(&paths.home))
            .with_max_age(Duration::from_secs(settings.cache.ttl_seconds)),
    );
    let remote = Arc::new(RemoteRepository::new(base_url, http, cache.clone()));
    let local = Arc::new(LocalRepository::new(
        fs.clone(),
        settings.personal_root(&paths.home),
        settings.project_root(&paths.cwd),
        settings.local.max_depth,
    ));

    debug!(
        language = %resolved.language,
        repository = %remote.base_url(),
        cache_dir = %cache.base_dir().display(),
        "Services created"
    );

    ServicesBundle {
        settings,
        paths,
        fs,
        config,
        resolved,
        cache,
        remote,
        local,
    }
}

/// Create the services bundle backed by the real disk, network and process environment
pub async fn create_default_bundle(
    settings: AppSettings,
    cli_language: Option<&str>,
) -> Result<ServicesBundle> {
    let paths = HostPaths::detect()?;
    let http = ReqwestHttpClient::new(
        Duration::from_millis(settings.repository.timeout_ms),
        settings.repository.max_response_bytes,
    )
    .map_err(|e| CmdhubError::invalid_config(format!("cannot build HTTP client: {e}")))?;

    Ok(create_services_bundle(
        settings,
        paths,
        EnvSnapshot::from_process(),
        Arc::new(LocalFileSystem::new()),
        Arc::new(http),
        cli_language,
    )
    .await)
}

//! Remote repository against a real on-disk cache

use async_trait::async_trait;
use cmdhub_foundation::{CmdhubError, ErrorKind, HttpClient, HttpError, HttpResponse};
use cmdhub_services::{CacheStore, CommandRepository, FetchOptions, LocalFileSystem, RemoteRepository};
use cmdhub_test_support::{command, manifest, manifest_json, mock_http_client};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const BASE: &str = "https://cmds.example.com/commands";

fn disk_cache(dir: &TempDir) -> Arc<CacheStore> {
    Arc::new(CacheStore::new(Arc::new(LocalFileSystem::new()), dir.path().join("cache")))
}

/// Serves one manifest slowly and counts requests
struct SlowServer {
    body: String,
    requests: AtomicUsize,
}

#[async_trait]
impl HttpClient for SlowServer {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(HttpResponse::ok(url, self.body.clone()))
    }
}

#[tokio::test]
async fn test_manifest_is_cached_on_disk() {
    let dir = TempDir::new().unwrap();
    let cache = disk_cache(&dir);
    let body = manifest_json(vec![command("review", "Review code")]);

    let mut http = mock_http_client();
    http.expect_get()
        .times(1)
        .returning(move |url| Ok(HttpResponse::ok(url, body.clone())));
    let repo = RemoteRepository::new(BASE, Arc::new(http), cache);

    let first = repo.get_manifest("en", FetchOptions::default()).await.unwrap();
    let second = repo.get_manifest("en", FetchOptions::default()).await.unwrap();
    assert_eq!(first, second);

    let on_disk = std::fs::read_to_string(dir.path().join("cache/en/manifest.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
    assert!(value["timestamp"].as_i64().unwrap() > 0);
    assert_eq!(value["manifest"]["commands"][0]["name"], "review");
}

#[tokio::test]
async fn test_force_refresh_bypasses_cache() {
    let dir = TempDir::new().unwrap();
    let cache = disk_cache(&dir);
    cache
        .set("en", &manifest(vec![command("old", "Old")]), None)
        .await
        .unwrap();

    let body = manifest_json(vec![command("new", "New")]);
    let mut http = mock_http_client();
    http.expect_get()
        .times(1)
        .returning(move |url| Ok(HttpResponse::ok(url, body.clone())));
    let repo = RemoteRepository::new(BASE, Arc::new(http), cache.clone());

    let refreshed = repo.get_manifest("en", FetchOptions::refresh()).await.unwrap();
    assert_eq!(refreshed.commands[0].name, "new");
    assert_eq!(cache.get("en").await.unwrap(), Some(refreshed));
}

#[tokio::test]
async fn test_corrupt_cache_triggers_fetch() {
    let dir = TempDir::new().unwrap();
    let cache_dir = dir.path().join("cache/en");
    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(cache_dir.join("manifest.json"), "{\"manifest\": [truncated").unwrap();

    let body = manifest_json(vec![command("review", "Review code")]);
    let mut http = mock_http_client();
    http.expect_get()
        .times(1)
        .returning(move |url| Ok(HttpResponse::ok(url, body.clone())));
    let repo = RemoteRepository::new(BASE, Arc::new(http), disk_cache(&dir));

    let fetched = repo.get_manifest("en", FetchOptions::default()).await.unwrap();
    assert_eq!(fetched.len(), 1);
}

#[tokio::test]
async fn test_unknown_command_never_fetches_content() {
    let dir = TempDir::new().unwrap();
    let cache = disk_cache(&dir);
    cache
        .set("en", &manifest(vec![command("review", "Review code")]), None)
        .await
        .unwrap();

    let mut http = mock_http_client();
    http.expect_get().times(0);
    let repo = RemoteRepository::new(BASE, Arc::new(http), cache);

    let err = repo
        .get_command("deploy", "en", FetchOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(
        err,
        CmdhubError::CommandNotFound { ref name, ref scope } if name == "deploy" && scope == "en"
    ));
}

#[tokio::test]
async fn test_command_content_fetched_then_cached() {
    let dir = TempDir::new().unwrap();
    let cache = disk_cache(&dir);
    cache
        .set("en", &manifest(vec![command("review", "Review code")]), None)
        .await
        .unwrap();

    let mut http = mock_http_client();
    http.expect_get()
        .withf(|url| url.ends_with("/en/review.md"))
        .times(1)
        .returning(|url| Ok(HttpResponse::ok(url, "---\ndescription: Review\n---\nbody")));
    let repo = RemoteRepository::new(BASE, Arc::new(http), cache);

    let first = repo
        .get_command("review", "en", FetchOptions::default())
        .await
        .unwrap();
    let second = repo
        .get_command("review", "en", FetchOptions::default())
        .await
        .unwrap();
    assert_eq!(first, second);
    assert!(dir.path().join("cache/en/commands/review.json").exists());
}

#[tokio::test]
async fn test_moved_command_file_invalidates_cached_content() {
    let dir = TempDir::new().unwrap();
    let cache = disk_cache(&dir);
    cache
        .set("en", &manifest(vec![command("review", "Review code")]), None)
        .await
        .unwrap();
    cache
        .set_content("en", "review", "review.md", "OLD CONTENT")
        .await
        .unwrap();

    let mut moved = command("review", "Review code");
    moved.file = "review-v2.md".to_string();
    let body = manifest_json(vec![moved]);

    let mut http = mock_http_client();
    http.expect_get()
        .withf(|url| url.ends_with("/en/index.json"))
        .times(1)
        .returning(move |url| Ok(HttpResponse::ok(url, body.clone())));
    http.expect_get()
        .withf(|url| url.ends_with("/en/review-v2.md"))
        .times(1)
        .returning(|url| Ok(HttpResponse::ok(url, "NEW CONTENT")));
    let repo = RemoteRepository::new(BASE, Arc::new(http), cache);

    repo.get_manifest("en", FetchOptions::refresh()).await.unwrap();
    let content = repo
        .get_command("review", "en", FetchOptions::default())
        .await
        .unwrap();
    assert_eq!(content, "NEW CONTENT");
}

#[tokio::test]
async fn test_content_failure_is_distinct_from_not_found() {
    let dir = TempDir::new().unwrap();
    let cache = disk_cache(&dir);
    cache
        .set("en", &manifest(vec![command("review", "Review code")]), None)
        .await
        .unwrap();

    let mut http = mock_http_client();
    http.expect_get().times(1).returning(|url| {
        Err(HttpError::Timeout {
            url: url.to_string(),
        })
    });
    let repo = RemoteRepository::new(BASE, Arc::new(http), cache);

    let err = repo
        .get_command("review", "en", FetchOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(matches!(err, CmdhubError::CommandContent { ref path, .. } if path == "review.md"));
}

#[tokio::test]
async fn test_concurrent_misses_fetch_once() {
    let dir = TempDir::new().unwrap();
    let server = Arc::new(SlowServer {
        body: manifest_json(vec![command("review", "Review code")]),
        requests: AtomicUsize::new(0),
    });
    let repo = RemoteRepository::new(BASE, server.clone(), disk_cache(&dir));

    let (a, b, c) = futures::join!(
        repo.get_manifest("en", FetchOptions::default()),
        repo.get_manifest("en", FetchOptions::default()),
        repo.get_manifest("en", FetchOptions::default()),
    );
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(c.unwrap().len(), 1);
    assert_eq!(server.requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_other_languages_are_not_serialized_together() {
    let dir = TempDir::new().unwrap();
    let server = Arc::new(SlowServer {
        body: manifest_json(vec![command("review", "Review code")]),
        requests: AtomicUsize::new(0),
    });
    let repo = RemoteRepository::new(BASE, server.clone(), disk_cache(&dir));

    let (en, ja) = futures::join!(
        repo.get_manifest("en", FetchOptions::default()),
        repo.get_manifest("ja", FetchOptions::default()),
    );
    en.unwrap();
    ja.unwrap();
    assert_eq!(server.requests.load(Ordering::SeqCst), 2);

    let languages = repo.get_available_languages().await;
    let codes: Vec<_> = languages.iter().map(|l| l.code.as_str()).collect();
    assert_eq!(codes, vec!["en", "ja"]);
}

//! Subcommand implementations

use super::output;
use super::{CacheAction, Commands, ConfigAction};
use anyhow::Result;
use cmdhub_config::ConfigStore;
use cmdhub_foundation::compare_manifests;
use cmdhub_services::{CommandRepository, FetchOptions, ServicesBundle};
use tracing::info;

pub async fn dispatch(command: Commands, services: &ServicesBundle, json: bool) -> Result<()> {
    let language = services.resolved.language.as_str();

    match command {
        Commands::Manifest { refresh, local } => {
            let manifest = if local {
                let report = services.local.scan().await;
                output::print_scan_warnings(&report.warnings);
                report.manifest
            } else {
                services
                    .remote
                    .get_manifest(language, FetchOptions { force_refresh: refresh })
                    .await?
            };
            output::print_manifest(&manifest, json)
        }
        Commands::Show {
            name,
            refresh,
            local,
        } => {
            let repository: &dyn CommandRepository = if local {
                services.local.as_ref()
            } else {
                services.remote.as_ref()
            };
            let content = repository
                .get_command(&name, language, FetchOptions { force_refresh: refresh })
                .await?;
            print!("{content}");
            Ok(())
        }
        Commands::Languages => {
            let languages = services.remote.get_available_languages().await;
            output::print_languages(&languages, json)
        }
        Commands::Diff => {
            let previous = services.cache.peek(language).await?.map(|entry| entry.manifest);
            let current = services
                .remote
                .get_manifest(language, FetchOptions::refresh())
                .await?;
            let result = compare_manifests(previous.as_ref(), &current);
            output::print_comparison(&result, json)
        }
        Commands::Scan => {
            let report = services.local.scan().await;
            output::print_scan_warnings(&report.warnings);
            output::print_manifest(&report.manifest, json)
        }
        Commands::Cache { action } => handle_cache(action, services, json).await,
        Commands::Config { action } => handle_config(action, services, json).await,
    }
}

async fn handle_cache(action: CacheAction, services: &ServicesBundle, json: bool) -> Result<()> {
    match action {
        CacheAction::Stats => {
            let stats = services.cache.stats().await;
            output::print_cache_stats(&stats, services.cache.base_dir(), json)
        }
        CacheAction::Clear { all } => {
            let languages = if all {
                services
                    .cache
                    .cached_languages()
                    .await
                    .into_iter()
                    .map(|(code, _)| code)
                    .collect()
            } else {
                vec![services.resolved.language.clone()]
            };

            for code in &languages {
                services.cache.clear(code).await?;
                info!(language = %code, "Cache cleared");
            }
            println!("Cleared {} language(s)", languages.len());
            Ok(())
        }
    }
}

async fn handle_config(action: ConfigAction, services: &ServicesBundle, json: bool) -> Result<()> {
    match action {
        ConfigAction::Show => output::print_config(services, json),
        ConfigAction::SetLanguage { code, project } => {
            let store = target_store(services, project);
            let mut document = store.load_for_update().await?;
            document.set_preferred_language(code.trim().to_lowercase());
            store.set_config(&document).await?;
            println!("Updated {}", store.path().display());
            Ok(())
        }
        ConfigAction::SetUrl { url, project } => {
            let store = target_store(services, project);
            let mut document = store.load_for_update().await?;
            document.set_repository_url(url);
            store.set_config(&document).await?;
            println!("Updated {}", store.path().display());
            Ok(())
        }
    }
}

fn target_store(services: &ServicesBundle, project: bool) -> &ConfigStore {
    if project {
        services.config.project_store()
    } else {
        services.config.user_store()
    }
}

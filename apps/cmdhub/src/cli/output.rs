//! Plain-text and JSON rendering

use anyhow::Result;
use cmdhub_foundation::{ChangeKind, Command, ComparisonResult, LanguageInfo, Manifest};
use cmdhub_services::{CacheStats, ScanWarning, ServicesBundle};
use serde::Serialize;
use std::path::Path;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn qualified_name(command: &Command) -> String {
    match &command.namespace {
        Some(namespace) => format!("{namespace}:{}", command.name),
        None => command.name.clone(),
    }
}

pub fn print_manifest(manifest: &Manifest, json: bool) -> Result<()> {
    if json {
        return print_json(manifest);
    }

    println!(
        "{} command(s), version {}, updated {}",
        manifest.len(),
        manifest.version,
        manifest.updated
    );
    let width = manifest
        .commands
        .iter()
        .map(|c| qualified_name(c).len())
        .max()
        .unwrap_or(0);
    for command in &manifest.commands {
        println!("  {:width$}  {}", qualified_name(command), command.description);
    }
    Ok(())
}

pub fn print_languages(languages: &[LanguageInfo], json: bool) -> Result<()> {
    if json {
        return print_json(languages);
    }
    if languages.is_empty() {
        println!("No cached languages");
    }
    for language in languages {
        println!(
            "  {}  {:<12} {} command(s)",
            language.code, language.name, language.command_count
        );
    }
    Ok(())
}

pub fn print_comparison(result: &ComparisonResult, json: bool) -> Result<()> {
    if json {
        return print_json(result);
    }

    let summary = &result.summary;
    if !summary.has_changes {
        println!("No changes ({} command(s))", summary.total);
        return Ok(());
    }

    println!(
        "{} added, {} removed, {} modified ({} total)",
        summary.added, summary.removed, summary.modified, summary.total
    );
    for change in &result.changes {
        let marker = match change.kind {
            ChangeKind::Added => '+',
            ChangeKind::Removed => '-',
            ChangeKind::Modified => '~',
        };
        if change.changed_fields.is_empty() {
            println!("  {marker} {}", change.name);
        } else {
            println!("  {marker} {} ({})", change.name, change.changed_fields.join(", "));
        }
    }
    Ok(())
}

/// Warnings go to stderr so stdout stays parseable
pub fn print_scan_warnings(warnings: &[ScanWarning]) {
    for warning in warnings {
        eprintln!("warning: {}: {}", warning.path.display(), warning.reason);
    }
}

pub fn print_cache_stats(stats: &CacheStats, dir: &Path, json: bool) -> Result<()> {
    if json {
        return print_json(stats);
    }
    println!("Cache directory: {}", dir.display());
    println!("  languages:      {}", stats.languages);
    println!("  commands:       {}", stats.commands);
    println!("  cached files:   {}", stats.cached_content_files);
    Ok(())
}

pub fn print_config(services: &ServicesBundle, json: bool) -> Result<()> {
    if json {
        return print_json(&serde_json::json!({
            "language": services.resolved.language,
            "repositoryUrl": services.remote.base_url(),
            "document": services.resolved.document,
            "userConfig": services.config.user_store().path(),
            "projectConfig": services.config.project_store().path(),
        }));
    }

    println!("language:       {}", services.resolved.language);
    println!("repository:     {}", services.remote.base_url());
    println!("user config:    {}", services.config.user_store().path().display());
    println!("project config: {}", services.config.project_store().path().display());
    if !services.resolved.document.as_map().is_empty() {
        println!("{}", serde_json::to_string_pretty(&services.resolved.document)?);
    }
    Ok(())
}

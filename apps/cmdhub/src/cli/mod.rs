//! CLI command handling for cmdhub

mod handlers;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cmdhub_config::logging::{initialize, operation_span};
use cmdhub_config::AppSettings;
use cmdhub_foundation::{CmdhubError, ErrorKind};
use cmdhub_services::create_default_bundle;
use tracing::Instrument;

/// The main CLI struct.
#[derive(Parser, Debug)]
#[command(name = "cmdhub")]
#[command(about = "Resolve, fetch, cache and compare custom slash command catalogs")]
#[command(version)]
pub struct Cli {
    /// Language override (highest precedence)
    #[arg(long, global = true)]
    pub lang: Option<String>,

    /// Print JSON instead of plain text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the command catalog for the effective language
    Manifest {
        /// Ignore the cache and fetch again
        #[arg(long)]
        refresh: bool,
        /// Use the personal and project command directories instead of the remote repository
        #[arg(long, conflicts_with = "refresh")]
        local: bool,
    },
    /// Print the content of one command file
    Show {
        name: String,
        #[arg(long)]
        refresh: bool,
        #[arg(long, conflicts_with = "refresh")]
        local: bool,
    },
    /// List languages with a cached catalog
    Languages,
    /// Compare the cached catalog with a fresh fetch
    Diff,
    /// Scan local command directories and report skipped files
    Scan,
    /// Inspect or clear the manifest cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Read or update user/project configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    Stats,
    Clear {
        /// Clear every cached language instead of the effective one
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective language and merged configuration
    Show,
    SetLanguage {
        code: String,
        /// Write the project config instead of the user config
        #[arg(long)]
        project: bool,
    },
    SetUrl {
        url: String,
        #[arg(long)]
        project: bool,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Manifest { .. } => "manifest",
            Commands::Show { .. } => "show",
            Commands::Languages => "languages",
            Commands::Diff => "diff",
            Commands::Scan => "scan",
            Commands::Cache { .. } => "cache",
            Commands::Config { .. } => "config",
        }
    }
}

/// Main CLI entry point
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = AppSettings::load().context("failed to load settings")?;
    initialize(&settings.logging);

    let services = create_default_bundle(settings, cli.lang.as_deref()).await?;
    let span = operation_span(cli.command.name(), &services.resolved.language);

    handlers::dispatch(cli.command, &services, cli.json)
        .instrument(span)
        .await
}

/// Process exit code for a failed run
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<CmdhubError>().map(CmdhubError::kind) {
        Some(ErrorKind::NotFound) => 2,
        Some(ErrorKind::Validation) => 3,
        Some(ErrorKind::Transport) => 4,
        Some(ErrorKind::Io) => 5,
        None => 1,
    }
}

//! Configuration for cmdhub
//!
//! Two kinds of configuration live here:
//! - [`ConfigDocument`]s: the user- and project-scoped JSON files that carry
//!   `preferredLanguage` and `repositoryURL`, read and written by [`ConfigStore`]
//!   and merged by [`ConfigResolver`]
//! - [`AppSettings`]: the tool's own runtime settings (cache location, TTL,
//!   HTTP timeout, logging), loaded with figment

pub mod document;
pub mod logging;
pub mod resolver;
pub mod settings;
pub mod store;

pub use document::{merge_documents, ConfigDocument};
pub use resolver::{ConfigResolver, EnvSnapshot, ResolvedConfig};
pub use settings::{AppSettings, ConfigError, LogFormat, LoggingConfig};
pub use store::ConfigStore;

//! Foundation Layer - Core types, capability traits and pure logic for cmdhub
//!
//! This crate provides the building blocks shared by every other cmdhub crate:
//! - Command and manifest data model
//! - Error taxonomy (not-found, transport, validation, I/O)
//! - Injected capability traits for file and HTTP access
//! - Language/locale resolution, command file parsing and manifest diffing
//!
//! Nothing in here performs I/O directly; anything touching disk or network
//! goes through the [`FileSystem`] and [`HttpClient`] traits.

pub mod capabilities;
pub mod diff;
pub mod error;
pub mod language;
pub mod model;
pub mod parser;

// Re-export commonly used types for convenience
pub use capabilities::{DirEntry, FileSystem, HttpClient, HttpResponse};
pub use diff::{compare_manifests, ChangeKind, ComparisonResult, ComparisonSummary, ManifestChange};
pub use error::{CmdhubError, ErrorKind, FsError, HttpError, Result};
pub use language::{detect, is_valid_language_code, parse_locale, sanitize_language_code, DetectionContext};
pub use model::*;
pub use parser::{parse_command, validate_command_file, validate_command_name, ParsedCommand};

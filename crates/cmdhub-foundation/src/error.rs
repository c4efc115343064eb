//! Error types shared by all cmdhub crates

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Broad failure category, used by callers to pick a message or exit code
/// without inspecting individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The named command, file or language does not exist
    NotFound,
    /// The resource exists but could not be fetched or decoded
    Transport,
    /// Local validation rejected the input
    Validation,
    /// Underlying file or network I/O failed
    Io,
}

/// Failures reported by a [`FileSystem`](crate::FileSystem) implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("I/O error at {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl FsError {
    /// Classify a std I/O error for the given path
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => FsError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound { .. })
    }

    pub fn path(&self) -> &Path {
        match self {
            FsError::NotFound { path } | FsError::PermissionDenied { path } => path,
            FsError::Io { path, .. } => path,
        }
    }
}

/// Failures reported by an [`HttpClient`](crate::HttpClient) implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} {status_text} from {url}")]
    Status {
        url: String,
        status: u16,
        status_text: String,
    },

    #[error("Response from {url} too large: {size} bytes (max: {max} bytes)")]
    TooLarge { url: String, size: u64, max: u64 },
}

impl HttpError {
    pub fn url(&self) -> &str {
        match self {
            HttpError::Timeout { url }
            | HttpError::Network { url, .. }
            | HttpError::Status { url, .. }
            | HttpError::TooLarge { url, .. } => url,
        }
    }
}

/// Core error type used throughout cmdhub
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CmdhubError {
    #[error("Command '{name}' not found in {scope} catalog")]
    CommandNotFound { name: String, scope: String },

    #[error("Failed to load manifest for language '{language}': {cause}")]
    Manifest { language: String, cause: String },

    #[error("Command '{name}' is listed but its content at '{path}' could not be fetched: {cause}")]
    CommandContent {
        name: String,
        path: String,
        cause: String,
    },

    #[error("Invalid locale: '{locale}'")]
    InvalidLocale { locale: String },

    #[error("Invalid language code: '{code}'")]
    InvalidLanguageCode { code: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Command '{command}' is missing required header field 'description'")]
    MissingDescription { command: String },

    #[error("Invalid header in command '{command}': {message}")]
    InvalidHeader { command: String, message: String },

    #[error("Security violation in command '{command}': tool '{tool}' is not allowed")]
    SecurityViolation { command: String, tool: String },

    #[error("Path traversal rejected for command '{command}': {path}")]
    PathTraversal { command: String, path: String },

    #[error("Invalid command name (contains path separators or '..'): {name}")]
    InvalidCommandName { name: String },

    #[error(transparent)]
    FileSystem(#[from] FsError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CmdhubError {
    pub fn command_not_found(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::CommandNotFound {
            name: name.into(),
            scope: scope.into(),
        }
    }

    pub fn manifest(language: impl Into<String>, cause: impl ToString) -> Self {
        Self::Manifest {
            language: language.into(),
            cause: cause.to_string(),
        }
    }

    pub fn command_content(
        name: impl Into<String>,
        path: impl Into<String>,
        cause: impl ToString,
    ) -> Self {
        Self::CommandContent {
            name: name.into(),
            path: path.into(),
            cause: cause.to_string(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CmdhubError::CommandNotFound { .. } => ErrorKind::NotFound,
            CmdhubError::Manifest { .. } | CmdhubError::CommandContent { .. } => {
                ErrorKind::Transport
            }
            CmdhubError::InvalidLocale { .. }
            | CmdhubError::InvalidLanguageCode { .. }
            | CmdhubError::InvalidConfig { .. }
            | CmdhubError::MissingDescription { .. }
            | CmdhubError::InvalidHeader { .. }
            | CmdhubError::SecurityViolation { .. }
            | CmdhubError::PathTraversal { .. }
            | CmdhubError::InvalidCommandName { .. } => ErrorKind::Validation,
            CmdhubError::FileSystem(FsError::NotFound { .. }) => ErrorKind::NotFound,
            CmdhubError::FileSystem(_) | CmdhubError::Http(_) | CmdhubError::Json(_) => {
                ErrorKind::Io
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CmdhubError>;

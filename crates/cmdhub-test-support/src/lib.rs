//! Shared test helpers for cmdhub crates

pub mod fixtures;
pub mod memory_fs;
pub mod mocks;

pub use fixtures::{command, command_file, manifest, manifest_json};
pub use memory_fs::MemoryFileSystem;
pub use mocks::{mock_file_system, mock_http_client, MockFileSystem, MockHttpClient};

//! Services for resolving, fetching and caching command manifests

pub mod bundle;
pub mod cache;
pub mod fs;
pub mod http;
pub mod local;
pub mod remote;
pub mod repository;

pub use bundle::{create_default_bundle, create_services_bundle, HostPaths, ServicesBundle};
pub use cache::{CacheStats, CacheStore, DEFAULT_MAX_AGE};
pub use fs::LocalFileSystem;
pub use http::ReqwestHttpClient;
pub use local::{LocalRepository, ScanReport, ScanWarning, ScanWarningKind};
pub use remote::RemoteRepository;
pub use repository::{CommandRepository, FetchOptions};

//! In-memory [`FileSystem`] for tests that need real read-after-write behaviour

use async_trait::async_trait;
use cmdhub_foundation::{DirEntry, FileSystem, FsError};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    denied: BTreeSet<PathBuf>,
    writes: usize,
}

/// Thread-safe map of path -> content
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    state: Mutex<State>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        let path = path.into();
        let mut state = self.state.lock().unwrap();
        add_ancestors(&mut state.dirs, &path);
        state.files.insert(path, contents.into());
    }

    /// Make every access to `path` fail with `PermissionDenied`
    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().denied.insert(path.into());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state.lock().unwrap().files.get(path.as_ref()).cloned()
    }

    /// Number of successful `write_file` calls
    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    fn check_access(state: &State, path: &Path) -> Result<(), FsError> {
        if state.denied.iter().any(|d| path.starts_with(d)) {
            return Err(FsError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}

fn add_ancestors(dirs: &mut BTreeSet<PathBuf>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn read_file(&self, path: &Path) -> Result<String, FsError> {
        let state = self.state.lock().unwrap();
        Self::check_access(&state, path)?;
        state.files.get(path).cloned().ok_or_else(|| FsError::NotFound {
            path: path.to_path_buf(),
        })
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), FsError> {
        let mut state = self.state.lock().unwrap();
        Self::check_access(&state, path)?;
        let parent_exists = path
            .parent()
            .map(|p| p.as_os_str().is_empty() || state.dirs.contains(p))
            .unwrap_or(true);
        if !parent_exists {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }
        state.files.insert(path.to_path_buf(), contents.to_string());
        state.writes += 1;
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    async fn mkdir(&self, path: &Path, recursive: bool) -> Result<(), FsError> {
        let mut state = self.state.lock().unwrap();
        Self::check_access(&state, path)?;
        if !recursive {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !state.dirs.contains(parent) {
                    return Err(FsError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
            }
        } else {
            add_ancestors(&mut state.dirs, path);
        }
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.state.lock().unwrap();
        Self::check_access(&state, path)?;
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FsError::NotFound {
                path: path.to_path_buf(),
            })
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let state = self.state.lock().unwrap();
        Self::check_access(&state, path)?;
        if !state.dirs.contains(path) {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let dirs = state
            .dirs
            .iter()
            .filter(|d| d.parent() == Some(path))
            .map(|d| DirEntry::dir(d.clone()));
        let files = state
            .files
            .keys()
            .filter(|f| f.parent() == Some(path))
            .map(|f| DirEntry::file(f.clone()));
        Ok(dirs.chain(files).collect())
    }
}

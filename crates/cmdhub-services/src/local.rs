//! Commands discovered under the personal and project command directories

use crate::repository::{CommandRepository, FetchOptions};
use async_trait::async_trait;
use chrono::Utc;
use cmdhub_foundation::{
    parse_command, CmdhubError, Command, FileSystem, Manifest, NamespacedFile, Result,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const COMMAND_EXTENSION: &str = "md";
const LOCAL_SCOPE: &str = "local";

/// Version string of every synthesized local manifest
pub const LOCAL_MANIFEST_VERSION: &str = "local";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanWarningKind {
    UnreadableDirectory,
    UnreadableFile,
    ParseFailure,
    DepthLimit,
    /// A command with the same name was already found earlier in the scan
    Shadowed,
}

/// Non-fatal problem encountered while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub kind: ScanWarningKind,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub manifest: Manifest,
    pub warnings: Vec<ScanWarning>,
}

/// Walks both command roots on every call; nothing is memoized
pub struct LocalRepository {
    fs: Arc<dyn FileSystem>,
    personal_root: PathBuf,
    project_root: PathBuf,
    max_depth: usize,
}

impl LocalRepository {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        personal_root: impl Into<PathBuf>,
        project_root: impl Into<PathBuf>,
        max_depth: usize,
    ) -> Self {
        Self {
            fs,
            personal_root: personal_root.into(),
            project_root: project_root.into(),
            max_depth,
        }
    }

    pub fn personal_root(&self) -> &Path {
        &self.personal_root
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Build the local manifest, personal commands first
    pub async fn scan(&self) -> ScanReport {
        let (resolved, warnings) = self.resolve().await;

        for warning in &warnings {
            warn!(path = %warning.path.display(), kind = ?warning.kind, reason = %warning.reason, "Skipped during local scan");
        }
        debug!(commands = resolved.len(), warnings = warnings.len(), "Local scan complete");

        let commands = resolved.into_iter().map(|(command, _)| command).collect();
        ScanReport {
            manifest: Manifest::new(LOCAL_MANIFEST_VERSION, Utc::now().to_rfc3339(), commands),
            warnings,
        }
    }

    /// Parsed commands paired with the file that won for each name
    async fn resolve(&self) -> (Vec<(Command, NamespacedFile)>, Vec<ScanWarning>) {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for root in [&self.personal_root, &self.project_root] {
            for file in self.collect_files(root, &mut warnings).await {
                let Some(command) = self.load_command(&file, &mut warnings).await else {
                    continue;
                };
                if !seen.insert(command.name.clone()) {
                    warnings.push(ScanWarning {
                        path: file.file_path.clone(),
                        kind: ScanWarningKind::Shadowed,
                        reason: format!("command '{}' is already defined", command.name),
                    });
                    continue;
                }
                resolved.push((command, file));
            }
        }
        (resolved, warnings)
    }

    /// All `*.md` files under `root`, sorted by relative path
    ///
    /// Uses an explicit stack; directories deeper than `max_depth` are reported
    /// and not entered.
    pub async fn collect_files(&self, root: &Path, warnings: &mut Vec<ScanWarning>) -> Vec<NamespacedFile> {
        if !self.fs.exists(root).await {
            debug!(root = %root.display(), "Command root does not exist");
            return Vec::new();
        }

        let mut files = Vec::new();
        let mut stack = vec![(root.to_path_buf(), 0usize)];

        while let Some((dir, depth)) = stack.pop() {
            let entries = match self.fs.list_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warnings.push(ScanWarning {
                        path: dir,
                        kind: ScanWarningKind::UnreadableDirectory,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for entry in entries {
                if entry.is_dir {
                    if depth + 1 > self.max_depth {
                        warnings.push(ScanWarning {
                            path: entry.path,
                            kind: ScanWarningKind::DepthLimit,
                            reason: format!("deeper than {} levels", self.max_depth),
                        });
                    } else {
                        stack.push((entry.path, depth + 1));
                    }
                } else if has_command_extension(&entry.path) {
                    if let Some(file) = namespaced_file(root, entry.path, depth) {
                        files.push(file);
                    }
                }
            }
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        files
    }

    async fn load_command(&self, file: &NamespacedFile, warnings: &mut Vec<ScanWarning>) -> Option<Command> {
        let content = match self.fs.read_file(&file.file_path).await {
            Ok(content) => content,
            Err(e) => {
                warnings.push(ScanWarning {
                    path: file.file_path.clone(),
                    kind: ScanWarningKind::UnreadableFile,
                    reason: e.to_string(),
                });
                return None;
            }
        };

        let name = command_name(&file.file_name);
        match parse_command(name, &content) {
            Ok(parsed) => Some(Command {
                name: parsed.name,
                description: parsed.description,
                file: file.relative_path.clone(),
                allowed_tools: parsed.allowed_tools,
                argument_hint: parsed.argument_hint,
                namespace: file.namespace_path.clone(),
            }),
            Err(e) => {
                warnings.push(ScanWarning {
                    path: file.file_path.clone(),
                    kind: ScanWarningKind::ParseFailure,
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

fn has_command_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(COMMAND_EXTENSION)
}

fn command_name(file_name: &str) -> &str {
    file_name
        .strip_suffix(".md")
        .unwrap_or(file_name)
}

fn namespaced_file(root: &Path, file_path: PathBuf, depth: usize) -> Option<NamespacedFile> {
    let relative = file_path.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let (file_name, dirs) = segments.split_last()?;

    Some(NamespacedFile {
        relative_path: segments.join("/"),
        namespace_path: (!dirs.is_empty()).then(|| dirs.join(":")),
        file_name: file_name.clone(),
        depth,
        file_path,
    })
}

#[async_trait]
impl CommandRepository for LocalRepository {
    /// Local files have no per-language variant
    async fn get_manifest(&self, _language: &str, _options: FetchOptions) -> Result<Manifest> {
        Ok(self.scan().await.manifest)
    }

    /// Only files that made it into the manifest are served
    async fn get_command(&self, name: &str, _language: &str, _options: FetchOptions) -> Result<String> {
        let (resolved, _) = self.resolve().await;
        let (_, file) = resolved
            .into_iter()
            .find(|(command, _)| command.name == name)
            .ok_or_else(|| CmdhubError::command_not_found(name, LOCAL_SCOPE))?;
        Ok(self.fs.read_file(&file.file_path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdhub_test_support::{command_file, MemoryFileSystem};
    use pretty_assertions::assert_eq;

    fn repo(fs: MemoryFileSystem) -> (Arc<MemoryFileSystem>, LocalRepository) {
        let fs = Arc::new(fs);
        let repo = LocalRepository::new(fs.clone(), "/home/dev/.claude/commands", "/work/.claude/commands", 8);
        (fs, repo)
    }

    #[test]
    fn test_namespaced_file() {
        let file = namespaced_file(
            Path::new("/r"),
            PathBuf::from("/r/git/flow/start.md"),
            2,
        )
        .unwrap();
        assert_eq!(file.relative_path, "git/flow/start.md");
        assert_eq!(file.namespace_path.as_deref(), Some("git:flow"));
        assert_eq!(file.file_name, "start.md");

        let top = namespaced_file(Path::new("/r"), PathBuf::from("/r/review.md"), 0).unwrap();
        assert_eq!(top.namespace_path, None);
    }

    #[tokio::test]
    async fn test_scan_builds_namespaces_and_skips_non_markdown() {
        let (_, repo) = repo(
            MemoryFileSystem::new()
                .with_file("/work/.claude/commands/review.md", command_file("Review code", "Read, Grep"))
                .with_file("/work/.claude/commands/git/commit.md", command_file("Commit", "Bash(git:*)"))
                .with_file("/work/.claude/commands/notes.txt", "ignored"),
        );

        let report = repo.scan().await;
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.manifest.version, LOCAL_MANIFEST_VERSION);

        let names: Vec<_> = report.manifest.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["commit", "review"]);

        let commit = report.manifest.find("commit").unwrap();
        assert_eq!(commit.namespace.as_deref(), Some("git"));
        assert_eq!(commit.file, "git/commit.md");
        assert_eq!(commit.allowed_tools, vec!["Bash(git:*)"]);
    }

    #[tokio::test]
    async fn test_bad_file_does_not_abort_scan() {
        let (_, repo) = repo(
            MemoryFileSystem::new()
                .with_file("/work/.claude/commands/good.md", command_file("Good", "Read"))
                .with_file("/work/.claude/commands/evil.md", command_file("Evil", "rm -rf /"))
                .with_file("/work/.claude/commands/plain.md", "Just a prompt body"),
        );

        let report = repo.scan().await;
        let names: Vec<_> = report.manifest.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["good", "plain"]);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, ScanWarningKind::ParseFailure);
        assert_eq!(
            report.manifest.find("plain").unwrap().description,
            "Custom slash command: plain"
        );
    }

    #[tokio::test]
    async fn test_personal_root_wins() {
        let (_, repo) = repo(
            MemoryFileSystem::new()
                .with_file("/home/dev/.claude/commands/review.md", command_file("Mine", "Read"))
                .with_file("/work/.claude/commands/review.md", command_file("Theirs", "Read")),
        );

        let report = repo.scan().await;
        assert_eq!(report.manifest.len(), 1);
        assert_eq!(report.manifest.commands[0].description, "Mine");
        assert_eq!(report.warnings[0].kind, ScanWarningKind::Shadowed);

        let content = repo
            .get_command("review", "en", FetchOptions::default())
            .await
            .unwrap();
        assert!(content.contains("Mine"));
    }

    #[tokio::test]
    async fn test_rejected_personal_file_is_never_served() {
        let (_, repo) = repo(
            MemoryFileSystem::new()
                .with_file("/home/dev/.claude/commands/review.md", command_file("Evil", "rm -rf /"))
                .with_file("/work/.claude/commands/review.md", command_file("Project review", "Read")),
        );

        let report = repo.scan().await;
        assert_eq!(report.manifest.find("review").unwrap().description, "Project review");

        let content = repo
            .get_command("review", "en", FetchOptions::default())
            .await
            .unwrap();
        assert!(content.contains("Project review"));
        assert!(!content.contains("rm -rf"));
    }

    #[tokio::test]
    async fn test_unparsable_command_is_not_found() {
        let (_, repo) = repo(
            MemoryFileSystem::new()
                .with_file("/work/.claude/commands/evil.md", command_file("Evil", "rm -rf /")),
        );
        let err = repo
            .get_command("evil", "en", FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CmdhubError::CommandNotFound { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_directory_is_a_warning() {
        let (fs, repo) = repo(
            MemoryFileSystem::new()
                .with_file("/work/.claude/commands/ok.md", command_file("Ok", "Read"))
                .with_file("/work/.claude/commands/secret/hidden.md", command_file("Hidden", "Read")),
        );
        fs.deny("/work/.claude/commands/secret");

        let report = repo.scan().await;
        assert_eq!(report.manifest.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, ScanWarningKind::UnreadableDirectory);
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let fs = Arc::new(
            MemoryFileSystem::new()
                .with_file("/r/a/one.md", command_file("One", "Read"))
                .with_file("/r/a/b/two.md", command_file("Two", "Read")),
        );
        let repo = LocalRepository::new(fs, "/r", "/missing", 1);

        let report = repo.scan().await;
        assert_eq!(report.manifest.len(), 1);
        assert_eq!(report.warnings[0].kind, ScanWarningKind::DepthLimit);
        assert_eq!(report.warnings[0].path, PathBuf::from("/r/a/b"));
    }

    #[tokio::test]
    async fn test_missing_command() {
        let (_, repo) = repo(MemoryFileSystem::new());
        let err = repo
            .get_command("nope", "en", FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CmdhubError::CommandNotFound { ref name, ref scope } if name == "nope" && scope == "local"
        ));
    }
}

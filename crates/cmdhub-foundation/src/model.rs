//! Data structures for command manifests and cache entries

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// One installable command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Unique name within a manifest
    pub name: String,

    pub description: String,

    /// Path of the command file, relative to the repository or scan root
    pub file: String,

    /// Capabilities the command may use, normalized and deduplicated
    #[serde(default, deserialize_with = "deserialize_tools")]
    pub allowed_tools: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_hint: Option<String>,

    /// Colon-separated hierarchy derived from the directory structure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Versioned catalog of commands for one language (remote) or one machine (local)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,

    /// ISO-8601 timestamp of the last catalog update
    pub updated: String,

    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Manifest {
    pub fn new(version: impl Into<String>, updated: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            version: version.into(),
            updated: updated.into(),
            commands,
        }
    }

    /// Look up a command by name
    pub fn find(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// On-disk wrapper for a cached manifest: `{"manifest": ..., "timestamp": ms}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub manifest: Manifest,
    /// Epoch milliseconds at which the manifest was fetched
    pub timestamp: i64,
}

/// On-disk wrapper for cached command file content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCacheEntry {
    /// Manifest-declared path the content was fetched from
    #[serde(default)]
    pub file: String,
    pub content: String,
    pub timestamp: i64,
}

/// Entry age check shared by both cache entry kinds
pub fn is_stale(timestamp: i64, now: i64, max_age_ms: i64) -> bool {
    now.saturating_sub(timestamp) > max_age_ms
}

impl CacheEntry {
    pub fn is_expired(&self, now: i64, max_age_ms: i64) -> bool {
        is_stale(self.timestamp, now, max_age_ms)
    }
}

impl ContentCacheEntry {
    pub fn is_expired(&self, now: i64, max_age_ms: i64) -> bool {
        is_stale(self.timestamp, now, max_age_ms)
    }
}

/// Summary of one cached language, as returned by `get_available_languages`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    pub command_count: usize,
}

/// Transient record produced while walking a command directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacedFile {
    pub file_path: PathBuf,
    /// Path relative to the scan root, always `/`-separated
    pub relative_path: String,
    /// `a:b:c` for a file under `a/b/c/`, `None` at the root
    pub namespace_path: Option<String>,
    pub file_name: String,
    pub depth: usize,
}

/// Raw `allowedTools` value: a comma-separated string or an explicit list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ToolList {
    Joined(String),
    List(Vec<String>),
}

impl ToolList {
    /// Normalize into a deduplicated, order-preserving list without empty entries
    pub fn normalize(&self) -> Vec<String> {
        let raw: Vec<String> = match self {
            ToolList::Joined(s) => split_tool_string(s),
            ToolList::List(items) => items.clone(),
        };

        let mut tools: Vec<String> = Vec::with_capacity(raw.len());
        for item in raw {
            let trimmed = item.trim();
            if !trimmed.is_empty() && !tools.iter().any(|t| t == trimmed) {
                tools.push(trimmed.to_string());
            }
        }
        tools
    }
}

/// Split on commas that are not inside parentheses, so that
/// `Bash(git add:*, git commit:*), Read` yields two entries.
fn split_tool_string(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in s.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    parts.push(current);
    parts
}

fn deserialize_tools<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<ToolList>::deserialize(deserializer)?;
    Ok(raw.map(|t| t.normalize()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tool_string_normalization() {
        let tools = ToolList::Joined("Bash(git:*), Read, , Read".to_string()).normalize();
        assert_eq!(tools, vec!["Bash(git:*)", "Read"]);
    }

    #[test]
    fn test_tool_string_keeps_parenthesized_commas() {
        let tools =
            ToolList::Joined("Bash(git add:*, git commit:*), Grep".to_string()).normalize();
        assert_eq!(tools, vec!["Bash(git add:*, git commit:*)", "Grep"]);
    }

    #[test]
    fn test_command_accepts_string_or_list_tools() {
        let from_string: Command = serde_json::from_str(
            r#"{"name":"a","description":"d","file":"a.md","allowedTools":"Read, Write"}"#,
        )
        .unwrap();
        let from_list: Command = serde_json::from_str(
            r#"{"name":"a","description":"d","file":"a.md","allowedTools":["Read","Write","Read"]}"#,
        )
        .unwrap();
        assert_eq!(from_string, from_list);
        assert_eq!(from_list.allowed_tools, vec!["Read", "Write"]);
    }

    #[test]
    fn test_command_missing_tools_defaults_empty() {
        let cmd: Command =
            serde_json::from_str(r#"{"name":"a","description":"d","file":"a.md"}"#).unwrap();
        assert!(cmd.allowed_tools.is_empty());
        assert!(cmd.namespace.is_none());
    }

    #[test]
    fn test_cache_entry_wire_format() {
        let entry = CacheEntry {
            manifest: Manifest::new("1.0.0", "2025-01-01T00:00:00Z", vec![]),
            timestamp: 42,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["timestamp"], 42);
        assert_eq!(value["manifest"]["version"], "1.0.0");
    }

    #[test]
    fn test_staleness_is_strictly_greater() {
        assert!(!is_stale(1_000, 2_000, 1_000));
        assert!(is_stale(1_000, 2_001, 1_000));
    }
}

//! Structural comparison of two manifest snapshots

use crate::model::{Command, Manifest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// One command-level difference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Command>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Command>,
    /// Fields that differ, only populated for modifications
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    /// Number of commands in the new manifest
    pub total: usize,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub has_changes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub old_manifest: Option<Manifest>,
    pub new_manifest: Manifest,
    pub summary: ComparisonSummary,
    pub changes: Vec<ManifestChange>,
    pub compared_at: DateTime<Utc>,
}

impl ComparisonResult {
    pub fn changes_of(&self, kind: ChangeKind) -> impl Iterator<Item = &ManifestChange> {
        self.changes.iter().filter(move |c| c.kind == kind)
    }
}

/// Compare two manifests by command name
///
/// With no previous manifest every command in `new` counts as added.
pub fn compare_manifests(old: Option<&Manifest>, new: &Manifest) -> ComparisonResult {
    let old_index: HashMap<&str, &Command> = old
        .map(|m| m.commands.iter().map(|c| (c.name.as_str(), c)).collect())
        .unwrap_or_default();
    let new_index: HashMap<&str, &Command> =
        new.commands.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut changes = Vec::new();

    for cmd in &new.commands {
        match old_index.get(cmd.name.as_str()) {
            None => changes.push(ManifestChange {
                kind: ChangeKind::Added,
                name: cmd.name.clone(),
                old: None,
                new: Some(cmd.clone()),
                changed_fields: Vec::new(),
            }),
            Some(previous) => {
                let changed_fields = changed_fields(previous, cmd);
                if !changed_fields.is_empty() {
                    changes.push(ManifestChange {
                        kind: ChangeKind::Modified,
                        name: cmd.name.clone(),
                        old: Some((*previous).clone()),
                        new: Some(cmd.clone()),
                        changed_fields,
                    });
                }
            }
        }
    }

    if let Some(old) = old {
        for cmd in &old.commands {
            if !new_index.contains_key(cmd.name.as_str()) {
                changes.push(ManifestChange {
                    kind: ChangeKind::Removed,
                    name: cmd.name.clone(),
                    old: Some(cmd.clone()),
                    new: None,
                    changed_fields: Vec::new(),
                });
            }
        }
    }

    let count = |kind| changes.iter().filter(|c| c.kind == kind).count();
    let added = count(ChangeKind::Added);
    let removed = count(ChangeKind::Removed);
    let modified = count(ChangeKind::Modified);

    ComparisonResult {
        old_manifest: old.cloned(),
        new_manifest: new.clone(),
        summary: ComparisonSummary {
            total: new.commands.len(),
            added,
            removed,
            modified,
            has_changes: added + removed + modified > 0,
        },
        changes,
        compared_at: Utc::now(),
    }
}

fn changed_fields(old: &Command, new: &Command) -> Vec<String> {
    let mut fields = Vec::new();
    if old.description != new.description {
        fields.push("description".to_string());
    }
    if old.file != new.file {
        fields.push("file".to_string());
    }
    if old.allowed_tools != new.allowed_tools {
        fields.push("allowedTools".to_string());
    }
    if old.argument_hint != new.argument_hint {
        fields.push("argumentHint".to_string());
    }
    if old.namespace != new.namespace {
        fields.push("namespace".to_string());
    }
    fields
}

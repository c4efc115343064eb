//! Sample commands, manifests and command files

use cmdhub_foundation::{Command, Manifest};

/// A command named `name` with a single `Read` capability
pub fn command(name: &str, description: &str) -> Command {
    Command {
        name: name.to_string(),
        description: description.to_string(),
        file: format!("{name}.md"),
        allowed_tools: vec!["Read".to_string()],
        argument_hint: None,
        namespace: None,
    }
}

pub fn manifest(commands: Vec<Command>) -> Manifest {
    Manifest::new("1.0.0", "2025-06-01T12:00:00Z", commands)
}

/// Manifest JSON as served by the remote repository
pub fn manifest_json(commands: Vec<Command>) -> String {
    serde_json::to_string(&manifest(commands)).expect("manifest serializes")
}

/// Command file text with a front matter header
pub fn command_file(description: &str, allowed_tools: &str) -> String {
    format!(
        "---\ndescription: {description}\nallowed-tools: \"{allowed_tools}\"\n---\nDo the thing with $ARGUMENTS\n"
    )
}

//! Command definition file parsing and capability validation
//!
//! A command file is Markdown with optional YAML front matter:
//!
//! ```text
//! ---
//! description: Review the staged diff
//! allowed-tools: Bash(git diff:*), Read
//! argument-hint: [focus area]
//! ---
//! Review the following changes...
//! ```

use crate::error::{CmdhubError, Result};
use crate::model::ToolList;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Core capabilities that may be declared verbatim
pub const CORE_TOOLS: &[&str] = &[
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "Glob",
    "Grep",
    "LS",
    "Bash",
    "WebFetch",
    "WebSearch",
    "Task",
    "TodoWrite",
    "NotebookRead",
    "NotebookEdit",
];

/// `prefix__segment__segment`, e.g. `mcp__github__create_issue`
static NAMESPACED_TOOL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+__[A-Za-z0-9_]+__[A-Za-z0-9_]+$").expect("valid regex")
});

/// `Bash(arg[,arg...])` with a restricted argument alphabet
static SHELL_TOOL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Bash\([A-Za-z0-9\-_:*\s]+(?:,[A-Za-z0-9\-_:*\s]+)*\)$").expect("valid regex")
});

/// Windows drive prefix such as `C:` or `c:\`
static DRIVE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]:").expect("valid regex"));

const HEADER_DELIMITER: &str = "---";

/// Result of parsing one command file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub description: String,
    pub allowed_tools: Vec<String>,
    pub argument_hint: Option<String>,
    /// Markdown after the header block
    pub body: String,
    pub has_header: bool,
}

#[derive(Debug, Default, Deserialize)]
struct CommandHeader {
    description: Option<String>,
    #[serde(rename = "allowed-tools", alias = "allowedTools", alias = "allowed_tools")]
    allowed_tools: Option<ToolList>,
    #[serde(rename = "argument-hint", alias = "argumentHint", alias = "argument_hint")]
    argument_hint: Option<String>,
}

/// Parse a command file's text
///
/// Files without a header (or with an empty one) are accepted with a
/// synthesized description and no capabilities. A non-empty header must
/// carry `description`, and every declared tool must pass [`validate_tools`].
pub fn parse_command(name: &str, content: &str) -> Result<ParsedCommand> {
    let Some((header_text, body)) = split_header(content) else {
        return Ok(headerless(name, content));
    };

    let header: CommandHeader = match serde_yaml::from_str::<serde_yaml::Value>(header_text) {
        Ok(serde_yaml::Value::Null) => return Ok(headerless(name, body)),
        Ok(value @ serde_yaml::Value::Mapping(_)) => {
            serde_yaml::from_value(value).map_err(|e| CmdhubError::InvalidHeader {
                command: name.to_string(),
                message: e.to_string(),
            })?
        }
        Ok(_) => {
            return Err(CmdhubError::InvalidHeader {
                command: name.to_string(),
                message: "header must be a key/value mapping".to_string(),
            })
        }
        Err(e) => {
            return Err(CmdhubError::InvalidHeader {
                command: name.to_string(),
                message: e.to_string(),
            })
        }
    };

    let description = header
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| CmdhubError::MissingDescription {
            command: name.to_string(),
        })?;

    let allowed_tools = header
        .allowed_tools
        .map(|t| t.normalize())
        .unwrap_or_default();
    validate_tools(name, &allowed_tools)?;

    Ok(ParsedCommand {
        name: name.to_string(),
        description,
        allowed_tools,
        argument_hint: header.argument_hint.filter(|h| !h.trim().is_empty()),
        body: body.to_string(),
        has_header: true,
    })
}

fn headerless(name: &str, body: &str) -> ParsedCommand {
    ParsedCommand {
        name: name.to_string(),
        description: format!("Custom slash command: {}", name),
        allowed_tools: Vec::new(),
        argument_hint: None,
        body: body.to_string(),
        has_header: false,
    }
}

/// Split `---\n<header>\n---\n<body>`; `None` when the file has no header
///
/// An opening delimiter without a closing one is a Markdown rule, not a header.
fn split_header(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != HEADER_DELIMITER {
        return None;
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == HEADER_DELIMITER {
            let header = &content[header_start..offset];
            let body = &content[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

/// Check every declared tool against the capability whitelist
pub fn validate_tools(command: &str, tools: &[String]) -> Result<()> {
    for tool in tools {
        if !is_allowed_tool(tool) {
            return Err(CmdhubError::SecurityViolation {
                command: command.to_string(),
                tool: tool.clone(),
            });
        }
    }
    Ok(())
}

pub fn is_allowed_tool(tool: &str) -> bool {
    CORE_TOOLS.contains(&tool) || NAMESPACED_TOOL.is_match(tool) || SHELL_TOOL.is_match(tool)
}

/// Reject a declared command file path that could escape its root
pub fn validate_command_file(command: &str, file: &str) -> Result<()> {
    let escapes = file.is_empty()
        || file.contains("..")
        || file.starts_with('/')
        || file.starts_with('\\')
        || DRIVE_PREFIX.is_match(file);

    if escapes {
        return Err(CmdhubError::PathTraversal {
            command: command.to_string(),
            path: file.to_string(),
        });
    }
    Ok(())
}

/// Reject a command name that cannot be used as a single path component
pub fn validate_command_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains("..") || name.contains('/') || name.contains('\\')
    {
        return Err(CmdhubError::InvalidCommandName {
            name: name.to_string(),
        });
    }
    Ok(())
}

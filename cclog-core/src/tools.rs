//! Tool input formatting
//!
//! Every [`Invocation`](crate::types::Invocation) carries a short description
//! and a human-readable rendering of its input. Both come from a
//! [`ToolRegistry`], built once at start-up and handed to the engine by
//! reference. Tools without a registered formatter fall back to the input's
//! `description` field and pretty-printed JSON.

use crate::doc::{bool_or_false, get_array, get_i64, get_str, str_or_empty};
use serde_json::Value;
use std::collections::HashMap;

/// Formats one tool's input for display.
pub trait ToolFormatter: Send + Sync {
    /// Tool name this formatter handles (e.g. "Bash")
    fn name(&self) -> &str;

    /// One-line summary shown next to the tool name
    fn describe(&self, input: &Value) -> String;

    /// Plain-text rendering of the input
    fn format_input(&self, input: &Value, cwd: &str) -> String;
}

/// Registry of tool formatters keyed by tool name.
pub struct ToolRegistry {
    formatters: HashMap<String, Box<dyn ToolFormatter>>,
}

impl ToolRegistry {
    /// An empty registry; every tool uses the generic formatting.
    pub fn new() -> Self {
        Self {
            formatters: HashMap::new(),
        }
    }

    /// Registry with the built-in formatters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(BashFormatter));
        registry.register(Box::new(ReadFormatter));
        registry.register(Box::new(WriteFormatter));
        registry.register(Box::new(EditFormatter));
        registry.register(Box::new(MultiEditFormatter));
        registry.register(Box::new(TodoWriteFormatter));
        registry.register(Box::new(TaskFormatter));
        registry
    }

    /// Add (or replace) a formatter.
    pub fn register(&mut self, formatter: Box<dyn ToolFormatter>) {
        self.formatters
            .insert(formatter.name().to_string(), formatter);
    }

    pub fn is_registered(&self, tool_name: &str) -> bool {
        self.formatters.contains_key(tool_name)
    }

    pub fn describe(&self, tool_name: &str, input: &Value) -> String {
        match self.formatters.get(tool_name) {
            Some(f) => f.describe(input),
            None => str_or_empty(input, "description").to_string(),
        }
    }

    pub fn format_input(&self, tool_name: &str, input: &Value, cwd: &str) -> String {
        match self.formatters.get(tool_name) {
            Some(f) => f.format_input(input, cwd),
            None => format_generic(input),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn format_generic(input: &Value) -> String {
    if input.is_null() {
        return String::new();
    }
    serde_json::to_string_pretty(input).unwrap_or_else(|_| input.to_string())
}

// ============================================
// Built-in formatters
// ============================================

struct BashFormatter;

impl ToolFormatter for BashFormatter {
    fn name(&self) -> &str {
        "Bash"
    }

    // The command itself is the display; the description would repeat it.
    fn describe(&self, _input: &Value) -> String {
        String::new()
    }

    fn format_input(&self, input: &Value, cwd: &str) -> String {
        let mut out = String::new();
        if let Some(desc) = get_str(input, "description") {
            out.push_str("# ");
            out.push_str(desc);
            out.push('\n');
        }
        if !cwd.is_empty() {
            out.push_str(cwd);
            out.push('\n');
        }
        out.push_str("$ ");
        out.push_str(str_or_empty(input, "command"));
        out
    }
}

struct ReadFormatter;

impl ToolFormatter for ReadFormatter {
    fn name(&self) -> &str {
        "Read"
    }

    fn describe(&self, input: &Value) -> String {
        let mut desc = str_or_empty(input, "file_path").to_string();
        let offset = get_i64(input, "offset").unwrap_or(0);
        let limit = get_i64(input, "limit").unwrap_or(0);

        if offset > 0 && limit > 0 {
            desc.push_str(&format!(" (lines {}-{})", offset, offset + limit - 1));
        } else if offset > 0 {
            desc.push_str(&format!(" (starting at line {})", offset));
        } else if limit > 0 {
            desc.push_str(&format!(" (first {} lines)", limit));
        }
        desc
    }

    fn format_input(&self, input: &Value, _cwd: &str) -> String {
        self.describe(input)
    }
}

struct WriteFormatter;

impl ToolFormatter for WriteFormatter {
    fn name(&self) -> &str {
        "Write"
    }

    fn describe(&self, input: &Value) -> String {
        str_or_empty(input, "file_path").to_string()
    }

    fn format_input(&self, input: &Value, _cwd: &str) -> String {
        let content = str_or_empty(input, "content");
        format!(
            "{} ({} lines)\n{}",
            str_or_empty(input, "file_path"),
            content.lines().count(),
            content
        )
    }
}

/// Old and new text of one replacement, as plain text.
fn push_replacement(out: &mut String, edit: &Value) {
    out.push_str("--- old\n");
    out.push_str(str_or_empty(edit, "old_string"));
    out.push_str("\n+++ new\n");
    out.push_str(str_or_empty(edit, "new_string"));
}

struct EditFormatter;

impl ToolFormatter for EditFormatter {
    fn name(&self) -> &str {
        "Edit"
    }

    fn describe(&self, input: &Value) -> String {
        let mut desc = str_or_empty(input, "file_path").to_string();
        if bool_or_false(input, "replace_all") {
            desc.push_str(" (replace all)");
        }
        desc
    }

    fn format_input(&self, input: &Value, _cwd: &str) -> String {
        let mut out = self.describe(input);
        out.push('\n');
        push_replacement(&mut out, input);
        out
    }
}

struct MultiEditFormatter;

impl ToolFormatter for MultiEditFormatter {
    fn name(&self) -> &str {
        "MultiEdit"
    }

    fn describe(&self, input: &Value) -> String {
        let path = str_or_empty(input, "file_path");
        match get_array(input, "edits") {
            Some(edits) if !edits.is_empty() => format!("{} ({} edits)", path, edits.len()),
            _ => path.to_string(),
        }
    }

    fn format_input(&self, input: &Value, _cwd: &str) -> String {
        let mut out = str_or_empty(input, "file_path").to_string();
        let edits = get_array(input, "edits").map(Vec::as_slice).unwrap_or_default();
        if edits.is_empty() {
            out.push_str("\nNo edits specified");
            return out;
        }
        for (i, edit) in edits.iter().enumerate() {
            out.push_str(&format!("\nEdit #{}", i + 1));
            if bool_or_false(edit, "replace_all") {
                out.push_str(" (replace all)");
            }
            out.push('\n');
            push_replacement(&mut out, edit);
        }
        out
    }
}

struct TodoWriteFormatter;

impl ToolFormatter for TodoWriteFormatter {
    fn name(&self) -> &str {
        "TodoWrite"
    }

    fn describe(&self, input: &Value) -> String {
        let Some(todos) = get_array(input, "todos") else {
            return String::new();
        };
        let done = todos
            .iter()
            .filter(|t| get_str(t, "status") == Some("completed"))
            .count();
        format!("{}/{} completed", done, todos.len())
    }

    fn format_input(&self, input: &Value, _cwd: &str) -> String {
        let Some(todos) = get_array(input, "todos") else {
            return format_generic(input);
        };
        todos
            .iter()
            .map(|todo| {
                let mark = match get_str(todo, "status") {
                    Some("completed") => "[x]",
                    Some("in_progress") => "[~]",
                    _ => "[ ]",
                };
                format!("{} {}", mark, str_or_empty(todo, "content"))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

struct TaskFormatter;

impl ToolFormatter for TaskFormatter {
    fn name(&self) -> &str {
        "Task"
    }

    fn describe(&self, input: &Value) -> String {
        str_or_empty(input, "description").to_string()
    }

    fn format_input(&self, input: &Value, _cwd: &str) -> String {
        let mut out = String::new();
        if let Some(agent) = get_str(input, "subagent_type") {
            out.push_str("agent: ");
            out.push_str(agent);
            out.push('\n');
        }
        out.push_str(str_or_empty(input, "prompt"));
        out
    }
}

//! Local pseudo-commands (`/clear`, `/model`, ...).
//!
//! A command record carries `<command-name>` and `<command-args>` tags; its
//! output arrives in the *next* top-level record inside
//! `<local-command-stdout>`.

use super::arena::Arena;
use crate::types::{CommandInfo, NodeIdx};
use tracing::debug;

pub const COMMAND_NAME_TAG: &str = "command-name";
pub const COMMAND_ARGS_TAG: &str = "command-args";
pub const COMMAND_STDOUT_TAG: &str = "local-command-stdout";

/// Text between `<tag>` and `</tag>`. A missing closing tag runs to the end.
pub fn extract_tag<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = text.find(&open)? + open.len();
    let rest = &text[start..];
    let end = rest.find(&close).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Parse command metadata out of a user message.
pub fn parse_command(text: &str) -> Option<CommandInfo> {
    let name = extract_tag(text, COMMAND_NAME_TAG)?.trim();
    if name.is_empty() {
        return None;
    }
    let args = extract_tag(text, COMMAND_ARGS_TAG).unwrap_or("").trim();
    Some(CommandInfo {
        name: name.to_string(),
        args: args.to_string(),
        output: None,
    })
}

/// Attach command output to the command that produced it.
///
/// Walks adjacent pairs of the root list. When a command node is followed by
/// a node whose text contains the stdout tag, the captured text moves onto
/// the command and the follower's content is cleared.
pub fn link_command_outputs(arena: &mut Arena, roots: &[NodeIdx]) -> usize {
    let open = format!("<{}>", COMMAND_STDOUT_TAG);
    let mut linked = 0;

    for pair in roots.windows(2) {
        let (cmd_idx, next_idx) = (pair[0], pair[1]);
        if arena[cmd_idx].command.is_none() || !arena[next_idx].content.contains(&open) {
            continue;
        }

        let output = extract_tag(&arena[next_idx].content, COMMAND_STDOUT_TAG)
            .unwrap_or("")
            .trim()
            .to_string();
        arena[next_idx].content.clear();
        if let Some(command) = arena[cmd_idx].command.as_mut() {
            debug!(command = %command.name, bytes = output.len(), "Linked command output");
            command.output = Some(output);
            linked += 1;
        }
    }
    linked
}

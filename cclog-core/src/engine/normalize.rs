//! RawEntry → Node conversion.
//!
//! Never fails: a payload that does not have the expected shape leaves the
//! node with empty content and zero token counts.

use super::commands::parse_command;
use super::tokens::estimate_tokens;
use crate::doc::{bool_or_false, get_array, get_str, i64_or_zero, str_or_empty};
use crate::tools::ToolRegistry;
use crate::types::{EntryType, Invocation, Node, RawEntry, TokenUsage};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::trace;

/// Disclaimer Claude Code injects before replaying local command output.
pub const CAVEAT_PREFIX: &str =
    "Caveat: The messages below were generated by the user while running local commands.";

pub fn normalize(entry: &RawEntry, registry: &ToolRegistry) -> Node {
    let mut node = Node {
        uuid: entry.uuid.clone(),
        parent_uuid: entry.parent_uuid.clone().filter(|p| !p.is_empty()),
        entry_type: EntryType::from(entry.entry_type.as_str()),
        timestamp: entry.timestamp.clone(),
        emitted_at: parse_timestamp(&entry.timestamp),
        cwd: entry.cwd.clone(),
        is_sidechain: entry.is_sidechain,
        ..Default::default()
    };

    let message = &entry.message;
    if !message.is_object() {
        trace!(uuid = %entry.uuid, "Record has no message payload");
        return node;
    }

    node.role = str_or_empty(message, "role").to_string();
    match node.entry_type {
        EntryType::User => {
            normalize_user(&mut node, message, entry.tool_use_result.as_ref());
            node.is_caveat = node.content.starts_with(CAVEAT_PREFIX);
            if !node.is_tool_result {
                node.command = parse_command(&node.content);
            }
        }
        EntryType::Assistant => normalize_assistant(&mut node, message, registry),
        EntryType::Other(_) => {}
    }

    node.tokens = token_usage(message, &node.content);
    node
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn normalize_user(node: &mut Node, message: &Value, side_payload: Option<&Value>) {
    let content = match message.get("content") {
        Some(Value::String(s)) => {
            node.content = s.clone();
            return;
        }
        Some(Value::Array(items)) => items,
        _ => return,
    };

    let Some(first) = content.first() else {
        return;
    };

    if get_str(first, "type") == Some("tool_result") {
        node.is_tool_result = true;
        node.tool_result_id = get_str(first, "tool_use_id")
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        node.is_error = bool_or_false(first, "is_error");

        match first.get("content") {
            Some(Value::String(s)) => node.content = s.clone(),
            Some(Value::Array(items)) => {
                node.content = join_text_items(items, "\n");
                node.result_text = first_text_item(items).map(str::to_string);
            }
            _ => {}
        }

        // Task results also carry their text in the side payload.
        if node.result_text.is_none() {
            node.result_text = side_payload
                .and_then(|p| get_array(p, "content"))
                .and_then(|items| first_text_item(items))
                .map(str::to_string);
        }
        return;
    }

    node.content = join_text_items(content, "\n");
}

fn normalize_assistant(node: &mut Node, message: &Value, registry: &ToolRegistry) {
    let items = match message.get("content") {
        Some(Value::String(s)) => {
            node.content = s.clone();
            return;
        }
        Some(Value::Array(items)) => items,
        _ => return,
    };

    node.content = join_text_items(items, "\n");

    for item in items {
        if get_str(item, "type") != Some("tool_use") {
            continue;
        }
        let name = str_or_empty(item, "name");
        let raw_input = item.get("input").cloned().unwrap_or(Value::Null);
        let (description, input) = if raw_input.is_object() {
            (
                registry.describe(name, &raw_input),
                registry.format_input(name, &raw_input, &node.cwd),
            )
        } else {
            (String::new(), String::new())
        };

        node.invocations.push(Invocation {
            id: str_or_empty(item, "id").to_string(),
            name: name.to_string(),
            description,
            input,
            raw_input,
            cwd: node.cwd.clone(),
            ..Default::default()
        });
    }
}

fn text_items(items: &[Value]) -> impl Iterator<Item = &str> {
    items
        .iter()
        .filter(|item| get_str(item, "type") == Some("text"))
        .filter_map(|item| get_str(item, "text"))
}

fn join_text_items(items: &[Value], sep: &str) -> String {
    text_items(items)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn first_text_item(items: &[Value]) -> Option<&str> {
    text_items(items).next()
}

fn token_usage(message: &Value, content: &str) -> TokenUsage {
    let mut tokens = TokenUsage {
        output: estimate_tokens(content),
        ..Default::default()
    };
    if let Some(usage) = message.get("usage").filter(|u| u.is_object()) {
        tokens.input = counter(usage, "input_tokens");
        tokens.cache_read = counter(usage, "cache_read_input_tokens");
        tokens.cache_creation = counter(usage, "cache_creation_input_tokens");
    }
    tokens
}

fn counter(usage: &Value, key: &str) -> u64 {
    i64_or_zero(usage, key).max(0) as u64
}

//! Core domain types for cclog
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **RawEntry** | One line of a Claude Code JSONL log, deserialized but uninterpreted |
//! | **Node** | The engine's display-ready unit; exactly one per retained RawEntry |
//! | **Invocation** | A tool call embedded in an assistant record, later paired with its result |
//! | **Sidechain** | An isolated sub-conversation spawned by a Task invocation |
//! | **Conversation size** | Context tokens sent into a turn (input + cache read + cache creation) |
//!
//! Nodes never point at each other directly. Every relationship (parent,
//! matched result, sidechain entries, children) is a [`NodeIdx`] resolved
//! through the arena owned by [`crate::engine::Conversation`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================
// Raw log records
// ============================================

/// A single line from a Claude Code JSONL log.
///
/// Uses `#[serde(default)]` so that records missing optional fields still
/// deserialize; the message payload stays opaque until normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEntry {
    #[serde(deserialize_with = "null_as_empty")]
    pub uuid: String,
    pub parent_uuid: Option<String>,
    #[serde(deserialize_with = "null_as_false")]
    pub is_sidechain: bool,
    #[serde(rename = "type", deserialize_with = "null_as_empty")]
    pub entry_type: String,
    pub message: serde_json::Value,
    #[serde(deserialize_with = "null_as_empty")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub cwd: String,
    pub tool_use_result: Option<serde_json::Value>,
}

/// Explicit `null` reads as an empty string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================
// Entry type
// ============================================

/// Record discriminant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryType {
    User,
    Assistant,
    Other(String),
}

impl EntryType {
    pub fn as_str(&self) -> &str {
        match self {
            EntryType::User => "user",
            EntryType::Assistant => "assistant",
            EntryType::Other(s) => s,
        }
    }
}

impl From<&str> for EntryType {
    fn from(s: &str) -> Self {
        match s {
            "user" => EntryType::User,
            "assistant" => EntryType::Assistant,
            other => EntryType::Other(other.to_string()),
        }
    }
}

impl From<String> for EntryType {
    fn from(s: String) -> Self {
        EntryType::from(s.as_str())
    }
}

impl From<EntryType> for String {
    fn from(t: EntryType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Arena handle
// ============================================

/// Index of a [`Node`] inside the conversation arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIdx(pub usize);

// ============================================
// Token usage
// ============================================

/// Token accounting for one node.
///
/// `output` is always estimated from the rendered text; the other counters
/// come from the record's `usage` block when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_creation: u64,
    /// Conversation size, filled in by the token aggregator
    pub total: u64,
}

impl TokenUsage {
    /// Context tokens sent into this turn.
    pub fn context_size(&self) -> u64 {
        self.input + self.cache_read + self.cache_creation
    }
}

// ============================================
// Command metadata
// ============================================

/// A `<command-name>` pseudo-command typed by the user (e.g. `/clear`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    pub args: String,
    /// Captured `<local-command-stdout>` from the following record
    pub output: Option<String>,
}

// ============================================
// Invocation
// ============================================

/// A tool call made by the assistant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Invocation {
    /// Tool use id; unique within the main timeline or within sidechains
    pub id: String,
    pub name: String,
    pub description: String,
    /// Human-readable rendering of the input
    pub input: String,
    pub raw_input: serde_json::Value,
    /// Working directory of the record that made the call
    pub cwd: String,
    /// Node carrying this call's output
    pub result: Option<NodeIdx>,
    /// Flattened sidechain conversation (Task invocations only)
    pub task_entries: Vec<NodeIdx>,
    pub is_interrupted: bool,
    pub missing_result: bool,
    pub missing_sidechain: bool,
}

impl Invocation {
    /// True when a renderer should warn that the log looks truncated.
    pub fn has_missing_data(&self) -> bool {
        self.missing_result || self.missing_sidechain
    }

    /// The `prompt` field of the raw input, if any.
    pub fn prompt(&self) -> Option<&str> {
        crate::doc::get_str(&self.raw_input, "prompt")
    }
}

// ============================================
// Node
// ============================================

/// One display-ready conversation node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    pub uuid: String,
    pub parent_uuid: Option<String>,
    pub entry_type: EntryType,
    pub role: String,
    /// Raw timestamp string as written in the log
    pub timestamp: String,
    /// Parsed timestamp, when the raw one is valid RFC 3339
    pub emitted_at: Option<DateTime<Utc>>,
    pub cwd: String,
    /// Plain-text content
    pub content: String,
    pub invocations: Vec<Invocation>,
    pub is_tool_result: bool,
    /// Id of the invocation this tool result answers
    pub tool_result_id: Option<String>,
    /// First text item of a structured tool result (used for Task matching)
    pub result_text: Option<String>,
    pub is_sidechain: bool,
    pub is_error: bool,
    /// Text starts with the local-command caveat disclaimer
    pub is_caveat: bool,
    /// Render depth; 0 until the hierarchy pass reaches the node
    pub depth: u32,
    pub tokens: TokenUsage,
    pub command: Option<CommandInfo>,
    /// Sidechain children in log order (empty on the main timeline)
    pub children: Vec<NodeIdx>,
}

impl Default for EntryType {
    fn default() -> Self {
        EntryType::Other(String::new())
    }
}

impl Node {
    pub fn is_user(&self) -> bool {
        self.entry_type == EntryType::User
    }

    pub fn is_assistant(&self) -> bool {
        self.entry_type == EntryType::Assistant
    }

    /// Wall-clock time for display (`HH:MM:SS`), or the raw string when it
    /// does not parse.
    pub fn display_time(&self) -> String {
        match self.emitted_at {
            Some(ts) => ts.format("%H:%M:%S").to_string(),
            None => self.timestamp.clone(),
        }
    }
}

//! Plain-text outline of a reconstructed conversation.

use cclog_core::{ConversationStats, TreeNode};
use std::fmt::Write;

const PREVIEW_CHARS: usize = 80;

/// One line per node, indented by depth; invocations and their results hang
/// below the node that made them.
pub fn render(roots: &[TreeNode]) -> String {
    let mut out = String::new();
    for node in roots {
        render_node(&mut out, node, None);
    }
    out
}

fn indent(depth: u32) -> String {
    "  ".repeat(depth.saturating_sub(1) as usize)
}

fn preview(text: &str) -> String {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let truncated: String = first_line.chars().take(PREVIEW_CHARS).collect();
    if first_line.chars().count() > PREVIEW_CHARS {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

fn render_node(out: &mut String, node: &TreeNode, marker: Option<&str>) {
    let pad = indent(node.depth);
    let label = if node.role.is_empty() {
        node.entry_type.as_str()
    } else {
        node.role.as_str()
    };
    let marker = marker.unwrap_or("");

    let _ = write!(out, "{}{}[{}] {}", pad, marker, short_time(&node.timestamp), label);
    if let Some(cmd) = &node.command {
        let _ = write!(out, " {} {}", cmd.name, cmd.args);
        let _ = writeln!(out);
        if let Some(output) = &cmd.output {
            let _ = writeln!(out, "{}  > {}", pad, preview(output));
        }
    } else if node.is_caveat {
        let _ = writeln!(out, " (caveat)");
    } else {
        let text = preview(&node.content);
        if text.is_empty() {
            let _ = writeln!(out);
        } else {
            let _ = writeln!(out, ": {}", text);
        }
    }
    if node.tokens.total > 0 {
        let _ = writeln!(out, "{}  tokens: {}", pad, node.tokens.total);
    }

    for inv in &node.invocations {
        let mut flags = Vec::new();
        if inv.is_interrupted {
            flags.push("interrupted");
        }
        if inv.missing_result {
            flags.push("missing result");
        }
        if inv.missing_sidechain {
            flags.push("missing sidechain");
        }

        let _ = write!(out, "{}  -> {}", pad, inv.name);
        if !inv.description.is_empty() {
            let _ = write!(out, " {}", preview(&inv.description));
        }
        if !flags.is_empty() {
            let _ = write!(out, " ({})", flags.join(", "));
        }
        let _ = writeln!(out);

        for entry in &inv.task_entries {
            render_node(out, entry, None);
        }
        if let Some(result) = &inv.result {
            render_node(out, result, Some("<- "));
        }
    }
}

fn short_time(timestamp: &str) -> &str {
    // 2025-01-15T10:00:02.000Z -> 10:00:02
    timestamp.get(11..19).unwrap_or(timestamp)
}

pub fn render_stats(stats: &ConversationStats) -> String {
    let mut out = String::from("\n");
    let _ = writeln!(out, "roots:             {}", stats.roots);
    let _ = writeln!(out, "nodes:             {} ({} reachable)", stats.nodes, stats.reachable_nodes);
    let _ = writeln!(out, "invocations:       {}", stats.invocations);
    let _ = writeln!(out, "matched results:   {}", stats.matched_results);
    let _ = writeln!(
        out,
        "sidechains:        {} matched, {} missing",
        stats.matched_tasks, stats.unmatched_tasks
    );
    let _ = writeln!(out, "max depth:         {}", stats.max_depth);
    let _ = writeln!(out, "peak context:      {}", stats.peak_conversation_tokens);
    out
}

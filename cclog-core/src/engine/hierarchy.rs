//! Render depth assignment.

use super::arena::Arena;
use crate::types::NodeIdx;
use std::collections::HashSet;

/// Roots get depth 1. A matched result shares its invocation's depth;
/// sidechain entries sit one level below the node owning the Task call.
/// Sidechain children share their parent's depth.
pub fn assign_depths(arena: &mut Arena, roots: &[NodeIdx]) {
    let mut seen = HashSet::new();
    let mut stack: Vec<(NodeIdx, u32)> = roots.iter().rev().map(|&r| (r, 1)).collect();

    while let Some((idx, depth)) = stack.pop() {
        if !seen.insert(idx) {
            continue;
        }
        arena[idx].depth = depth;

        let mut next = Vec::new();
        for inv in &arena[idx].invocations {
            next.extend(inv.result.map(|r| (r, depth)));
            next.extend(inv.task_entries.iter().map(|&e| (e, depth + 1)));
        }
        next.extend(arena[idx].children.iter().map(|&c| (c, depth)));
        stack.extend(next.into_iter().rev());
    }
}

//! The reconstructed conversation and its exported forms.

use super::arena::Arena;
use crate::types::{CommandInfo, Node, NodeIdx, TokenUsage};
use serde::Serialize;
use std::collections::HashSet;

/// Engine output: every node plus the ordered main-timeline roots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    arena: Arena,
    roots: Vec<NodeIdx>,
    /// Non-fatal problems found while reading the log
    pub warnings: Vec<String>,
}

impl Conversation {
    pub(crate) fn new(arena: Arena, roots: Vec<NodeIdx>) -> Self {
        Self {
            arena,
            roots,
            warnings: Vec::new(),
        }
    }

    pub fn roots(&self) -> &[NodeIdx] {
        &self.roots
    }

    pub fn node(&self, idx: NodeIdx) -> Option<&Node> {
        self.arena.get(idx)
    }

    /// Look a node up by record uuid.
    pub fn get(&self, uuid: &str) -> Option<&Node> {
        self.arena.lookup(uuid).and_then(|idx| self.arena.get(idx))
    }

    /// Number of nodes, including unreachable sidechains.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// All nodes in log order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIdx, &Node)> {
        self.arena.iter()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Owned, nested copy of the forest with results and sidechain entries
    /// inlined under their invocations.
    ///
    /// A node's invocations are expanded the first time it is reached; later
    /// appearances (only possible in malformed logs) are emitted without them.
    pub fn to_tree(&self) -> Vec<TreeNode> {
        let mut expanded = HashSet::new();
        self.roots
            .iter()
            .map(|&idx| self.tree_node(idx, &mut expanded))
            .collect()
    }

    fn tree_node(&self, idx: NodeIdx, expanded: &mut HashSet<NodeIdx>) -> TreeNode {
        let node = &self.arena[idx];
        let invocations = if expanded.insert(idx) {
            node.invocations
                .iter()
                .map(|inv| TreeInvocation {
                    id: inv.id.clone(),
                    name: inv.name.clone(),
                    description: inv.description.clone(),
                    input: inv.input.clone(),
                    is_interrupted: inv.is_interrupted,
                    missing_result: inv.missing_result,
                    missing_sidechain: inv.missing_sidechain,
                    result: inv
                        .result
                        .map(|r| Box::new(self.tree_node(r, expanded))),
                    task_entries: inv
                        .task_entries
                        .iter()
                        .map(|&e| self.tree_node(e, expanded))
                        .collect(),
                })
                .collect()
        } else {
            Vec::new()
        };

        TreeNode {
            uuid: node.uuid.clone(),
            entry_type: node.entry_type.to_string(),
            role: node.role.clone(),
            timestamp: node.timestamp.clone(),
            content: node.content.clone(),
            depth: node.depth,
            is_sidechain: node.is_sidechain,
            is_tool_result: node.is_tool_result,
            is_error: node.is_error,
            is_caveat: node.is_caveat,
            tokens: node.tokens,
            command: node.command.clone(),
            invocations,
        }
    }

    /// Summary counters over the nodes reachable from the roots.
    pub fn stats(&self) -> ConversationStats {
        let reachable = self.arena.reachable_from(&self.roots);
        let mut stats = ConversationStats {
            roots: self.roots.len(),
            nodes: self.arena.len(),
            reachable_nodes: reachable.len(),
            ..Default::default()
        };

        for idx in reachable {
            let node = &self.arena[idx];
            stats.max_depth = stats.max_depth.max(node.depth);
            stats.total_conversation_tokens += node.tokens.total;
            stats.peak_conversation_tokens = stats.peak_conversation_tokens.max(node.tokens.total);
            for inv in &node.invocations {
                stats.invocations += 1;
                if inv.result.is_some() {
                    stats.matched_results += 1;
                }
                if !inv.task_entries.is_empty() {
                    stats.matched_tasks += 1;
                }
                if inv.missing_sidechain {
                    stats.unmatched_tasks += 1;
                }
            }
        }
        stats
    }
}

/// A node with everything hanging off it inlined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub uuid: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub role: String,
    pub timestamp: String,
    pub content: String,
    pub depth: u32,
    pub is_sidechain: bool,
    pub is_tool_result: bool,
    pub is_error: bool,
    pub is_caveat: bool,
    pub tokens: TokenUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invocations: Vec<TreeInvocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeInvocation {
    pub id: String,
    pub name: String,
    pub description: String,
    pub input: String,
    pub is_interrupted: bool,
    pub missing_result: bool,
    pub missing_sidechain: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<TreeNode>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub task_entries: Vec<TreeNode>,
}

/// Counters reported by `cclog --stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversationStats {
    pub roots: usize,
    pub nodes: usize,
    pub reachable_nodes: usize,
    pub invocations: usize,
    pub matched_results: usize,
    pub matched_tasks: usize,
    pub unmatched_tasks: usize,
    pub max_depth: u32,
    /// Sum of conversation sizes over reachable nodes
    pub total_conversation_tokens: u64,
    /// Largest single conversation size
    pub peak_conversation_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Invocation;

    fn node(uuid: &str, depth: u32, total: u64) -> Node {
        Node {
            uuid: uuid.to_string(),
            depth,
            tokens: TokenUsage {
                total,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn sample() -> Conversation {
        let mut arena = Arena::default();
        let root = arena.push(node("a", 1, 100));
        let result = arena.push(node("b", 1, 10));
        let side = arena.push(node("s", 2, 50));
        arena[root].invocations.push(Invocation {
            id: "t1".to_string(),
            name: "Task".to_string(),
            result: Some(result),
            task_entries: vec![side],
            ..Default::default()
        });
        arena[root].invocations.push(Invocation {
            id: "t2".to_string(),
            name: "Task".to_string(),
            missing_result: true,
            missing_sidechain: true,
            ..Default::default()
        });
        Conversation::new(arena, vec![root])
    }

    #[test]
    fn test_accessors() {
        let conv = sample();
        assert_eq!(conv.len(), 3);
        assert_eq!(conv.roots().len(), 1);
        assert_eq!(conv.get("s").map(|n| n.depth), Some(2));
        assert!(conv.get("zzz").is_none());
        assert!(conv.node(NodeIdx(99)).is_none());
    }

    #[test]
    fn test_to_tree_inlines_results_and_entries() {
        let tree = sample().to_tree();
        assert_eq!(tree.len(), 1);

        let task = &tree[0].invocations[0];
        assert_eq!(task.result.as_ref().map(|r| r.uuid.as_str()), Some("b"));
        assert_eq!(task.task_entries.len(), 1);
        assert_eq!(task.task_entries[0].uuid, "s");
        assert!(tree[0].invocations[1].result.is_none());
    }

    #[test]
    fn test_to_tree_serializes_compactly() {
        let json = serde_json::to_value(sample().to_tree()).unwrap();
        assert_eq!(json[0]["type"], "");
        assert!(json[0]["invocations"][1].get("result").is_none());
        assert!(json[0]["invocations"][0]["result"].get("invocations").is_none());
    }

    #[test]
    fn test_stats() {
        let stats = sample().stats();
        assert_eq!(stats.roots, 1);
        assert_eq!(stats.reachable_nodes, 3);
        assert_eq!(stats.invocations, 2);
        assert_eq!(stats.matched_results, 1);
        assert_eq!(stats.matched_tasks, 1);
        assert_eq!(stats.unmatched_tasks, 1);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.total_conversation_tokens, 160);
        assert_eq!(stats.peak_conversation_tokens, 100);
    }
}

//! Identifier-indexed node storage.
//!
//! Every [`Node`] lives in one `Vec`; relationships between nodes are
//! [`NodeIdx`] values resolved through this table.

use crate::types::{Node, NodeIdx};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::ops::{Index, IndexMut};
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Arena {
    nodes: Vec<Node>,
    by_uuid: HashMap<String, NodeIdx>,
}

impl Arena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            by_uuid: HashMap::with_capacity(capacity),
        }
    }

    /// Append a node. The first node seen for a uuid owns that uuid.
    pub fn push(&mut self, node: Node) -> NodeIdx {
        let idx = NodeIdx(self.nodes.len());
        if !node.uuid.is_empty() {
            if self.by_uuid.contains_key(&node.uuid) {
                warn!(uuid = %node.uuid, "Duplicate record uuid; keeping the first");
            } else {
                self.by_uuid.insert(node.uuid.clone(), idx);
            }
        }
        self.nodes.push(node);
        idx
    }

    pub fn get(&self, idx: NodeIdx) -> Option<&Node> {
        self.nodes.get(idx.0)
    }

    /// Resolve a record uuid.
    pub fn lookup(&self, uuid: &str) -> Option<NodeIdx> {
        self.by_uuid.get(uuid).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in log order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIdx, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIdx(i), n))
    }

    /// Fill `children` for sidechain nodes from their parent links.
    ///
    /// Computed once, right after normalization; children keep log order.
    /// Links that point outside the sidechain, to an unknown uuid, or to the
    /// node itself are ignored.
    pub fn link_sidechain_children(&mut self) {
        let mut edges: Vec<(NodeIdx, NodeIdx)> = Vec::new();
        for (idx, node) in self.iter() {
            if !node.is_sidechain {
                continue;
            }
            let Some(parent) = node.parent_uuid.as_deref().and_then(|p| self.lookup(p)) else {
                continue;
            };
            if parent != idx && self[parent].is_sidechain {
                edges.push((parent, idx));
            }
        }
        for (parent, child) in edges {
            self[parent].children.push(child);
        }
    }

    /// Every node reachable from `roots` through children, matched results
    /// and sidechain entries, in depth-first pre-order. Each node appears once.
    pub fn reachable_from(&self, roots: &[NodeIdx]) -> Vec<NodeIdx> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<NodeIdx> = roots.iter().rev().copied().collect();

        while let Some(idx) = stack.pop() {
            if !seen.insert(idx) {
                continue;
            }
            out.push(idx);

            let node = &self[idx];
            let mut next = Vec::new();
            for inv in &node.invocations {
                next.extend(inv.result);
                next.extend(inv.task_entries.iter().copied());
            }
            next.extend(node.children.iter().copied());
            stack.extend(next.into_iter().rev());
        }
        out
    }
}

impl Index<NodeIdx> for Arena {
    type Output = Node;

    fn index(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.0]
    }
}

impl IndexMut<NodeIdx> for Arena {
    fn index_mut(&mut self, idx: NodeIdx) -> &mut Node {
        &mut self.nodes[idx.0]
    }
}

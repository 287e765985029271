//! Tool call / tool result pairing.
//!
//! Main-timeline and sidechain invocation ids live in separate namespaces;
//! a sidechain result never matches a main-timeline call and vice versa.

use super::arena::Arena;
use crate::types::NodeIdx;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

const INTERRUPTED_MARKER: &str = "request interrupted by user";

/// Position of an invocation: owning node plus index into its list.
type InvocationRef = (NodeIdx, usize);

#[derive(Debug, Default)]
struct Namespaces {
    main: HashMap<String, InvocationRef>,
    sidechain: HashMap<String, InvocationRef>,
}

impl Namespaces {
    fn build(arena: &Arena) -> Self {
        let mut ns = Self::default();
        for (idx, node) in arena.iter() {
            let index = if node.is_sidechain {
                &mut ns.sidechain
            } else {
                &mut ns.main
            };
            for (pos, inv) in node.invocations.iter().enumerate() {
                if inv.id.is_empty() {
                    continue;
                }
                if index.contains_key(&inv.id) {
                    warn!(id = %inv.id, uuid = %node.uuid, "Duplicate tool use id; keeping the first");
                    continue;
                }
                index.insert(inv.id.clone(), (idx, pos));
            }
        }
        ns
    }

    fn lookup(&self, id: &str, sidechain: bool) -> Option<InvocationRef> {
        let index = if sidechain { &self.sidechain } else { &self.main };
        index.get(id).copied()
    }
}

/// Attach every tool result to the invocation it answers.
///
/// Returns the set of nodes that were attached. First result wins; a later
/// record answering an already-answered id is left alone.
pub fn match_results(arena: &mut Arena) -> HashSet<NodeIdx> {
    let namespaces = Namespaces::build(arena);

    let results: Vec<(NodeIdx, String, bool)> = arena
        .iter()
        .filter(|(_, n)| n.is_tool_result)
        .filter_map(|(idx, n)| {
            n.tool_result_id
                .as_ref()
                .map(|id| (idx, id.clone(), n.is_sidechain))
        })
        .collect();

    let mut attached = HashSet::new();
    for (result_idx, id, sidechain) in results {
        let Some((owner, pos)) = namespaces.lookup(&id, sidechain) else {
            debug!(id = %id, "Tool result has no matching invocation");
            continue;
        };
        if arena[owner].invocations[pos].result.is_some() {
            debug!(id = %id, "Invocation already has a result");
            continue;
        }

        let interrupted = {
            let result = &arena[result_idx];
            result.is_error
                && result
                    .content
                    .to_lowercase()
                    .contains(INTERRUPTED_MARKER)
        };
        let inv = &mut arena[owner].invocations[pos];
        inv.result = Some(result_idx);
        inv.is_interrupted = interrupted;
        attached.insert(result_idx);
    }

    debug!(matched = attached.len(), "Matched tool results");
    attached
}

/// Main-timeline nodes that were not attached as a result, in log order.
pub fn root_nodes(arena: &Arena, attached: &HashSet<NodeIdx>) -> Vec<NodeIdx> {
    arena
        .iter()
        .filter(|(idx, n)| !n.is_sidechain && !attached.contains(idx))
        .map(|(idx, _)| idx)
        .collect()
}

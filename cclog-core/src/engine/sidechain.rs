//! Task invocation ↔ sidechain correlation.
//!
//! Nothing in the log links a Task call to the sidechain it spawned. The
//! pairing is recovered by comparing text: the Task prompt against the
//! sidechain's first user message, and the Task result against the
//! sidechain's last assistant message.
//!
//! Scoring gives one point per side that matches, either exactly or, when
//! both strings are longer than `min_prefix_match_len`, as a prefix of one
//! another (logs truncate long texts). A score of 2 ends the search for that
//! Task; otherwise the first highest-scoring candidate wins. Near-identical
//! prompts on concurrent Tasks can still be mis-attributed.

use super::arena::Arena;
use crate::config::EngineConfig;
use crate::types::NodeIdx;
use std::collections::HashSet;
use tracing::debug;

pub const PERFECT_SCORE: u8 = 2;

/// Sidechain roots already claimed by a Task invocation.
pub type ClaimedSet = HashSet<NodeIdx>;

/// The texts a Task invocation is matched on, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSignature {
    pub prompt: String,
    pub result: String,
}

impl TaskSignature {
    pub fn new(prompt: &str, result: &str) -> Self {
        Self {
            prompt: normalize_text(prompt),
            result: normalize_text(result),
        }
    }
}

/// A sidechain root and its matchable texts, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub root: NodeIdx,
    pub first_user: String,
    pub last_assistant: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidechainMatch {
    pub root: NodeIdx,
    pub score: u8,
}

/// Collapse runs of whitespace to one space and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn texts_match(a: &str, b: &str, min_prefix_len: usize) -> bool {
    if a == b {
        return true;
    }
    a.len() > min_prefix_len
        && b.len() > min_prefix_len
        && (a.starts_with(b) || b.starts_with(a))
}

pub fn score(task: &TaskSignature, candidate: &Candidate, min_prefix_len: usize) -> u8 {
    let mut score = 0;
    if texts_match(&task.prompt, &candidate.first_user, min_prefix_len) {
        score += 1;
    }
    if texts_match(&task.result, &candidate.last_assistant, min_prefix_len) {
        score += 1;
    }
    score
}

/// Pick the sidechain for one Task invocation.
///
/// Pure: takes the claimed set by value and hands back the updated one.
pub fn select_sidechain(
    task: &TaskSignature,
    candidates: &[Candidate],
    mut claimed: ClaimedSet,
    min_prefix_len: usize,
) -> (Option<SidechainMatch>, ClaimedSet) {
    let mut best: Option<SidechainMatch> = None;

    for candidate in candidates.iter().filter(|c| !claimed.contains(&c.root)) {
        let s = score(task, candidate, min_prefix_len);
        if s > best.map_or(0, |b| b.score) {
            best = Some(SidechainMatch {
                root: candidate.root,
                score: s,
            });
            if s == PERFECT_SCORE {
                break;
            }
        }
    }

    if let Some(winner) = best {
        claimed.insert(winner.root);
    }
    (best, claimed)
}

// ============================================
// Candidate extraction
// ============================================

/// Sidechain nodes with no parent that are not tool results, in log order.
pub fn sidechain_roots(arena: &Arena) -> Vec<NodeIdx> {
    arena
        .iter()
        .filter(|(_, n)| n.is_sidechain && n.parent_uuid.is_none() && !n.is_tool_result)
        .map(|(idx, _)| idx)
        .collect()
}

fn is_user_text(arena: &Arena, idx: NodeIdx) -> bool {
    let node = &arena[idx];
    node.is_user() && !node.is_tool_result && !node.content.trim().is_empty()
}

/// First user message: the root itself, then its direct children in order,
/// then the same search one level further down each child.
pub fn first_user_message(arena: &Arena, root: NodeIdx) -> Option<&str> {
    if is_user_text(arena, root) {
        return Some(&arena[root].content);
    }

    let mut seen = HashSet::from([root]);
    let mut stack = vec![root];
    while let Some(idx) = stack.pop() {
        let children = &arena[idx].children;
        if let Some(&hit) = children.iter().find(|&&c| is_user_text(arena, c)) {
            return Some(&arena[hit].content);
        }
        stack.extend(children.iter().rev().filter(|c| seen.insert(**c)));
    }
    None
}

/// Most recent (by timestamp) non-tool-result assistant text in the subtree.
pub fn last_assistant_message(arena: &Arena, root: NodeIdx) -> Option<&str> {
    let mut best: Option<NodeIdx> = None;
    for idx in preorder(arena, root) {
        let node = &arena[idx];
        if !node.is_assistant() || node.is_tool_result || node.content.trim().is_empty() {
            continue;
        }
        if best.map_or(true, |b| node.emitted_at >= arena[b].emitted_at) {
            best = Some(idx);
        }
    }
    best.map(|idx| arena[idx].content.as_str())
}

/// Build a candidate for every root that has both texts.
pub fn candidates(arena: &Arena, roots: &[NodeIdx]) -> Vec<Candidate> {
    roots
        .iter()
        .filter_map(|&root| {
            let first_user = normalize_text(first_user_message(arena, root)?);
            let last_assistant = normalize_text(last_assistant_message(arena, root)?);
            if first_user.is_empty() || last_assistant.is_empty() {
                return None;
            }
            Some(Candidate {
                root,
                first_user,
                last_assistant,
            })
        })
        .collect()
}

// ============================================
// Subtree collection
// ============================================

fn preorder(arena: &Arena, root: NodeIdx) -> Vec<NodeIdx> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(idx) = stack.pop() {
        if !seen.insert(idx) {
            continue;
        }
        out.push(idx);
        stack.extend(arena[idx].children.iter().rev());
    }
    out
}

/// Flattened sidechain rooted at `root`, depth-first.
///
/// Tool results answered by an invocation inside the subtree are left out;
/// their children are still included.
pub fn collect_subtree(arena: &Arena, root: NodeIdx) -> Vec<NodeIdx> {
    let all = preorder(arena, root);
    let answered: HashSet<NodeIdx> = all
        .iter()
        .flat_map(|&idx| arena[idx].invocations.iter().filter_map(|inv| inv.result))
        .collect();

    all.into_iter()
        .filter(|idx| !(arena[*idx].is_tool_result && answered.contains(idx)))
        .collect()
}

// ============================================
// Pass
// ============================================

/// Outcome counts of one correlation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationReport {
    pub candidates: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub skipped: usize,
}

/// Assign sidechains to every Task invocation in the log, in log order.
pub fn correlate(arena: &mut Arena, config: &EngineConfig) -> CorrelationReport {
    let roots = sidechain_roots(arena);
    let candidates = candidates(arena, &roots);
    let mut report = CorrelationReport {
        candidates: candidates.len(),
        ..Default::default()
    };

    // Snapshot the Task invocations first; results are fixed by now.
    let mut tasks: Vec<(NodeIdx, usize, TaskSignature)> = Vec::new();
    for (idx, node) in arena.iter() {
        if !node.is_assistant() {
            continue;
        }
        for (pos, inv) in node.invocations.iter().enumerate() {
            if !config.is_task_tool(&inv.name) {
                continue;
            }
            let Some(prompt) = inv.prompt().filter(|p| !p.trim().is_empty()) else {
                debug!(id = %inv.id, "Task invocation has no prompt");
                report.skipped += 1;
                continue;
            };
            let Some(result) = inv
                .result
                .and_then(|r| arena[r].result_text.as_deref())
                .filter(|t| !t.trim().is_empty())
            else {
                debug!(id = %inv.id, "Task invocation has no result text");
                report.skipped += 1;
                continue;
            };
            tasks.push((idx, pos, TaskSignature::new(prompt, result)));
        }
    }

    let mut claimed = ClaimedSet::new();
    for (idx, pos, signature) in tasks {
        let (winner, updated) =
            select_sidechain(&signature, &candidates, claimed, config.min_prefix_match_len);
        claimed = updated;

        match winner {
            Some(m) => {
                let entries = collect_subtree(arena, m.root);
                debug!(
                    id = %arena[idx].invocations[pos].id,
                    root = %arena[m.root].uuid,
                    score = m.score,
                    entries = entries.len(),
                    "Matched sidechain"
                );
                arena[idx].invocations[pos].task_entries = entries;
                report.matched += 1;
            }
            None => {
                debug!(id = %arena[idx].invocations[pos].id, "No sidechain matched");
                report.unmatched += 1;
            }
        }
    }

    report
}

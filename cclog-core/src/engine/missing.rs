//! Advisory flags for invocations whose result or sidechain never showed up.

use super::arena::Arena;
use crate::config::EngineConfig;
use crate::types::NodeIdx;

/// Flag reachable invocations; returns how many were flagged.
pub fn flag_missing(arena: &mut Arena, roots: &[NodeIdx], config: &EngineConfig) -> usize {
    let mut flagged = 0;
    for idx in arena.reachable_from(roots) {
        for inv in arena[idx].invocations.iter_mut() {
            inv.missing_result = inv.result.is_none();
            inv.missing_sidechain = config.is_task_tool(&inv.name) && inv.task_entries.is_empty();
            if inv.has_missing_data() {
                flagged += 1;
            }
        }
    }
    flagged
}

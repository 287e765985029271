//! Conversation reconstruction
//!
//! Turns the flat records of one log into a forest of display-ready nodes.
//! Stages run strictly in order over the whole log; each one assumes the
//! previous stage has finished for every node.
//!
//! ```text
//! RawEntry[] ─► normalize ─► match results ─► correlate sidechains
//!           ─► root list ─► depths ─► token totals ─► missing flags
//!           ─► command output linking ─► Conversation
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use cclog_core::engine::Engine;
//! use cclog_core::tools::ToolRegistry;
//! use cclog_core::Config;
//! use std::path::Path;
//!
//! let config = Config::load().expect("failed to load config");
//! let registry = ToolRegistry::with_defaults();
//! let engine = Engine::new(&config.engine, &registry);
//!
//! let conversation = engine.run_file(Path::new("session.jsonl")).expect("unreadable log");
//! for root in conversation.to_tree() {
//!     println!("{} {}", root.role, root.content);
//! }
//! ```

pub mod arena;
pub mod commands;
pub mod conversation;
pub mod hierarchy;
pub mod matcher;
pub mod missing;
pub mod normalize;
pub mod sidechain;
pub mod tokens;

pub use arena::Arena;
pub use conversation::{Conversation, ConversationStats, TreeInvocation, TreeNode};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::ingest::read_log;
use crate::tools::ToolRegistry;
use crate::types::RawEntry;
use std::path::Path;
use tracing::info;

/// Runs the reconstruction pipeline with a fixed configuration and registry.
pub struct Engine<'a> {
    config: &'a EngineConfig,
    registry: &'a ToolRegistry,
}

impl<'a> Engine<'a> {
    pub fn new(config: &'a EngineConfig, registry: &'a ToolRegistry) -> Self {
        Self { config, registry }
    }

    /// Reconstruct a conversation from records already in memory.
    pub fn run(&self, entries: &[RawEntry]) -> Conversation {
        let mut arena = Arena::with_capacity(entries.len());
        for entry in entries {
            arena.push(normalize::normalize(entry, self.registry));
        }
        arena.link_sidechain_children();

        let attached = matcher::match_results(&mut arena);
        let correlation = sidechain::correlate(&mut arena, self.config);
        let roots = matcher::root_nodes(&arena, &attached);

        hierarchy::assign_depths(&mut arena, &roots);
        tokens::aggregate(&mut arena, &roots, self.config.include_output_in_total);
        let flagged = missing::flag_missing(&mut arena, &roots, self.config);
        let commands = commands::link_command_outputs(&mut arena, &roots);

        info!(
            nodes = arena.len(),
            roots = roots.len(),
            results = attached.len(),
            sidechains = correlation.candidates,
            tasks_matched = correlation.matched,
            tasks_unmatched = correlation.unmatched,
            missing = flagged,
            commands,
            "Reconstructed conversation"
        );

        Conversation::new(arena, roots)
    }

    /// Read a log file and reconstruct it. Parse warnings are carried on the
    /// returned conversation.
    pub fn run_file(&self, path: &Path) -> Result<Conversation> {
        let log = read_log(path)?;
        info!(
            path = %path.display(),
            entries = log.entries.len(),
            skipped = log.skipped_lines,
            "Loaded log"
        );
        let mut conversation = self.run(&log.entries);
        conversation.warnings = log.warnings;
        Ok(conversation)
    }
}

/// One-shot reconstruction with a throwaway engine.
pub fn reconstruct(
    entries: &[RawEntry],
    config: &EngineConfig,
    registry: &ToolRegistry,
) -> Conversation {
    Engine::new(config, registry).run(entries)
}

//! # cclog-core
//!
//! Core library for cclog - a reconstruction engine for Claude Code
//! conversation logs.
//!
//! This library provides:
//! - A JSONL reader for session logs
//! - The reconstruction engine (tool call/result pairing, sidechain
//!   correlation, depth and token annotation)
//! - A registry of tool input formatters
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Raw:** JSONL records, deserialized but uninterpreted ([`RawEntry`])
//! - **Arena:** one [`Node`] per record, linked by [`NodeIdx`]
//! - **Forest:** the ordered root list with results and sidechains resolved
//!   ([`Conversation`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use cclog_core::{Config, Engine, ToolRegistry};
//! use std::path::Path;
//!
//! let config = Config::load().expect("failed to load config");
//! let registry = ToolRegistry::with_defaults();
//!
//! let conversation = Engine::new(&config.engine, &registry)
//!     .run_file(Path::new("session.jsonl"))
//!     .expect("failed to read log");
//! println!("{} roots", conversation.roots().len());
//! ```

// Re-export commonly used items at the crate root
pub use config::{Config, EngineConfig};
pub use engine::{Conversation, ConversationStats, Engine, TreeNode};
pub use error::{Error, Result};
pub use ingest::{parse_log, read_log, LogFile};
pub use tools::ToolRegistry;
pub use types::*;

// Public modules
pub mod config;
pub mod doc;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod tools;
pub mod types;

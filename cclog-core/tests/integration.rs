//! Integration tests for the cclog reader and reconstruction pipeline
//!
//! These tests use fixture files in `tests/fixtures/` to verify the
//! end-to-end flow from JSONL on disk to a resolved conversation forest.

use cclog_core::engine::Engine;
use cclog_core::{Config, Conversation, EngineConfig, Error, Node, ToolRegistry};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn run_with(path: &Path, config: &EngineConfig) -> Conversation {
    let registry = ToolRegistry::with_defaults();
    Engine::new(config, &registry)
        .run_file(path)
        .expect("fixture should be readable")
}

fn run_fixture(name: &str) -> Conversation {
    run_with(&fixture_path(name), &EngineConfig::default())
}

fn node<'a>(conv: &'a Conversation, uuid: &str) -> &'a Node {
    conv.get(uuid)
        .unwrap_or_else(|| panic!("node {} should exist", uuid))
}

fn root_ids(conv: &Conversation) -> Vec<&str> {
    conv.roots()
        .iter()
        .map(|&idx| conv.node(idx).unwrap().uuid.as_str())
        .collect()
}

// ============================================
// Basic Reconstruction Tests
// ============================================

#[test]
fn test_minimal_session() {
    let conv = run_fixture("minimal-session.jsonl");

    // Summary record is dropped, the two turns remain
    assert_eq!(conv.len(), 2);
    assert_eq!(root_ids(&conv), vec!["u1", "a1"]);
    assert!(conv.warnings.is_empty());

    for &idx in conv.roots() {
        let n = conv.node(idx).unwrap();
        assert_eq!(n.depth, 1);
        assert!(n.invocations.is_empty());
    }

    let reply = node(&conv, "a1");
    assert_eq!(reply.content, "Hi there");
    assert_eq!(reply.tokens.total, 125);
    assert_eq!(reply.display_time(), "10:00:02");
}

#[test]
fn test_tool_calls_nest_results() {
    let conv = run_fixture("with-tool-calls.jsonl");

    // Matched results disappear from the root list
    assert_eq!(root_ids(&conv), vec!["w1", "w2", "w4", "w6"]);

    let read = &node(&conv, "w2").invocations[0];
    assert_eq!(read.name, "Read");
    assert_eq!(read.description, "/etc/hosts (lines 1-10)");
    let result = conv.node(read.result.unwrap()).unwrap();
    assert_eq!(result.uuid, "w3");
    assert_eq!(result.content, "127.0.0.1 localhost");
    assert!(!read.is_interrupted);

    let bash = &node(&conv, "w4").invocations[0];
    assert!(bash.is_interrupted);
    assert!(!bash.missing_result);
    assert_eq!(bash.input, "# Clean build output\n/home/dev/project\n$ rm -rf build");
}

#[test]
fn test_malformed_json_recovery() {
    let conv = run_fixture("malformed-lines.jsonl");

    assert_eq!(root_ids(&conv), vec!["v1", "v2"]);
    assert_eq!(conv.warnings.len(), 1);
    assert!(conv.warnings[0].starts_with("Line 2:"));
}

#[test]
fn test_truncated_file_flags_missing_data() {
    let conv = run_fixture("truncated.jsonl");

    assert_eq!(root_ids(&conv), vec!["t1", "t2"]);
    assert_eq!(conv.warnings.len(), 1);

    let invs = &node(&conv, "t2").invocations;
    assert_eq!(invs.len(), 2);
    assert!(invs[0].missing_result);
    assert!(!invs[0].missing_sidechain);
    assert!(invs[1].missing_result);
    assert!(invs[1].missing_sidechain);
    assert!(invs.iter().all(|i| i.has_missing_data()));
}

#[test]
fn test_commands_and_caveats() {
    let conv = run_fixture("with-commands.jsonl");

    assert_eq!(conv.roots().len(), 5);
    assert!(node(&conv, "c1").is_caveat);

    let cmd = node(&conv, "c2").command.as_ref().expect("command parsed");
    assert_eq!(cmd.name, "/model");
    assert_eq!(cmd.args, "sonnet");
    assert_eq!(cmd.output.as_deref(), Some("Set model to sonnet"));

    // Suppressed, not removed
    assert_eq!(node(&conv, "c3").content, "");
    assert_eq!(node(&conv, "c4").content, "hello again");
}

// ============================================
// Sidechain Correlation Tests
// ============================================

#[test]
fn test_task_claims_exact_sidechain() {
    let conv = run_fixture("with-task-sidechain.jsonl");

    assert_eq!(root_ids(&conv), vec!["m1", "m2", "m4", "m6"]);

    let task = &node(&conv, "m2").invocations[0];
    let entries: Vec<&str> = task
        .task_entries
        .iter()
        .map(|&idx| conv.node(idx).unwrap().uuid.as_str())
        .collect();

    // s3 and s5 are tool results reachable through their invocations
    assert_eq!(entries, vec!["s1", "s2", "s4", "s6"]);
    assert!(!task.missing_sidechain);

    // The decoy sidechain stays unclaimed and unreachable
    assert_eq!(node(&conv, "d1").depth, 0);
}

#[test]
fn test_nested_task_depths() {
    let conv = run_fixture("with-task-sidechain.jsonl");

    for uuid in ["m1", "m2", "m3", "m4", "m5", "m6"] {
        assert_eq!(node(&conv, uuid).depth, 1, "{} should be at depth 1", uuid);
    }
    for uuid in ["s1", "s2", "s3", "s4", "s5", "s6"] {
        assert_eq!(node(&conv, uuid).depth, 2, "{} should be at depth 2", uuid);
    }
    for uuid in ["n1", "n2"] {
        assert_eq!(node(&conv, uuid).depth, 3, "{} should be at depth 3", uuid);
    }

    let nested = &node(&conv, "s4").invocations[0];
    assert_eq!(nested.task_entries.len(), 2);
}

#[test]
fn test_namespaces_keep_colliding_ids_apart() {
    let conv = run_fixture("with-task-sidechain.jsonl");

    let side_read = &node(&conv, "s2").invocations[0];
    let main_bash = &node(&conv, "m4").invocations[0];
    assert_eq!(side_read.id, main_bash.id);

    assert_eq!(conv.node(side_read.result.unwrap()).unwrap().uuid, "s3");
    assert_eq!(conv.node(main_bash.result.unwrap()).unwrap().uuid, "m5");
}

#[test]
fn test_claims_are_exclusive() {
    let conv = run_fixture("with-task-sidechain.jsonl");

    let mut seen = std::collections::HashSet::new();
    for (_, n) in conv.nodes() {
        for inv in &n.invocations {
            if let Some(&first) = inv.task_entries.first() {
                assert!(seen.insert(first), "sidechain root claimed twice");
            }
        }
    }
    assert_eq!(seen.len(), 2);
}

#[test]
fn test_stats_and_tree() {
    let conv = run_fixture("with-task-sidechain.jsonl");

    let stats = conv.stats();
    assert_eq!(stats.roots, 4);
    assert_eq!(stats.nodes, 16);
    assert_eq!(stats.invocations, 4);
    assert_eq!(stats.matched_results, 4);
    assert_eq!(stats.matched_tasks, 2);
    assert_eq!(stats.unmatched_tasks, 0);
    assert_eq!(stats.max_depth, 3);
    assert_eq!(stats.peak_conversation_tokens, 1210);

    let tree = conv.to_tree();
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json[1]["invocations"][0]["task_entries"][0]["uuid"], "s1");
    assert_eq!(json[1]["invocations"][0]["result"]["uuid"], "m3");
}

#[test]
fn test_idempotent_reconstruction() {
    let first = run_fixture("with-task-sidechain.jsonl").to_tree();
    let second = run_fixture("with-task-sidechain.jsonl").to_tree();
    assert_eq!(first, second);
}

// ============================================
// Configuration Tests
// ============================================

#[test]
fn test_output_tokens_included_when_configured() {
    let config = EngineConfig {
        include_output_in_total: true,
        ..Default::default()
    };
    let conv = run_with(&fixture_path("minimal-session.jsonl"), &config);

    // 125 context + 2 estimated output tokens for "Hi there"
    assert_eq!(node(&conv, "a1").tokens.total, 127);
}

#[test]
fn test_config_file_drives_engine() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[engine]\ntask_tool_names = [\"Agent\"]\n\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();

    let config = Config::load_from(&config_path).unwrap();
    assert_eq!(config.logging.level, "debug");

    // With "Task" no longer a sidechain spawner nothing gets correlated
    let conv = run_with(&fixture_path("with-task-sidechain.jsonl"), &config.engine);
    let task = &node(&conv, "m2").invocations[0];
    assert!(task.task_entries.is_empty());
    assert!(!task.missing_sidechain);
}

// ============================================
// File Handling Tests
// ============================================

#[test]
fn test_missing_file_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let registry = ToolRegistry::with_defaults();
    let config = EngineConfig::default();

    let err = Engine::new(&config, &registry)
        .run_file(&temp_dir.path().join("gone.jsonl"))
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_log_written_to_temp_dir() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"{{"uuid":"x1","type":"assistant","message":{{"role":"assistant","content":[{{"type":"tool_use","id":"t1","name":"Bash","input":{{"command":"ls"}}}}]}}}}"#
    )
    .unwrap();
    writeln!(file).unwrap();
    writeln!(
        file,
        r#"{{"uuid":"x2","type":"user","message":{{"role":"user","content":[{{"type":"tool_result","tool_use_id":"t1","content":"a.txt"}}]}}}}"#
    )
    .unwrap();
    drop(file);

    let conv = run_with(&path, &EngineConfig::default());
    assert_eq!(root_ids(&conv), vec!["x1"]);
    assert!(conv.warnings.is_empty());
}

//! JSONL log reader
//!
//! Reads a Claude Code session log (one JSON object per line) into
//! [`RawEntry`] records. The whole file is read before the engine runs.
//!
//! # Error Handling
//!
//! - **Missing or unreadable file**: the only fatal condition, returned as
//!   [`Error::Io`] with the path in the message.
//! - **Malformed JSON lines**: logged as warning, line skipped, reading
//!   continues. The warning is recorded in [`LogFile::warnings`].
//! - **Summary records**: `type == "summary"` lines are dropped before
//!   deserialization.
//! - **Missing or null fields**: defaulted via `#[serde(default)]` on
//!   [`RawEntry`]; explicit `null` strings read as empty.

use crate::error::{Error, Result};
use crate::types::RawEntry;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Record type that carries a session title, never a conversation turn.
const SUMMARY_TYPE: &str = "summary";

/// Entries read from one log, plus what was skipped on the way.
#[derive(Debug, Default)]
pub struct LogFile {
    /// Retained records in file order
    pub entries: Vec<RawEntry>,
    /// Non-fatal problems (line number + reason)
    pub warnings: Vec<String>,
    /// Lines dropped because they were not valid records
    pub skipped_lines: usize,
    /// Summary records dropped
    pub skipped_summaries: usize,
}

/// Read a JSONL log from disk.
pub fn read_log(path: &Path) -> Result<LogFile> {
    let file = File::open(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open {}: {}", path.display(), e),
        ))
    })?;

    let mut log = LogFile::default();
    for (idx, line_result) in BufReader::new(file).lines().enumerate() {
        let line_number = idx + 1;
        match line_result {
            Ok(line) => push_line(&mut log, line_number, &line),
            Err(e) => {
                log.skipped_lines += 1;
                log.warnings
                    .push(format!("Line {}: read error: {}", line_number, e));
                warn!(line = line_number, error = %e, "Skipping unreadable line");
            }
        }
    }

    debug!(
        path = %path.display(),
        entries = log.entries.len(),
        skipped = log.skipped_lines,
        "Read log file"
    );

    Ok(log)
}

/// Parse an in-memory JSONL string.
pub fn parse_log(input: &str) -> LogFile {
    let mut log = LogFile::default();
    for (idx, line) in input.lines().enumerate() {
        push_line(&mut log, idx + 1, line);
    }
    log
}

fn push_line(log: &mut LogFile, line_number: usize, line: &str) {
    if line.trim().is_empty() {
        return;
    }

    match parse_entry(line) {
        Ok(Some(entry)) => log.entries.push(entry),
        Ok(None) => {
            log.skipped_summaries += 1;
            debug!(line = line_number, "Skipping summary record");
        }
        Err(e) => {
            log.skipped_lines += 1;
            log.warnings.push(format!("Line {}: {}", line_number, e));
            warn!(line = line_number, error = %e, "Skipping malformed line");
        }
    }
}

/// Decode one line. `Ok(None)` for summary records.
fn parse_entry(line: &str) -> Result<Option<RawEntry>> {
    let raw_json: serde_json::Value = serde_json::from_str(line)?;
    if raw_json.get("type").and_then(|v| v.as_str()) == Some(SUMMARY_TYPE) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(raw_json)?))
}

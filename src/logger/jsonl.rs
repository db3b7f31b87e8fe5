//! JSONL activity log: append-only line-delimited JSON for each run.
//!
//! Each line is a self-contained JSON object. Lines are assembled in memory
//! and written atomically via `write_all` to prevent interleaved partial
//! lines when the file is being tailed by another process.
//!
//! Degradation chain:
//! 1. Configured file path
//! 2. stderr with `[SFO-JSONL]` prefix
//! 3. Disabled (no path configured — silent)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Log event types matching the run activity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStart,
    ScanComplete,
    DirCreate,
    FileCopy,
    FileSkip,
    RunComplete,
    Error,
}

/// A single JSONL log entry — all fields optional except `ts`, `event`,
/// `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    /// Event type identifier.
    pub event: EventType,
    /// Severity level.
    pub severity: Severity,
    /// Affected filesystem path (when applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Decoded author key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Size in bytes of the copied file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// SFO error code when the event records a failure or skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            path: None,
            author: None,
            size: None,
            error_code: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.display().to_string());
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Degradation state of the JSONL writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Writing to the configured path.
    Normal,
    /// File unavailable, writing to stderr.
    Stderr,
    /// No log path configured — entries are dropped.
    Disabled,
}

/// Append-only JSONL log writer with stderr fallback.
///
/// Logging must never fail a run: every write path swallows its own errors
/// and degrades instead.
pub struct JsonlWriter {
    writer: Option<BufWriter<File>>,
    state: WriterState,
}

impl JsonlWriter {
    /// Open the JSONL log file, falling back to stderr on failure.
    pub fn open(path: &Path) -> Self {
        match open_append(path) {
            Ok(file) => Self {
                writer: Some(BufWriter::with_capacity(16 * 1024, file)),
                state: WriterState::Normal,
            },
            Err(err) => {
                let _ = writeln!(
                    io::stderr(),
                    "[SFO-JSONL] cannot open {}: {err}; using stderr",
                    path.display()
                );
                Self {
                    writer: None,
                    state: WriterState::Stderr,
                }
            }
        }
    }

    /// A writer that drops every entry. Used when no log path is configured.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            writer: None,
            state: WriterState::Disabled,
        }
    }

    /// Write a single log entry as one atomic JSONL line.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        if self.state == WriterState::Disabled {
            return;
        }
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[SFO-JSONL] serialize error: {e}");
                return;
            }
        };

        match self.state {
            WriterState::Normal => {
                if let Some(w) = self.writer.as_mut() {
                    if w.write_all(line.as_bytes()).is_ok() {
                        return;
                    }
                }
                self.state = WriterState::Stderr;
                self.writer = None;
                let _ = write!(io::stderr(), "[SFO-JSONL] {line}");
            }
            WriterState::Stderr => {
                let _ = write!(io::stderr(), "[SFO-JSONL] {line}");
            }
            WriterState::Disabled => {}
        }
    }

    /// Flush buffers.
    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current degradation state.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Disabled => "disabled",
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Open or create a file for appending, creating parent directories.
fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Format current UTC time as ISO 8601.
fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_entry_produces_valid_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let mut writer = JsonlWriter::open(&path);
        assert_eq!(writer.state(), "normal");

        writer.write_entry(&LogEntry::new(EventType::RunStart, Severity::Info));
        writer.write_entry(
            &LogEntry::new(EventType::FileCopy, Severity::Info)
                .with_author("alice")
                .with_path(Path::new("/tmp/x.java")),
        );
        writer.flush();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("ts").is_some());
            assert!(value.get("event").is_some());
        }
    }

    #[test]
    fn optional_fields_are_omitted_when_unset() {
        let entry = LogEntry::new(EventType::ScanComplete, Severity::Info);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("author"));
        assert!(!json.contains("error_code"));
        assert!(json.contains("scan_complete"));
    }

    #[test]
    fn disabled_writer_drops_entries_silently() {
        let mut writer = JsonlWriter::disabled();
        assert_eq!(writer.state(), "disabled");
        writer.write_entry(&LogEntry::new(EventType::Error, Severity::Critical));
    }

    #[test]
    fn appending_preserves_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");

        for _ in 0..2 {
            let mut writer = JsonlWriter::open(&path);
            writer.write_entry(&LogEntry::new(EventType::RunComplete, Severity::Info));
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}

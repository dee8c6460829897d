//! Developer-facing diagnostic log.
//!
//! Records what the UI layer did and why it degraded: fetch starts and
//! failures, stale responses that were dropped, theme changes, notification
//! lifecycle steps. Nothing here is shown to the user.
//!
//! Entries are JSON lines appended to `~/.pbi-explorer/ui-events.jsonl`.
//! Logging is best-effort: I/O failures are silently ignored so diagnostics
//! never interfere with the page.
use std::cell::RefCell;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::expand_home;
use crate::config::schema::LoggingConfig;

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single line in the diagnostic log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: Level,
    /// Short machine-friendly tag, e.g. `"fetch.failed"`.
    pub event: String,
    pub detail: String,
}

#[derive(Debug, Clone)]
enum Sink {
    Disabled,
    File(PathBuf),
    Memory(Rc<RefCell<Vec<LogEntry>>>),
}

/// Handle to the diagnostic log. Cheap to clone; clones share the sink.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    sink: Sink,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::disabled()
    }
}

impl DiagnosticLog {
    /// Log to the default JSONL file, or nowhere if there is no home
    /// directory.
    pub fn to_default_file() -> Self {
        match ui_log_path() {
            Some(path) => Self::to_file(path),
            None => Self::disabled(),
        }
    }

    /// Build the log described by the `[logging]` config section.
    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        match expand_home(&config.path) {
            Some(path) => Self::to_file(path),
            None => Self::disabled(),
        }
    }

    pub fn to_file(path: PathBuf) -> Self {
        Self {
            sink: Sink::File(path),
        }
    }

    /// Keep entries in memory. [`entries`](Self::entries) reads them back.
    pub fn in_memory() -> Self {
        Self {
            sink: Sink::Memory(Rc::new(RefCell::new(Vec::new()))),
        }
    }

    pub fn disabled() -> Self {
        Self {
            sink: Sink::Disabled,
        }
    }

    pub fn debug(&self, event: &str, detail: impl Into<String>) {
        self.record(Level::Debug, event, detail.into());
    }

    pub fn info(&self, event: &str, detail: impl Into<String>) {
        self.record(Level::Info, event, detail.into());
    }

    pub fn warn(&self, event: &str, detail: impl Into<String>) {
        self.record(Level::Warn, event, detail.into());
    }

    pub fn error(&self, event: &str, detail: impl Into<String>) {
        self.record(Level::Error, event, detail.into());
    }

    /// Snapshot of recorded entries (memory sink only; empty otherwise).
    pub fn entries(&self) -> Vec<LogEntry> {
        match &self.sink {
            Sink::Memory(entries) => entries.borrow().clone(),
            _ => Vec::new(),
        }
    }

    /// Entries whose event tag equals `event` (memory sink only).
    pub fn entries_for(&self, event: &str) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.event == event)
            .collect()
    }

    fn record(&self, level: Level, event: &str, detail: String) {
        if matches!(self.sink, Sink::Disabled) {
            return;
        }
        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            level,
            event: event.to_string(),
            detail,
        };
        match &self.sink {
            Sink::Disabled => {}
            Sink::Memory(entries) => entries.borrow_mut().push(entry),
            Sink::File(path) => {
                let _ = append_entry(path, &entry);
            }
        }
    }
}

fn append_entry(path: &PathBuf, entry: &LogEntry) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Return the path to the diagnostic log file.
pub fn ui_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pbi-explorer").join("ui-events.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

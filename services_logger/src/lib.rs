//! # Logger Service
//!
//! This crate implements structured logging for the editor session.
//!
//! ## Philosophy
//!
//! Logging is explicit and structured, not text-based or printf-style.
//! Entries are kept in a bounded in-session buffer that tests can inspect,
//! and each one is also forwarded to the `log` facade for whatever backend
//! the host installs.

use std::collections::VecDeque;
use std::fmt;

/// Default number of entries retained by a [`SessionLog`]
pub const DEFAULT_CAPACITY: usize = 256;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    fn to_facade(self) -> log::Level {
        match self {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Emitting component (if known)
    pub source: Option<String>,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Creates a new log entry
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            source: None,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Sets the emitting component
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a field to the log entry
    pub fn with_field(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.fields.push((key.into(), value.to_string()));
        self
    }

    /// Looks up a field value by key
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.level)?;
        if let Some(source) = &self.source {
            write!(f, " {}:", source)?;
        }
        write!(f, " {}", self.message)?;
        for (key, value) in &self.fields {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

/// Bounded in-memory log for one editing session
///
/// Oldest entries are evicted once `capacity` is reached. Entries below
/// `min_level` are dropped entirely.
#[derive(Debug, Clone)]
pub struct SessionLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    min_level: LogLevel,
}

impl SessionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            min_level: LogLevel::Debug,
        }
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Records an entry and forwards it to the `log` facade
    pub fn record(&mut self, entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }
        let target = entry.source.as_deref().unwrap_or("richtext");
        log::log!(target: target, entry.level.to_facade(), "{}", entry);

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.record(LogEntry::new(LogLevel::Debug, message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(LogEntry::new(LogLevel::Info, message));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(LogEntry::new(LogLevel::Warn, message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(LogEntry::new(LogLevel::Error, message));
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Entries at or above `level`
    pub fn at_least(&self, level: LogLevel) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.level >= level)
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn drain(&mut self) -> Vec<LogEntry> {
        self.entries.drain(..).collect()
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

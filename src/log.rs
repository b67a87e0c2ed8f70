//! # Task Log Module
//!
//! Messaggi di log con severità che i task inviano al listener.
//!
//! ## Responsabilità:
//! - `LogLevel`: DEBUG / INFO / WARNING / ERROR
//! - `LogMessage`: severità + testo, rappresentato come `LEVEL:testo`
//! - `LogSink`: lato mittente del canale, clonabile e usabile da qualsiasi thread
//! - Ogni messaggio viene anche emesso come evento `tracing` allo stesso livello
//!
//! ## Esempio:
//! ```rust
//! use transcode_tasks::log::{LogLevel, LogSink};
//!
//! let (sink, mut rx) = LogSink::channel();
//! sink.info("Generating thumbnail");
//! let message = rx.try_recv().unwrap();
//! assert_eq!(message.level, LogLevel::Info);
//! assert_eq!(message.to_string(), "INFO:Generating thumbnail");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Severity attached to each task message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            other => Err(format!("Unknown log level: {}", other)),
        }
    }
}

/// A severity-tagged message from a background task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: LogLevel,
    pub text: String,
}

impl LogMessage {
    pub fn new(level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.level, self.text)
    }
}

impl FromStr for LogMessage {
    type Err = String;

    /// Parses the `LEVEL:text` form; the text keeps any further colons
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (level, text) = s
            .split_once(':')
            .ok_or_else(|| format!("Missing severity prefix: {}", s))?;
        Ok(Self::new(level.parse()?, text.trim_start()))
    }
}

/// Sending half of the task log channel
#[derive(Debug, Clone)]
pub struct LogSink {
    tx: Option<UnboundedSender<LogMessage>>,
}

impl LogSink {
    /// Create a sink plus the receiver the listener drains
    pub fn channel() -> (Self, UnboundedReceiver<LogMessage>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that only forwards to `tracing`
    pub fn tracing_only() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, level: LogLevel, text: impl Into<String>) {
        let message = LogMessage::new(level, text);

        match message.level {
            LogLevel::Debug => tracing::debug!(target: "task", "{}", message.text),
            LogLevel::Info => tracing::info!(target: "task", "{}", message.text),
            LogLevel::Warning => tracing::warn!(target: "task", "{}", message.text),
            LogLevel::Error => tracing::error!(target: "task", "{}", message.text),
        }

        if let Some(ref tx) = self.tx {
            // Listener gone: the tracing event above is all that is left
            let _ = tx.send(message);
        }
    }

    pub fn debug(&self, text: impl Into<String>) {
        self.emit(LogLevel::Debug, text);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.emit(LogLevel::Info, text);
    }

    pub fn warning(&self, text: impl Into<String>) {
        self.emit(LogLevel::Warning, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.emit(LogLevel::Error, text);
    }
}

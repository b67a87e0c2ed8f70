//! # Task Signal Module
//!
//! Risultato taggato di un'invocazione e notifica di completamento.
//!
//! ## Responsabilità:
//! - `TaskResult`: Success / Error / Cancelled / NonZeroExit
//! - `TaskKind`: quale dei quattro task ha prodotto il risultato
//! - `TaskSignal`: la singola notifica terminale consegnata al listener
//! - `Hdr10Status`: categorie del task HDR10+ (`COMPLETE|path`, `STOPPED|STOPPED`, ...)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Outcome of one runner invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TaskResult {
    /// Tool exited 0. `path` is set when the invocation produced a known file.
    Success {
        output: String,
        path: Option<PathBuf>,
    },
    /// The tool could not be launched or the setup failed
    Error(String),
    /// Terminated on request of the caller
    Cancelled,
    /// Tool ran and reported failure
    NonZeroExit { code: i32, output: String },
}

impl TaskResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self::Success {
            output: output.into(),
            path: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Captured tool output, when the tool ran at all
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Success { output, .. } | Self::NonZeroExit { output, .. } => Some(output),
            Self::Error(_) | Self::Cancelled => None,
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { path: Some(path), .. } => write!(f, "completed: {}", path.display()),
            Self::Success { path: None, .. } => write!(f, "completed"),
            Self::Error(message) => write!(f, "error: {}", message),
            Self::Cancelled => write!(f, "cancelled"),
            Self::NonZeroExit { code, .. } => write!(f, "exited with code {}", code),
        }
    }
}

/// The four background tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Thumbnail,
    SubtitleFix,
    SubtitleExtract,
    Hdr10Extract,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::SubtitleFix => "subtitle-fix",
            Self::SubtitleExtract => "subtitle-extract",
            Self::Hdr10Extract => "hdr10-extract",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal notification delivered once per task invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSignal {
    pub kind: TaskKind,
    pub result: TaskResult,
}

impl TaskSignal {
    pub fn new(kind: TaskKind, result: TaskResult) -> Self {
        Self { kind, result }
    }

    /// The listener-facing category of an HDR10+ extraction
    pub fn hdr10_status(&self) -> Option<Hdr10Status> {
        match self.kind {
            TaskKind::Hdr10Extract => Some(Hdr10Status::from(&self.result)),
            _ => None,
        }
    }
}

/// Categories the HDR10+ listener reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hdr10Status {
    Error(String),
    Stopped,
    Complete(PathBuf),
    ErrorCode(i32),
}

impl From<&TaskResult> for Hdr10Status {
    fn from(result: &TaskResult) -> Self {
        match result {
            TaskResult::Success { path: Some(path), .. } => Self::Complete(path.clone()),
            TaskResult::Success { path: None, .. } => {
                Self::Error("extraction finished without an output path".to_string())
            }
            TaskResult::Error(message) => Self::Error(message.clone()),
            TaskResult::Cancelled => Self::Stopped,
            TaskResult::NonZeroExit { code, .. } => Self::ErrorCode(*code),
        }
    }
}

impl fmt::Display for Hdr10Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message) => write!(f, "ERROR|{}", message),
            Self::Stopped => write!(f, "STOPPED|STOPPED"),
            Self::Complete(path) => write!(f, "COMPLETE|{}", path.display()),
            Self::ErrorCode(code) => write!(f, "ERRORCODE|{}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hdr10_status_categories() {
        let complete = TaskResult::Success {
            output: String::new(),
            path: Some(PathBuf::from("/work/metadata.json")),
        };
        assert_eq!(Hdr10Status::from(&complete).to_string(), "COMPLETE|/work/metadata.json");
        assert_eq!(Hdr10Status::from(&TaskResult::Cancelled).to_string(), "STOPPED|STOPPED");
        assert_eq!(
            Hdr10Status::from(&TaskResult::NonZeroExit { code: 2, output: String::new() }).to_string(),
            "ERRORCODE|2"
        );
        assert_eq!(
            Hdr10Status::from(&TaskResult::Error("no ffmpeg".into())).to_string(),
            "ERROR|no ffmpeg"
        );
    }

    #[test]
    fn test_hdr10_status_only_for_hdr10_signals() {
        let signal = TaskSignal::new(TaskKind::Thumbnail, TaskResult::success(""));
        assert!(signal.hdr10_status().is_none());

        let signal = TaskSignal::new(TaskKind::Hdr10Extract, TaskResult::Cancelled);
        let status = signal.hdr10_status().unwrap();
        assert_eq!(status, Hdr10Status::Stopped);
    }

    #[test]
    fn test_output_accessor() {
        assert_eq!(TaskResult::success("done").output(), Some("done"));
        assert_eq!(TaskResult::NonZeroExit { code: 1, output: "bad".into() }.output(), Some("bad"));
        assert_eq!(TaskResult::Cancelled.output(), None);
    }

    #[test]
    fn test_signal_serializes_tagged() {
        let signal = TaskSignal::new(TaskKind::SubtitleExtract, TaskResult::NonZeroExit { code: 1, output: "x".into() });
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["kind"], "subtitle_extract");
        assert_eq!(json["result"]["status"], "non_zero_exit");
        assert_eq!(json["result"]["detail"]["code"], 1);
    }
}

//! # Subtitle Flag Fix Task
//!
//! Modifica in place il container con mkvpropedit per togliere il flag
//! "default" dalla traccia sottotitoli `s1`.

use crate::command::ToolCommand;
use crate::executor::BackgroundTask;
use crate::log::LogSink;
use crate::process_runner::ProcessRunner;
use crate::signal::{TaskKind, TaskResult};
use crate::utils::normalize_separators;
use std::path::PathBuf;

pub struct SubtitleFixTask {
    mkvpropedit: PathBuf,
    video_path: PathBuf,
    runner: ProcessRunner,
}

impl SubtitleFixTask {
    pub fn new(mkvpropedit: impl Into<PathBuf>, video_path: impl Into<PathBuf>) -> Self {
        Self {
            mkvpropedit: mkvpropedit.into(),
            video_path: video_path.into(),
            runner: ProcessRunner::new(),
        }
    }

    pub fn command(&self) -> ToolCommand {
        ToolCommand::new(&self.mkvpropedit)
            .arg(normalize_separators(&self.video_path))
            .args(["--edit", "track:s1", "--set", "flag-default=0"])
    }
}

impl BackgroundTask for SubtitleFixTask {
    fn kind(&self) -> TaskKind {
        TaskKind::SubtitleFix
    }

    fn run(&mut self, log: &LogSink) -> TaskResult {
        log.info("Will fix first subtitle track to not be default");

        let result = self.runner.run(&self.command());
        match &result {
            TaskResult::Error(message) => {
                log.error(format!("Could not fix first subtitle track - {}", message))
            }
            TaskResult::NonZeroExit { output, .. } => {
                log.warning(format!("Could not fix first subtitle track: {}", output))
            }
            TaskResult::Success { .. } | TaskResult::Cancelled => {}
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Invocation;

    #[test]
    fn test_backslashes_normalized_before_edit_args() {
        let task = SubtitleFixTask::new("mkvpropedit", r"D:\Encodes\Show\episode 01.mkv");

        match task.command().invocation() {
            Invocation::Exec { program, args } => {
                assert_eq!(program, &PathBuf::from("mkvpropedit"));
                assert_eq!(
                    args,
                    &[
                        "D:/Encodes/Show/episode 01.mkv",
                        "--edit",
                        "track:s1",
                        "--set",
                        "flag-default=0",
                    ]
                );
            }
            other => panic!("unexpected invocation: {:?}", other),
        }
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::log::LogLevel;
        use crate::tasks::test_support::{drain, fake_tool};
        use tempfile::TempDir;

        #[test]
        fn test_tool_receives_normalized_path() {
            let temp_dir = TempDir::new().unwrap();
            let tool = fake_tool(temp_dir.path(), "mkvpropedit", r#"printf '%s|' "$@"; exit 2"#);

            let (log, mut rx) = LogSink::channel();
            let result = SubtitleFixTask::new(tool, r"videos\out.mkv").run(&log);

            assert_eq!(
                result,
                TaskResult::NonZeroExit {
                    code: 2,
                    output: "videos/out.mkv|--edit|track:s1|--set|flag-default=0|".to_string(),
                }
            );

            let messages = drain(&mut rx);
            assert_eq!(messages[0].level, LogLevel::Info);
            assert_eq!(messages[1].level, LogLevel::Warning);
            assert!(messages[1].text.starts_with("Could not fix first subtitle track: videos/out.mkv|"));
        }

        #[test]
        fn test_missing_tool_logs_error() {
            let (log, mut rx) = LogSink::channel();
            let result = SubtitleFixTask::new("/nonexistent/mkvpropedit", "out.mkv").run(&log);

            assert!(matches!(result, TaskResult::Error(_)));
            let messages = drain(&mut rx);
            assert_eq!(messages[1].level, LogLevel::Error);
            assert!(messages[1].text.starts_with("Could not fix first subtitle track - "));
        }
    }
}

//! # Subtitle Extract Task
//!
//! Estrae una traccia sottotitoli (per indice di stream) dal sorgente del video
//! corrente in un file SRT accanto al video di output: `<output>.<indice>.srt`.
//! Senza un video di output valido il task termina con un errore, senza lanciare ffmpeg.

use crate::args;
use crate::command::ToolCommand;
use crate::config::ToolPaths;
use crate::error::TaskError;
use crate::executor::BackgroundTask;
use crate::log::LogSink;
use crate::process_runner::ProcessRunner;
use crate::signal::{TaskKind, TaskResult};
use crate::utils::normalize_separators;
use crate::video::VideoSnapshot;
use std::path::{Path, PathBuf};

pub struct SubtitleExtractTask {
    ffmpeg: PathBuf,
    input: PathBuf,
    output_video: Option<PathBuf>,
    index: u32,
    runner: ProcessRunner,
}

impl SubtitleExtractTask {
    /// Extract stream `index` of `video.source` next to `video.output_video`
    pub fn new(tools: &ToolPaths, video: &VideoSnapshot, index: u32) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            input: video.source.clone(),
            output_video: video.output_video.clone(),
            index,
            runner: ProcessRunner::new(),
        }
    }

    /// `<dir of output>/<file name of output>.<index>.srt`, or `None` when the
    /// output path has no file name (`""`, `..`, `/`)
    pub fn subtitle_path(output_video: &Path, index: u32) -> Option<PathBuf> {
        let file_name = output_video.file_name()?;
        let parent = output_video.parent().unwrap_or(Path::new(""));
        Some(parent.join(format!("{}.{}.srt", file_name.to_string_lossy(), index)))
    }

    /// Sidecar file name as handed to ffmpeg
    pub fn output_file(&self) -> Result<String, TaskError> {
        let output_video = self
            .output_video
            .as_deref()
            .ok_or_else(|| TaskError::OutputPath("no output video selected".to_string()))?;

        let path = Self::subtitle_path(output_video, self.index).ok_or_else(|| {
            TaskError::OutputPath(format!("{} has no file name", output_video.display()))
        })?;

        Ok(normalize_separators(&path))
    }

    pub fn command(&self) -> Result<ToolCommand, TaskError> {
        Ok(self.command_for(self.output_file()?))
    }

    fn command_for(&self, output_file: String) -> ToolCommand {
        ToolCommand::new(&self.ffmpeg).args(args![
            "-y",
            "-i",
            self.input.to_string_lossy(),
            "-map",
            format!("0:{}", self.index),
            "-c",
            "srt",
            "-f",
            "srt",
            output_file,
        ])
    }
}

impl BackgroundTask for SubtitleExtractTask {
    fn kind(&self) -> TaskKind {
        TaskKind::SubtitleExtract
    }

    fn run(&mut self, log: &LogSink) -> TaskResult {
        let filename = match self.output_file() {
            Ok(filename) => filename,
            Err(err) => {
                log.error(format!("Could not extract subtitle track {} - {}", self.index, err));
                return TaskResult::Error(err.to_string());
            }
        };
        log.info(format!("Extracting subtitles to {}", filename));

        match self.runner.run(&self.command_for(filename.clone())) {
            TaskResult::Success { output, .. } => {
                log.info("Extracted subtitles successfully");
                TaskResult::Success {
                    output,
                    path: Some(PathBuf::from(filename)),
                }
            }
            TaskResult::NonZeroExit { code, output } => {
                log.warning(format!("Could not extract subtitle track {}: {}", self.index, output));
                TaskResult::NonZeroExit { code, output }
            }
            TaskResult::Error(message) => {
                log.error(format!("Could not extract subtitle track {} - {}", self.index, message));
                TaskResult::Error(message)
            }
            TaskResult::Cancelled => TaskResult::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Invocation;
    use crate::log::LogLevel;

    fn video(output: &str) -> VideoSnapshot {
        VideoSnapshot::new("/media/in.mkv", "/tmp/work/in").with_output(output)
    }

    #[test]
    fn test_sidecar_path_next_to_output() {
        assert_eq!(
            SubtitleExtractTask::subtitle_path(Path::new("/encodes/movie.mkv"), 3),
            Some(PathBuf::from("/encodes/movie.mkv.3.srt"))
        );
        assert_eq!(
            SubtitleExtractTask::subtitle_path(Path::new("movie.mkv"), 0),
            Some(PathBuf::from("movie.mkv.0.srt"))
        );
        assert_eq!(
            SubtitleExtractTask::subtitle_path(Path::new("out/sub dir/movie.mp4"), 12),
            Some(PathBuf::from("out/sub dir/movie.mp4.12.srt"))
        );
    }

    #[test]
    fn test_output_without_file_name_has_no_sidecar() {
        for output in ["", "..", "/", "encodes/.."] {
            assert_eq!(SubtitleExtractTask::subtitle_path(Path::new(output), 1), None, "{output:?}");
        }
    }

    #[test]
    fn test_ffmpeg_arguments() {
        let task = SubtitleExtractTask::new(&ToolPaths::default(), &video("/encodes/out.mkv"), 4);
        match task.command().unwrap().invocation() {
            Invocation::Exec { program, args } => {
                assert_eq!(program, Path::new("ffmpeg"));
                assert_eq!(
                    args,
                    &[
                        "-y",
                        "-i",
                        "/media/in.mkv",
                        "-map",
                        "0:4",
                        "-c",
                        "srt",
                        "-f",
                        "srt",
                        "/encodes/out.mkv.4.srt",
                    ]
                );
            }
            other => panic!("unexpected invocation: {:?}", other),
        }
    }

    #[test]
    fn test_missing_output_video_is_error_without_launch() {
        let tools = ToolPaths {
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
            ..Default::default()
        };
        let video = VideoSnapshot::new("/media/in.mkv", "/tmp/work/in");

        let (log, mut rx) = LogSink::channel();
        let result = SubtitleExtractTask::new(&tools, &video, 2).run(&log);

        assert_eq!(
            result,
            TaskResult::Error("Invalid output path: no output video selected".to_string())
        );
        let message = rx.try_recv().unwrap();
        assert_eq!(message.level, LogLevel::Error);
        assert_eq!(
            message.text,
            "Could not extract subtitle track 2 - Invalid output path: no output video selected"
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_output_without_file_name_is_error() {
        let (log, mut rx) = LogSink::channel();
        let result = SubtitleExtractTask::new(&ToolPaths::default(), &video(".."), 5).run(&log);

        match result {
            TaskResult::Error(message) => assert_eq!(message, "Invalid output path: .. has no file name"),
            other => panic!("expected error, got {:?}", other),
        }
        assert_eq!(rx.try_recv().unwrap().level, LogLevel::Error);
        assert!(rx.try_recv().is_err());
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::tasks::test_support::{drain, fake_tool};
        use tempfile::TempDir;

        const FAKE_FFMPEG: &str = r#"for last; do :; done
printf '1\n00:00:01,000 --> 00:00:02,000\nHello\n' > "$last""#;

        fn tools(ffmpeg: PathBuf) -> ToolPaths {
            ToolPaths {
                ffmpeg,
                ..Default::default()
            }
        }

        #[test]
        fn test_extraction_writes_sidecar() {
            let temp_dir = TempDir::new().unwrap();
            let ffmpeg = fake_tool(temp_dir.path(), "ffmpeg", FAKE_FFMPEG);
            let video = VideoSnapshot::new("in.mkv", temp_dir.path().join("work"))
                .with_output(temp_dir.path().join("out.mkv"));

            let (log, mut rx) = LogSink::channel();
            let result = SubtitleExtractTask::new(&tools(ffmpeg), &video, 2).run(&log);

            let expected = temp_dir.path().join("out.mkv.2.srt");
            assert_eq!(
                result,
                TaskResult::Success {
                    output: String::new(),
                    path: Some(expected.clone()),
                }
            );
            assert!(std::fs::read_to_string(&expected).unwrap().contains("Hello"));

            let messages = drain(&mut rx);
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0].text, format!("Extracting subtitles to {}", expected.display()));
            assert_eq!(messages[1].text, "Extracted subtitles successfully");
        }

        #[test]
        fn test_failed_extraction_is_warning() {
            let temp_dir = TempDir::new().unwrap();
            let ffmpeg = fake_tool(temp_dir.path(), "ffmpeg", "echo 'Stream map matches no streams'; exit 1");

            let (log, mut rx) = LogSink::channel();
            let result = SubtitleExtractTask::new(&tools(ffmpeg), &video("out.mkv"), 9).run(&log);

            assert!(matches!(result, TaskResult::NonZeroExit { code: 1, .. }));
            let messages = drain(&mut rx);
            assert_eq!(messages[1].level, LogLevel::Warning);
            assert_eq!(
                messages[1].text,
                "Could not extract subtitle track 9: Stream map matches no streams\n"
            );
        }

        #[test]
        fn test_missing_ffmpeg_is_error() {
            let ffmpeg = PathBuf::from("/nonexistent/ffmpeg");

            let (log, mut rx) = LogSink::channel();
            let result = SubtitleExtractTask::new(&tools(ffmpeg), &video("out.mkv"), 1).run(&log);

            assert!(matches!(result, TaskResult::Error(_)));
            let messages = drain(&mut rx);
            assert_eq!(messages[1].level, LogLevel::Error);
            assert!(messages[1].text.starts_with("Could not extract subtitle track 1 - "));
        }
    }
}

//! # HDR10+ Metadata Extraction Task
//!
//! Pipeline a due stage:
//! 1. ffmpeg rimuxa la traccia video selezionata in un elementary stream HEVC
//!    (bitstream filter `hevc_mp4toannexb`) scritto su stdout
//! 2. hdr10plus_parser legge lo stream da stdin e scrive `metadata.json`
//!    nella work directory del video
//!
//! Lo stdout del parser finisce nel log a livello DEBUG, lo stderr (se presente) a ERROR.
//! La cancellazione passa da un `CancelHandle` preso prima della sottomissione.

use crate::args;
use crate::command::ToolCommand;
use crate::config::ToolPaths;
use crate::executor::BackgroundTask;
use crate::log::LogSink;
use crate::pipeline_runner::{CancelHandle, Pipeline, PipelineRunner};
use crate::signal::{TaskKind, TaskResult};
use crate::utils::normalize_separators;
use crate::video::VideoSnapshot;
use std::path::PathBuf;

pub const METADATA_FILE: &str = "metadata.json";

pub struct Hdr10ExtractTask {
    ffmpeg: PathBuf,
    parser: PathBuf,
    video: VideoSnapshot,
    runner: PipelineRunner,
}

impl Hdr10ExtractTask {
    /// `log` receives errors raised while cancelling
    pub fn new(tools: &ToolPaths, video: VideoSnapshot, log: LogSink) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            parser: tools.hdr10plus_parser.clone(),
            video,
            runner: PipelineRunner::new(log),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.runner.cancel_handle()
    }

    pub fn output_path(&self) -> PathBuf {
        self.video.work_path.join(METADATA_FILE)
    }

    pub fn pipeline(&self) -> Pipeline {
        let remux = ToolCommand::new(&self.ffmpeg).args(args![
            "-y",
            "-i",
            normalize_separators(&self.video.source),
            "-map",
            format!("0:{}", self.video.selected_track),
            "-loglevel",
            "panic",
            "-c:v",
            "copy",
            "-vbsf",
            "hevc_mp4toannexb",
            "-f",
            "hevc",
            "-",
        ]);

        let parse = ToolCommand::new(&self.parser).args(args![
            "-o",
            normalize_separators(&self.output_path()),
            "-",
        ]);

        Pipeline::new(remux, parse)
            .working_dir(&self.video.work_path)
            .output_path(self.output_path())
    }
}

impl BackgroundTask for Hdr10ExtractTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Hdr10Extract
    }

    fn run(&mut self, log: &LogSink) -> TaskResult {
        let output = self.output_path();
        log.info(format!("Extracting HDR10+ metadata to {}", output.display()));

        if let Err(err) = std::fs::create_dir_all(&self.video.work_path) {
            let message = format!("Could not create {}: {}", self.video.work_path.display(), err);
            log.error(format!("HDR10+ Extract error: {}", message));
            return TaskResult::Error(message);
        }

        let (result, captured) = self.runner.run_captured(&self.pipeline());
        match &result {
            TaskResult::Error(message) => log.error(format!("HDR10+ Extract error: {}", message)),
            TaskResult::Success { .. } | TaskResult::NonZeroExit { .. } => {
                log.debug(format!("HDR10+ Extract output: {}", captured.stdout));
                // the parser reports problems on stderr even when it exits 0
                if !captured.stderr.is_empty() {
                    log.error(format!("HDR10+ Extract error: {}", captured.stderr.trim_end()));
                }
            }
            TaskResult::Cancelled => {}
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Invocation;
    use std::path::Path;

    fn video() -> VideoSnapshot {
        VideoSnapshot::new(r"C:\Media\film.mkv", "/tmp/work/film").with_track(1)
    }

    #[test]
    fn test_pipeline_commands() {
        let task = Hdr10ExtractTask::new(&ToolPaths::default(), video(), LogSink::tracing_only());
        let pipeline = task.pipeline();

        match pipeline.first().invocation() {
            Invocation::Exec { program, args } => {
                assert_eq!(program, Path::new("ffmpeg"));
                assert_eq!(
                    args,
                    &[
                        "-y", "-i", "C:/Media/film.mkv", "-map", "0:1", "-loglevel", "panic",
                        "-c:v", "copy", "-vbsf", "hevc_mp4toannexb", "-f", "hevc", "-",
                    ]
                );
            }
            other => panic!("unexpected invocation: {:?}", other),
        }

        match pipeline.second().invocation() {
            Invocation::Exec { program, args } => {
                assert_eq!(program, Path::new("hdr10plus_parser"));
                assert_eq!(args, &["-o", "/tmp/work/film/metadata.json", "-"]);
            }
            other => panic!("unexpected invocation: {:?}", other),
        }
        assert_eq!(pipeline.second().working_dir(), Some(Path::new("/tmp/work/film")));
        assert_eq!(task.output_path(), PathBuf::from("/tmp/work/film/metadata.json"));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::executor::{TaskExecutor, ThreadExecutor};
        use crate::log::{LogLevel, LogMessage};
        use crate::signal::Hdr10Status;
        use crate::tasks::test_support::{drain, fake_tool};
        use std::time::{Duration, Instant};
        use tempfile::TempDir;

        fn tools(dir: &Path, ffmpeg_body: &str, parser_body: &str) -> ToolPaths {
            ToolPaths {
                ffmpeg: fake_tool(dir, "ffmpeg", ffmpeg_body),
                hdr10plus_parser: fake_tool(dir, "hdr10plus_parser", parser_body),
                ..Default::default()
            }
        }

        #[test]
        fn test_metadata_written_to_work_dir() {
            let temp_dir = TempDir::new().unwrap();
            let tools = tools(
                temp_dir.path(),
                "printf 'annexb-bytes'",
                r#"cat > stream.hevc; printf '{"frames":1}' > "$2"; printf 'Parsing done'"#,
            );
            let work_path = temp_dir.path().join("work").join("film");
            let video = VideoSnapshot::new("film.mkv", &work_path);

            let (log, mut rx) = LogSink::channel();
            let mut task = Hdr10ExtractTask::new(&tools, video, log.clone());
            let result = task.run(&log);

            let metadata = work_path.join(METADATA_FILE);
            assert_eq!(
                result,
                TaskResult::Success {
                    output: "Parsing done".to_string(),
                    path: Some(metadata.clone()),
                }
            );
            assert_eq!(std::fs::read_to_string(&metadata).unwrap(), r#"{"frames":1}"#);
            // parser ran inside the work directory
            assert_eq!(std::fs::read_to_string(work_path.join("stream.hevc")).unwrap(), "annexb-bytes");

            let messages = drain(&mut rx);
            assert_eq!(messages[0].level, LogLevel::Info);
            assert_eq!(messages.last().unwrap().level, LogLevel::Debug);
            assert_eq!(messages.last().unwrap().text, "HDR10+ Extract output: Parsing done");
        }

        #[test]
        fn test_parser_stderr_logged_as_error() {
            let temp_dir = TempDir::new().unwrap();
            let tools = tools(
                temp_dir.path(),
                "printf x",
                "cat > /dev/null; printf 'Parsing...\n'; printf 'File does not contain HDR10+ metadata\n' >&2",
            );
            let video = VideoSnapshot::new("film.mkv", temp_dir.path().join("w"));

            let (log, mut rx) = LogSink::channel();
            let mut task = Hdr10ExtractTask::new(&tools, video, log.clone());
            let result = task.run(&log);

            assert_eq!(
                result.output(),
                Some("Parsing...\nFile does not contain HDR10+ metadata\n")
            );

            let messages = drain(&mut rx);
            assert_eq!(messages.len(), 3);
            assert_eq!(messages[1], LogMessage::new(LogLevel::Debug, "HDR10+ Extract output: Parsing...\n"));
            assert_eq!(
                messages[2],
                LogMessage::new(LogLevel::Error, "HDR10+ Extract error: File does not contain HDR10+ metadata")
            );
        }

        #[test]
        fn test_parser_failure_reports_error_code() {
            let temp_dir = TempDir::new().unwrap();
            let tools = tools(temp_dir.path(), "printf x", "cat > /dev/null; exit 3");
            let video = VideoSnapshot::new("film.mkv", temp_dir.path().join("w"));

            let executor = ThreadExecutor::new(LogSink::tracing_only());
            let task = Hdr10ExtractTask::new(&tools, video, LogSink::tracing_only());
            let signal = executor.submit(task).wait();

            assert_eq!(signal.hdr10_status(), Some(Hdr10Status::ErrorCode(3)));
        }

        #[test]
        fn test_cancel_stops_extraction() {
            let temp_dir = TempDir::new().unwrap();
            let tools = tools(temp_dir.path(), "exec sleep 30", "exec sleep 30");
            let video = VideoSnapshot::new("film.mkv", temp_dir.path().join("w"));

            let executor = ThreadExecutor::new(LogSink::tracing_only());
            let task = Hdr10ExtractTask::new(&tools, video, LogSink::tracing_only());
            let cancel = task.cancel_handle();

            let start = Instant::now();
            let handle = executor.submit(task);
            std::thread::sleep(Duration::from_millis(300));
            cancel.cancel();

            let signal = handle.wait();
            assert_eq!(signal.hdr10_status(), Some(Hdr10Status::Stopped));
            assert_eq!(signal.hdr10_status().unwrap().to_string(), "STOPPED|STOPPED");
            assert!(start.elapsed() < Duration::from_secs(10));

            // late cancel after the signal went out changes nothing
            cancel.cancel();
        }

        #[test]
        fn test_missing_ffmpeg_is_error_signal() {
            let temp_dir = TempDir::new().unwrap();
            let tools = ToolPaths {
                ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
                ..Default::default()
            };
            let video = VideoSnapshot::new("film.mkv", temp_dir.path().join("w"));

            let (log, mut rx) = LogSink::channel();
            let mut task = Hdr10ExtractTask::new(&tools, video, log.clone());
            let result = task.run(&log);

            match Hdr10Status::from(&result) {
                Hdr10Status::Error(message) => assert!(message.contains("/nonexistent/ffmpeg")),
                other => panic!("expected error status, got {}", other),
            }
            let messages = drain(&mut rx);
            assert_eq!(messages[1].level, LogLevel::Error);
            assert!(messages[1].text.starts_with("HDR10+ Extract error: "));
        }
    }
}

//! # Thumbnail Task
//!
//! Esegue una command line shell opaca (costruita a monte) che genera la thumbnail.
//! Un ffmpeg senza il filtro `zscale` viene riconosciuto dall'output e
//! segnalato con un messaggio che spiega come aggiornare ffmpeg.

use crate::command::ToolCommand;
use crate::executor::BackgroundTask;
use crate::log::LogSink;
use crate::process_runner::ProcessRunner;
use crate::signal::{TaskKind, TaskResult};

/// What an FFmpeg built without zimg prints when asked for `zscale`
pub const OUTDATED_FILTER_MARKER: &str = "No such filter: 'zscale'";

pub const OUTDATED_FFMPEG_MESSAGE: &str = "Could not generate thumbnail because you are using an outdated FFmpeg! \
Please use FFmpeg 4.3+ built against the latest zimg libraries. \
Static builds available at https://ffmpeg.org/download.html \
(Linux distributions are often slow to update)";

pub struct ThumbnailTask {
    command: ToolCommand,
    runner: ProcessRunner,
}

impl ThumbnailTask {
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            command: ToolCommand::shell(command_line),
            runner: ProcessRunner::new(),
        }
    }

    pub fn command(&self) -> &ToolCommand {
        &self.command
    }
}

/// Message logged for a failed thumbnail run
pub fn failure_message(output: &str) -> String {
    if output.contains(OUTDATED_FILTER_MARKER) {
        OUTDATED_FFMPEG_MESSAGE.to_string()
    } else {
        format!("Could not generate thumbnail: {}", output)
    }
}

impl BackgroundTask for ThumbnailTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Thumbnail
    }

    fn run(&mut self, log: &LogSink) -> TaskResult {
        log.info(format!("Generating thumbnail: {}", self.command));

        let result = self.runner.run(&self.command);
        match &result {
            TaskResult::NonZeroExit { output, .. } => log.error(failure_message(output)),
            TaskResult::Error(message) => log.error(format!("Could not generate thumbnail: {}", message)),
            TaskResult::Success { .. } | TaskResult::Cancelled => {}
        }

        result
    }
}

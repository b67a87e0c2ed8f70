//! # Pipeline Runner Module
//!
//! Due tool esterni collegati da uno stream di byte, con cancellazione cooperativa.
//!
//! ## Responsabilità:
//! - Lancia lo stage uno con stdout in pipe (stdin chiuso, stderr scartato)
//! - Lancia lo stage due con lo stdout dello stage uno come stdin
//! - Cattura stdout e stderr dello stage due su pipe separate, lette in parallelo
//! - Blocca fino alla terminazione dello stage due, poi raccoglie lo stage uno
//! - `cancel()` invocabile da un altro thread: termina stage due, poi stage uno.
//!   È un kill immediato (SIGKILL su unix), i tool non hanno modo di fare flush.
//!
//! ## Invarianti:
//! - Lo stdin dello stage due è esattamente lo stdout dello stage uno
//! - Dopo che `run` ritorna nessuno dei due processi è ancora vivo
//! - Se lo stage due non parte, lo stage uno viene terminato e raccolto
//! - Una cancellazione dopo il completamento non ha effetto
//!
//! ## Mappatura risultati:
//! - cancellato → `TaskResult::Cancelled` (exit code ignorati)
//! - stage due exit 0 → `TaskResult::Success` con `path = output_path`
//! - stage due exit K ≠ 0 → `TaskResult::NonZeroExit`
//! - in entrambi i casi `output` è lo stdout seguito dallo stderr; `run_captured`
//!   restituisce anche i due stream separati
//! - errore di setup → `TaskResult::Error`
//!
//! ## Esempio:
//! ```rust,ignore
//! let runner = PipelineRunner::new(log.clone());
//! let cancel = runner.cancel_handle();
//! std::thread::spawn(move || {
//!     let result = runner.run(&pipeline);
//! });
//! cancel.cancel(); // da qualsiasi thread
//! ```

use crate::command::ToolCommand;
use crate::error::TaskError;
use crate::log::LogSink;
use crate::signal::TaskResult;
use crate::utils::exit_code;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdout, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Producer/consumer pair plus where the consumer writes its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    first: ToolCommand,
    second: ToolCommand,
    output_path: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(first: ToolCommand, second: ToolCommand) -> Self {
        Self {
            first,
            second,
            output_path: None,
        }
    }

    /// Working directory of the consuming stage
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.second = self.second.current_dir(dir);
        self
    }

    /// File reported back on success
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn first(&self) -> &ToolCommand {
        &self.first
    }

    pub fn second(&self) -> &ToolCommand {
        &self.second
    }
}

/// What the consuming stage wrote, stream by stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutput {
    pub stdout: String,
    pub stderr: String,
}

impl StageOutput {
    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

struct StageStreams {
    stdout: ChildStdout,
    stderr: ChildStderr,
}

impl StageStreams {
    /// Read both streams to EOF; stderr on a scoped thread so neither pipe can fill up
    fn drain(self) -> io::Result<StageOutput> {
        let StageStreams { mut stdout, mut stderr } = self;

        thread::scope(|scope| {
            let errors = scope.spawn(move || {
                let mut buffer = Vec::new();
                stderr.read_to_end(&mut buffer).map(|_| buffer)
            });

            let mut buffer = Vec::new();
            let stdout_result = stdout.read_to_end(&mut buffer);
            let stderr_result = errors
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stderr reader panicked")));

            stdout_result?;
            Ok(StageOutput {
                stdout: String::from_utf8_lossy(&buffer).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_result?).into_owned(),
            })
        })
    }
}

#[derive(Debug, Default)]
struct PipelineState {
    first: Option<Child>,
    second: Option<Child>,
    cancelled: bool,
    finished: bool,
}

/// Drives one pipeline invocation. Clones share the same processes.
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    state: Arc<Mutex<PipelineState>>,
    log: LogSink,
}

impl PipelineRunner {
    pub fn new(log: LogSink) -> Self {
        Self {
            state: Arc::new(Mutex::new(PipelineState::default())),
            log,
        }
    }

    /// Run both stages and block until the consumer terminates
    pub fn run(&self, pipeline: &Pipeline) -> TaskResult {
        self.run_captured(pipeline).0
    }

    /// Like `run`, also returning the consumer's stdout and stderr separately.
    /// The streams are empty unless the consumer ran to a natural end.
    pub fn run_captured(&self, pipeline: &Pipeline) -> (TaskResult, StageOutput) {
        let streams = match self.start(pipeline) {
            Ok(Some(streams)) => streams,
            Ok(None) => {
                self.finish();
                return (TaskResult::Cancelled, StageOutput::default());
            }
            Err(err) => {
                self.finish();
                return (TaskResult::Error(err.to_string()), StageOutput::default());
            }
        };

        let captured = streams.drain();
        let status = self.wait_second();
        self.reap_first();

        if self.finish() {
            return (TaskResult::Cancelled, StageOutput::default());
        }

        let status = match status {
            Ok(status) => status,
            Err(err) => return (TaskResult::Error(err.to_string()), StageOutput::default()),
        };
        let captured = match captured {
            Ok(captured) => captured,
            Err(err) => return (TaskResult::Error(TaskError::from(err).to_string()), StageOutput::default()),
        };

        let output = captured.combined();
        let result = if status.success() {
            TaskResult::Success {
                output,
                path: pipeline.output_path.clone(),
            }
        } else {
            TaskResult::NonZeroExit {
                code: exit_code(status),
                output,
            }
        };
        (result, captured)
    }

    /// Terminate the consumer, then the producer. Safe to call any number of times.
    ///
    /// This is a hard kill (SIGKILL on unix, `TerminateProcess` on Windows): neither
    /// tool gets to flush or clean up, so a partial output file may be left behind.
    pub fn cancel(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.finished {
            debug!("Pipeline already finished, ignoring cancel");
            return;
        }
        if state.cancelled {
            return;
        }
        state.cancelled = true;

        for child in [state.second.as_mut(), state.first.as_mut()].into_iter().flatten() {
            if let Err(err) = child.kill() {
                self.log.error(err.to_string());
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// A handle that can only cancel, for the thread that does not run the pipeline
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            runner: self.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn both stages under the lock so a concurrent cancel sees either none or both.
    /// `Ok(None)` means the pipeline was cancelled before it started.
    fn start(&self, pipeline: &Pipeline) -> Result<Option<StageStreams>, TaskError> {
        let mut state = self.lock();
        if state.cancelled {
            return Ok(None);
        }

        debug!("Pipeline stage one: {}", pipeline.first);
        let mut process = pipeline.first.to_process();
        process
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        let mut first = process.spawn().map_err(|source| TaskError::Launch {
            program: pipeline.first.program_name(),
            source,
        })?;

        match Self::spawn_second(pipeline, &mut first) {
            Ok((second, streams)) => {
                state.first = Some(first);
                state.second = Some(second);
                Ok(Some(streams))
            }
            Err(err) => {
                debug!("Stage two failed to start, terminating stage one");
                let _ = first.kill();
                let _ = first.wait();
                Err(err)
            }
        }
    }

    fn spawn_second(pipeline: &Pipeline, first: &mut Child) -> Result<(Child, StageStreams), TaskError> {
        let stream = first
            .stdout
            .take()
            .ok_or_else(|| TaskError::Io(io::Error::other("stage one stdout was not captured")))?;

        debug!("Pipeline stage two: {}", pipeline.second);
        let mut process = pipeline.second.to_process();
        process
            .stdin(Stdio::from(stream))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = process.spawn().map_err(|source| TaskError::Launch {
            program: pipeline.second.program_name(),
            source,
        })?;

        match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => Ok((child, StageStreams { stdout, stderr })),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                Err(TaskError::Io(io::Error::other("stage two output was not captured")))
            }
        }
    }

    /// Poll instead of blocking in `wait` so `cancel` can take the lock meanwhile
    fn wait_second(&self) -> Result<ExitStatus, TaskError> {
        loop {
            {
                let mut state = self.lock();
                let child = state.second.as_mut().ok_or_else(|| {
                    TaskError::Io(io::Error::other("stage two is not running"))
                })?;
                if let Some(status) = child.try_wait()? {
                    state.second = None;
                    return Ok(status);
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// The consumer is gone, so whatever the producer still does is wasted
    fn reap_first(&self) {
        let first = self.lock().first.take();
        if let Some(mut first) = first {
            if !matches!(first.try_wait(), Ok(Some(_))) {
                debug!("Stage one still running after stage two exited, terminating");
                let _ = first.kill();
            }
            let _ = first.wait();
        }
    }

    /// Mark the invocation done; returns whether it was cancelled
    fn finish(&self) -> bool {
        let mut state = self.lock();
        state.finished = true;
        state.cancelled
    }

    #[cfg(test)]
    fn has_live_stages(&self) -> bool {
        let state = self.lock();
        state.first.is_some() || state.second.is_some()
    }
}

/// Cancels the pipeline of the runner it was taken from
#[derive(Debug, Clone)]
pub struct CancelHandle {
    runner: PipelineRunner,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.runner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.runner.is_cancelled()
    }
}

//! # Task Execution Module
//!
//! Contesto di esecuzione dei task in background.
//!
//! ## Responsabilità:
//! - `BackgroundTask`: un'unità di lavoro che gira su un worker e produce un `TaskResult`
//! - `TaskExecutor`: sottomissione fuori dal thread del chiamante
//! - `ThreadExecutor`: un thread dedicato (`task-<kind>`) per ogni invocazione
//! - `TaskHandle`: consegna esattamente un `TaskSignal`, anche se il worker va in panic
//!
//! ## Ordinamento:
//! Il segnale viene inviato solo dopo che `run` è ritornato, quindi dopo che
//! l'output dei processi è stato completamente letto. Tutti i messaggi di log
//! del task sono già nel canale quando il segnale arriva.
//!
//! ## Esempio:
//! ```rust,ignore
//! let (log, mut messages) = LogSink::channel();
//! let executor = ThreadExecutor::new(log);
//! let handle = executor.submit(ThumbnailTask::new(command_line));
//! let signal = handle.completion().await;
//! ```

use crate::log::LogSink;
use crate::signal::{TaskKind, TaskResult, TaskSignal};
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, error};

/// Work that runs on a worker thread and ends with one result
pub trait BackgroundTask: Send + 'static {
    fn kind(&self) -> TaskKind;

    /// Blocking body; runs off the caller's thread
    fn run(&mut self, log: &LogSink) -> TaskResult;
}

/// Starts tasks off the caller's thread
pub trait TaskExecutor {
    fn submit<T: BackgroundTask>(&self, task: T) -> TaskHandle;
}

/// One OS thread per submitted task
#[derive(Debug, Clone)]
pub struct ThreadExecutor {
    log: LogSink,
}

impl ThreadExecutor {
    pub fn new(log: LogSink) -> Self {
        Self { log }
    }
}

impl TaskExecutor for ThreadExecutor {
    fn submit<T: BackgroundTask>(&self, mut task: T) -> TaskHandle {
        let kind = task.kind();
        let (tx, rx) = oneshot::channel();
        let log = self.log.clone();

        let spawned = thread::Builder::new()
            .name(format!("task-{}", kind))
            .spawn(move || {
                let result = task.run(&log);
                debug!("Task {} finished: {}", kind, result);
                // Receiver dropped means nobody waits for this task anymore
                let _ = tx.send(TaskSignal::new(kind, result));
            });

        if let Err(err) = spawned {
            error!("Could not start worker thread for {}: {}", kind, err);
        }

        TaskHandle { kind, rx }
    }
}

/// Receiving side of a task's single completion notification
#[derive(Debug)]
pub struct TaskHandle {
    kind: TaskKind,
    rx: oneshot::Receiver<TaskSignal>,
}

impl TaskHandle {
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Await the terminal signal from async code
    pub async fn completion(self) -> TaskSignal {
        let kind = self.kind;
        match self.rx.await {
            Ok(signal) => signal,
            Err(_) => Self::lost(kind),
        }
    }

    /// Block the current thread until the terminal signal arrives.
    /// Must not be called from inside an async runtime.
    pub fn wait(self) -> TaskSignal {
        let kind = self.kind;
        match self.rx.blocking_recv() {
            Ok(signal) => signal,
            Err(_) => Self::lost(kind),
        }
    }

    fn lost(kind: TaskKind) -> TaskSignal {
        TaskSignal::new(
            kind,
            TaskResult::Error(format!("{} worker ended without reporting a result", kind)),
        )
    }
}

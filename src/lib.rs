//! # Transcode Tasks Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare della libreria
//! - Espone i tipi principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori (es. una GUI)
//!
//! ## Architettura dei moduli:
//! - `command`: Descrizione immutabile di una command line
//! - `process_runner`: Esecuzione sincrona di un tool con output combinato
//! - `pipeline_runner`: Due tool collegati da una pipe, con cancellazione
//! - `signal`: `TaskResult` e la notifica terminale `TaskSignal`
//! - `log`: Messaggi con severità inviati al listener
//! - `executor`: Un thread dedicato per ogni task, un segnale per invocazione
//! - `listener`: Attesa del segnale, stampa dei log e gestione delle interruzioni
//! - `tasks`: Thumbnail, fix sottotitoli, estrazione sottotitoli, estrazione HDR10+
//! - `config` / `tool_resolver`: Percorsi dei tool e loro risoluzione
//! - `video`: Snapshot del video corrente
//! - `debug_report`: Ispettore read-only dello stato
//! - `progress`: Spinner per la CLI
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use transcode_tasks::{LogSink, TaskExecutor, ThreadExecutor, ToolPaths, VideoSnapshot};
//! use transcode_tasks::tasks::SubtitleExtractTask;
//!
//! let (log, mut messages) = LogSink::channel();
//! let executor = ThreadExecutor::new(log);
//! let video = VideoSnapshot::new("in.mkv", "/tmp/work/in").with_output("out.mkv");
//! let handle = executor.submit(SubtitleExtractTask::new(&ToolPaths::default(), &video, 2));
//! let signal = handle.completion().await;
//! ```

pub mod command;
pub mod config;
pub mod debug_report;
pub mod error;
pub mod executor;
pub mod listener;
pub mod log;
pub mod pipeline_runner;
pub mod process_runner;
pub mod progress;
pub mod signal;
pub mod tasks;
pub mod tool_resolver;
pub mod utils;
pub mod video;

pub use command::ToolCommand;
pub use config::{Config, ToolPaths};
pub use error::TaskError;
pub use executor::{BackgroundTask, TaskExecutor, TaskHandle, ThreadExecutor};
pub use log::{LogLevel, LogMessage, LogSink};
pub use pipeline_runner::{CancelHandle, Pipeline, PipelineRunner, StageOutput};
pub use process_runner::ProcessRunner;
pub use signal::{Hdr10Status, TaskKind, TaskResult, TaskSignal};
pub use video::VideoSnapshot;

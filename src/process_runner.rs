//! # Process Runner Module
//!
//! Esecuzione sincrona di un singolo tool esterno.
//!
//! ## Responsabilità:
//! - Lancia il comando con stdin chiuso (il device null), così un tool che
//!   prova a leggere input interattivo non blocca il worker
//! - Unisce stderr in stdout su un'unica pipe del sistema operativo
//! - Blocca il thread chiamante fino all'uscita del processo
//! - Decodifica l'output in modo lossy (byte non validi sostituiti)
//!
//! ## Mappatura risultati:
//! - exit 0 → `TaskResult::Success` con l'output catturato
//! - exit K ≠ 0 → `TaskResult::NonZeroExit { code: K, output }`
//! - lancio fallito → `TaskResult::Error(messaggio)`
//!
//! ## Esempio:
//! ```rust,no_run
//! use transcode_tasks::command::ToolCommand;
//! use transcode_tasks::process_runner::ProcessRunner;
//!
//! let result = ProcessRunner::new().run(&ToolCommand::new("ffmpeg").arg("-version"));
//! println!("{}", result);
//! ```

use crate::command::ToolCommand;
use crate::error::TaskError;
use crate::signal::TaskResult;
use crate::utils::exit_code;
use std::io::Read;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tracing::debug;

/// Runs one external command to completion on the calling thread
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `command`, never failing: every problem is folded into the result
    pub fn run(&self, command: &ToolCommand) -> TaskResult {
        match self.execute(command) {
            Ok((status, output)) if status.success() => TaskResult::success(output),
            Ok((status, output)) => TaskResult::NonZeroExit {
                code: exit_code(status),
                output,
            },
            Err(err) => TaskResult::Error(err.to_string()),
        }
    }

    /// Spawn, drain the merged output pipe, then reap the child
    pub fn execute(&self, command: &ToolCommand) -> Result<(ExitStatus, String), TaskError> {
        debug!("Running: {}", command);
        let start_time = Instant::now();

        let (mut reader, writer) = std::io::pipe()?;
        let mut process = command.to_process();
        process
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);

        let mut child = process.spawn().map_err(|source| TaskError::Launch {
            program: command.program_name(),
            source,
        })?;
        // The Command still owns the write ends; EOF only arrives once they are gone
        drop(process);

        let mut buffer = Vec::new();
        let read_result = reader.read_to_end(&mut buffer);
        let status = child.wait()?;
        read_result?;

        debug!(
            "{} finished in {:.1}s with status {}",
            command.program_name(),
            start_time.elapsed().as_secs_f64(),
            status
        );

        Ok((status, String::from_utf8_lossy(&buffer).into_owned()))
    }
}

//! # Task Progress Module
//!
//! Spinner `indicatif` mostrato dal listener della CLI mentre un task è in corso.
//!
//! ## Responsabilità:
//! - Spinner animato con il nome del task per operazioni di durata indeterminata
//! - Stampa dei messaggi di log sopra lo spinner senza romperne il rendering
//! - Con lo spinner nascosto (`--json`, stderr non è un terminale) i messaggi
//!   vanno direttamente su stderr
//! - Messaggio finale con l'esito del `TaskSignal`
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] hdr10-extract running...
//! ```

use crate::signal::{TaskResult, TaskSignal};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

/// Spinner for one running task
#[derive(Clone)]
pub struct TaskSpinner {
    bar: ProgressBar,
}

impl TaskSpinner {
    pub fn new(task_name: &str) -> Self {
        let bar = ProgressBar::new_spinner();

        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(format!("{} running...", task_name));
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A spinner that draws nothing, for `--json` output
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Print a line above the spinner, or plainly on stderr when nothing is drawn
    pub fn println(&self, line: impl AsRef<str>) {
        self.println_to(&mut io::stderr().lock(), line.as_ref());
    }

    /// indicatif drops `println` on a hidden bar
    fn println_to(&self, out: &mut impl Write, line: &str) {
        if self.bar.is_hidden() {
            let _ = writeln!(out, "{}", line);
        } else {
            self.bar.println(line);
        }
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub fn finish(&self, signal: &TaskSignal) {
        self.bar.finish_with_message(summary(signal));
    }
}

/// One-line outcome of a task
pub fn summary(signal: &TaskSignal) -> String {
    let symbol = match signal.result {
        TaskResult::Success { .. } => "✅",
        TaskResult::Cancelled => "⏹",
        TaskResult::Error(_) | TaskResult::NonZeroExit { .. } => "❌",
    };
    format!("{} {} {}", symbol, signal.kind, signal.result)
}

//! # Task Listener Module
//!
//! Lato "listener" di un task: riceve i messaggi di log e l'unico `TaskSignal`.
//!
//! ## Responsabilità:
//! - Stampa ogni `LogMessage` (`LEVEL:testo`) tramite lo spinner
//! - Attende il segnale terminale e drena i messaggi rimasti in coda
//! - Gestisce le interruzioni (Ctrl-C inoltrati dal main):
//!   - prima interruzione con un `CancelHandle` → cancella la pipeline e continua ad attendere
//!   - seconda interruzione, o task non cancellabile → `ListenOutcome::Interrupted`
//!
//! Le interruzioni arrivano su un canale, così il listener non installa da solo
//! alcun signal handler.

use crate::executor::TaskHandle;
use crate::log::LogMessage;
use crate::pipeline_runner::CancelHandle;
use crate::progress::TaskSpinner;
use crate::signal::TaskSignal;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

/// Exit code of a process stopped by SIGINT
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

/// How listening to one task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    /// The task delivered its signal
    Finished(TaskSignal),
    /// The user gave up before the signal arrived
    Interrupted,
}

/// Drain log messages until the task's single signal arrives
pub async fn listen(
    handle: TaskHandle,
    messages: &mut UnboundedReceiver<LogMessage>,
    interrupts: &mut UnboundedReceiver<()>,
    spinner: &TaskSpinner,
    cancel: Option<&CancelHandle>,
) -> ListenOutcome {
    let completion = handle.completion();
    tokio::pin!(completion);
    let mut cancel_requested = false;

    let signal = loop {
        // Interrupts first: a pending Ctrl-C must never lose the race against completion
        tokio::select! {
            biased;

            Some(()) = interrupts.recv() => match cancel {
                Some(cancel) if !cancel_requested => {
                    cancel_requested = true;
                    info!("Cancelling... press Ctrl-C again to quit immediately");
                    spinner.set_message("cancelling...");
                    cancel.cancel();
                }
                _ => {
                    warn!("Interrupted before the task finished");
                    drain(messages, spinner);
                    return ListenOutcome::Interrupted;
                }
            },
            signal = &mut completion => break signal,
            Some(message) = messages.recv() => spinner.println(message.to_string()),
        }
    };

    // Everything the task logged was queued before its signal
    drain(messages, spinner);
    ListenOutcome::Finished(signal)
}

fn drain(messages: &mut UnboundedReceiver<LogMessage>, spinner: &TaskSpinner) {
    while let Ok(message) = messages.try_recv() {
        spinner.println(message.to_string());
    }
}

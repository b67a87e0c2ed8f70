//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore interni della libreria.
//!
//! ## Responsabilità:
//! - Definisce `TaskError` per categorizzare gli errori dei helper fallibili
//! - Integra con `thiserror` per automatic error conversion
//! - Gli errori non superano mai il confine di un task: vengono convertiti
//!   in `TaskResult::Error` dal runner o dal task che li riceve
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (pipe, wait, file)
//! - `Launch`: Il tool esterno non è partito (binario mancante, permessi)
//! - `Config`: Configurazione non valida
//! - `MissingDependency`: Tool esterno non trovato nel PATH
//! - `OutputPath`: Percorso di output mancante o senza nome file
//! - `Report`: Errore di serializzazione del debug report
//!
//! ## Esempio:
//! ```rust,ignore
//! let child = cmd.spawn().map_err(|source| TaskError::Launch {
//!     program: "ffmpeg".to_string(),
//!     source,
//! })?;
//! ```

/// Internal error type for process and task plumbing
#[derive(thiserror::Error, Debug)]
pub enum TaskError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not start {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Invalid output path: {0}")]
    OutputPath(String),

    #[error("Report rendering error: {0}")]
    Report(#[from] serde_json::Error),
}

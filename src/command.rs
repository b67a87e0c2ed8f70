//! # Command Line Module
//!
//! Descrizione immutabile di un'invocazione di un tool esterno.
//!
//! ## Responsabilità:
//! - `ToolCommand`: programma + argomenti, oppure una stringa shell opaca
//! - Working directory opzionale
//! - Conversione in `std::process::Command` al momento del lancio
//! - Rendering leggibile per il logging
//!
//! ## Esempio:
//! ```rust
//! use transcode_tasks::command::ToolCommand;
//!
//! let cmd = ToolCommand::new("ffmpeg").args(["-y", "-i", "input.mkv"]);
//! assert_eq!(cmd.to_string(), "ffmpeg -y -i input.mkv");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// How the command is handed to the operating system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Program path plus argument vector, no shell involved
    Exec { program: PathBuf, args: Vec<String> },
    /// A single string interpreted by the platform shell
    Shell(String),
}

/// One external command line, immutable once handed to a runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    invocation: Invocation,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Start an argument-vector command for `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            invocation: Invocation::Exec {
                program: program.into(),
                args: Vec::new(),
            },
            current_dir: None,
        }
    }

    /// A pre-built command string run through `sh -c` (or `cmd /C` on Windows)
    pub fn shell(line: impl Into<String>) -> Self {
        Self {
            invocation: Invocation::Shell(line.into()),
            current_dir: None,
        }
    }

    /// Append one argument. Ignored for shell commands.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        if let Invocation::Exec { ref mut args, .. } = self.invocation {
            args.push(arg.into());
        }
        self
    }

    /// Append several arguments. Ignored for shell commands.
    pub fn args<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Invocation::Exec { ref mut args, .. } = self.invocation {
            args.extend(items.into_iter().map(Into::into));
        }
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Name used in log and error messages
    pub fn program_name(&self) -> String {
        match &self.invocation {
            Invocation::Exec { program, .. } => program.to_string_lossy().to_string(),
            Invocation::Shell(_) => shell_program().to_string(),
        }
    }

    /// Build the `std::process::Command`; stdio is left to the runner
    pub fn to_process(&self) -> Command {
        let mut cmd = match &self.invocation {
            Invocation::Exec { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            Invocation::Shell(line) => {
                let mut cmd = Command::new(shell_program());
                cmd.arg(shell_flag()).arg(line);
                cmd
            }
        };

        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        cmd
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.invocation {
            Invocation::Exec { program, args } => {
                write!(f, "{}", program.display())?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
            Invocation::Shell(line) => write!(f, "{}", line),
        }
    }
}

fn shell_program() -> &'static str {
    if cfg!(windows) {
        "cmd"
    } else {
        "sh"
    }
}

fn shell_flag() -> &'static str {
    if cfg!(windows) {
        "/C"
    } else {
        "-c"
    }
}

//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione dei tool esterni.
//!
//! ## Responsabilità:
//! - Definisce `ToolPaths` con i percorsi di ffmpeg, ffprobe, mkvpropedit e hdr10plus_parser
//! - Definisce `Config` con i tool e la work directory dei video
//! - Validazione dei parametri
//! - Caricamento da file JSON (la configurazione è read-only: non viene mai scritta)
//!
//! ## Parametri di configurazione:
//! - `tools.ffmpeg`: default `ffmpeg` (risolto tramite PATH)
//! - `tools.ffprobe`: default `ffprobe`
//! - `tools.mkvpropedit`: default `mkvpropedit`
//! - `tools.hdr10plus_parser`: default `hdr10plus_parser`
//! - `work_dir`: directory radice delle work directory per video
//!   (default: `<cache dir>/transcode-tasks`)
//!
//! ## Snapshot:
//! I task ricevono una copia di `ToolPaths` alla costruzione; la configurazione
//! non viene mai condivisa in modo mutabile tra i worker.
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config::from_file(&Config::default_path()?).await?;
//! config.validate()?;
//! ```

use crate::error::TaskError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths of the external tools the tasks invoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub mkvpropedit: PathBuf,
    pub hdr10plus_parser: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            mkvpropedit: PathBuf::from("mkvpropedit"),
            hdr10plus_parser: PathBuf::from("hdr10plus_parser"),
        }
    }
}

impl ToolPaths {
    /// Tool name paired with its configured path
    pub fn entries(&self) -> [(&'static str, &Path); 4] {
        [
            ("ffmpeg", self.ffmpeg.as_path()),
            ("ffprobe", self.ffprobe.as_path()),
            ("mkvpropedit", self.mkvpropedit.as_path()),
            ("hdr10plus_parser", self.hdr10plus_parser.as_path()),
        ]
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolPaths,
    /// Root of the per-video work directories
    pub work_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            tools: ToolPaths::default(),
            work_dir: base.join("transcode-tasks"),
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find configuration directory"))?;
        Ok(dir.join("transcode-tasks").join("config.json"))
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), TaskError> {
        for (name, path) in self.tools.entries() {
            if path.as_os_str().is_empty() {
                return Err(TaskError::Config(format!("Path for {} must not be empty", name)));
            }
        }

        if self.work_dir.as_os_str().is_empty() {
            return Err(TaskError::Config("Work directory must not be empty".to_string()));
        }
        if self.work_dir.exists() && !self.work_dir.is_dir() {
            return Err(TaskError::Config(format!(
                "Work directory is not a directory: {}",
                self.work_dir.display()
            )));
        }

        Ok(())
    }

    /// Load configuration from file, falling back to defaults when it does not exist
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

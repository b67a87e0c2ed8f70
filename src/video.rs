//! # Current Video Snapshot
//!
//! Stato read-only del video corrente passato ai task alla costruzione.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Immutable view of the video the tasks operate on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSnapshot {
    pub source: PathBuf,
    /// Scratch directory owned by this video
    pub work_path: PathBuf,
    /// Stream index of the selected video track
    pub selected_track: u32,
    pub output_video: Option<PathBuf>,
}

impl VideoSnapshot {
    pub fn new(source: impl Into<PathBuf>, work_path: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            work_path: work_path.into(),
            selected_track: 0,
            output_video: None,
        }
    }

    /// Snapshot whose work path is a per-video directory under `work_dir`
    pub fn in_work_dir(source: impl Into<PathBuf>, work_dir: &Path) -> Self {
        let source = source.into();
        let work_path = Self::work_path_for(work_dir, &source);
        Self::new(source, work_path)
    }

    pub fn with_track(mut self, track: u32) -> Self {
        self.selected_track = track;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output_video = Some(output.into());
        self
    }

    pub fn work_path_for(work_dir: &Path, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        work_dir.join(stem)
    }
}

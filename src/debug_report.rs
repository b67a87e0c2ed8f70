//! # Debug Report Module
//!
//! Ispettore passivo: rende configurazione e stato correnti come testo read-only.
//!
//! ## Sezioni:
//! - `Config`: snapshot della configurazione
//! - `Tools`: disponibilità dei tool configurati
//! - `FFmpeg Details`: versioni di ffmpeg/ffprobe e flag di build
//! - `Queue`: snapshot della coda (valori JSON forniti dal chiamante)
//! - `Encoders` / `Audio Encoders`: encoder registrati in ffmpeg
//! - `Current Video`: snapshot del video corrente, se presente
//!
//! Il report prende solo riferimenti condivisi e non modifica mai i suoi input.
//! Le informazioni su ffmpeg vengono raccolte con `ProcessRunner`.

use crate::config::{Config, ToolPaths};
use crate::command::ToolCommand;
use crate::error::TaskError;
use crate::process_runner::ProcessRunner;
use crate::signal::TaskResult;
use crate::tool_resolver::ToolStatus;
use crate::video::VideoSnapshot;
use serde::Serialize;
use tracing::warn;

/// Version strings reported by the ffmpeg tools
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolVersions {
    #[serde(rename = "ffmpeg version")]
    pub ffmpeg_version: Option<String>,
    #[serde(rename = "ffprobe version")]
    pub ffprobe_version: Option<String>,
    /// Build flags from the `configuration:` line
    #[serde(rename = "ffmpeg config")]
    pub ffmpeg_config: Vec<String>,
}

impl ToolVersions {
    /// Ask both tools for `-version`; unavailable tools leave their fields empty
    pub fn probe(runner: &ProcessRunner, tools: &ToolPaths) -> Self {
        let ffmpeg_output = version_output(runner, &tools.ffmpeg.to_string_lossy());
        let ffprobe_output = version_output(runner, &tools.ffprobe.to_string_lossy());

        Self {
            ffmpeg_version: ffmpeg_output.as_deref().and_then(parse_version),
            ffprobe_version: ffprobe_output.as_deref().and_then(parse_version),
            ffmpeg_config: ffmpeg_output.as_deref().map(parse_configuration).unwrap_or_default(),
        }
    }
}

fn version_output(runner: &ProcessRunner, program: &str) -> Option<String> {
    match runner.run(&ToolCommand::new(program).arg("-version")) {
        TaskResult::Success { output, .. } => Some(output),
        other => {
            warn!("Could not read {} version: {}", program, other);
            None
        }
    }
}

/// `ffmpeg version 6.1.1-3ubuntu5 Copyright ...` → `6.1.1-3ubuntu5`
pub fn parse_version(output: &str) -> Option<String> {
    let first_line = output.lines().next()?;
    let mut words = first_line.split_whitespace();
    words.find(|word| *word == "version")?;
    words.next().map(str::to_string)
}

pub fn parse_configuration(output: &str) -> Vec<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("configuration:"))
        .map(|flags| flags.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Encoders ffmpeg was built with, split by media type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncoderRegistry {
    pub video: Vec<String>,
    pub audio: Vec<String>,
    pub subtitle: Vec<String>,
}

impl EncoderRegistry {
    pub fn probe(runner: &ProcessRunner, tools: &ToolPaths) -> Self {
        let command = ToolCommand::new(&tools.ffmpeg).args(["-hide_banner", "-encoders"]);
        match runner.run(&command) {
            TaskResult::Success { output, .. } => Self::parse(&output),
            other => {
                warn!("Could not list ffmpeg encoders: {}", other);
                Self::default()
            }
        }
    }

    /// Parse `ffmpeg -encoders`: a legend, a ` ------` separator, then `FLAGS name description`
    pub fn parse(output: &str) -> Self {
        let mut registry = Self::default();

        let entries = output
            .lines()
            .skip_while(|line| !line.trim_start().starts_with("---"))
            .skip(1);

        for line in entries {
            let mut fields = line.split_whitespace();
            let (Some(flags), Some(name)) = (fields.next(), fields.next()) else {
                continue;
            };
            match flags.chars().next() {
                Some('V') => registry.video.push(name.to_string()),
                Some('A') => registry.audio.push(name.to_string()),
                Some('S') => registry.subtitle.push(name.to_string()),
                _ => {}
            }
        }

        registry
    }
}

/// One titled block of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSection {
    pub title: &'static str,
    pub body: String,
}

/// Read-only view over the application state
pub struct DebugReport<'a> {
    pub config: &'a Config,
    pub tools: &'a [ToolStatus],
    pub versions: &'a ToolVersions,
    pub queue: &'a [serde_json::Value],
    pub encoders: &'a EncoderRegistry,
    pub current_video: Option<&'a VideoSnapshot>,
}

impl DebugReport<'_> {
    pub fn sections(&self) -> Result<Vec<DebugSection>, TaskError> {
        let mut sections = vec![
            section("Config", self.config)?,
            section("Tools", &self.tools)?,
            section("FFmpeg Details", self.versions)?,
            section("Queue", &self.queue)?,
            section("Encoders", &self.encoders.video)?,
            section("Audio Encoders", &self.encoders.audio)?,
        ];
        if let Some(video) = self.current_video {
            sections.push(section("Current Video", video)?);
        }
        Ok(sections)
    }

    pub fn render(&self) -> Result<String, TaskError> {
        let rendered: Vec<String> = self
            .sections()?
            .into_iter()
            .map(|section| format!("== {} ==\n{}\n", section.title, section.body))
            .collect();
        Ok(rendered.join("\n"))
    }
}

fn section<T: Serialize + ?Sized>(title: &'static str, value: &T) -> Result<DebugSection, TaskError> {
    Ok(DebugSection {
        title,
        body: serde_json::to_string_pretty(value)?,
    })
}

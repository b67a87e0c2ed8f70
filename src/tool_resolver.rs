//! # Tool Path Resolver
//!
//! Locates the configured external tools:
//! - Explicit paths (absolute or containing a separator) are checked as-is
//! - Bare names are searched in `PATH`, with `.exe` appended on Windows

use crate::config::ToolPaths;
use crate::error::TaskError;
use serde::Serialize;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Availability of one configured tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub name: &'static str,
    pub configured: PathBuf,
    pub resolved: Option<PathBuf>,
}

/// Tool path resolver over a `PATH`-style search list
pub struct ToolResolver {
    search_path: Option<OsString>,
}

impl ToolResolver {
    /// Resolver over the process `PATH`
    pub fn new() -> Self {
        Self {
            search_path: env::var_os("PATH"),
        }
    }

    /// Resolver over an explicit search list
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    /// Resolve a configured tool to an existing file
    pub fn resolve_tool(&self, tool: &Path) -> Option<PathBuf> {
        debug!("Resolving tool: {}", tool.display());

        if tool.is_absolute() || tool.components().count() > 1 {
            return tool.is_file().then(|| tool.to_path_buf());
        }

        let found = self.find_in_search_path(tool);
        if found.is_none() {
            warn!("Tool not found: {}", tool.display());
        }
        found
    }

    fn find_in_search_path(&self, tool: &Path) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        let mut file_name = tool.as_os_str().to_owned();
        if cfg!(windows) && tool.extension().is_none() {
            file_name.push(".exe");
        }

        env::split_paths(search_path)
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    /// Status of every configured tool
    pub fn report(&self, tools: &ToolPaths) -> Vec<ToolStatus> {
        tools
            .entries()
            .into_iter()
            .map(|(name, configured)| ToolStatus {
                name,
                configured: configured.to_path_buf(),
                resolved: self.resolve_tool(configured),
            })
            .collect()
    }

    /// Installation hint for a tool
    pub fn install_instructions(tool_name: &str) -> String {
        match tool_name {
            "ffmpeg" | "ffprobe" => "sudo apt-get install ffmpeg  # or a static build from https://ffmpeg.org/download.html".to_string(),
            "mkvpropedit" => "sudo apt-get install mkvtoolnix".to_string(),
            "hdr10plus_parser" => "download from https://github.com/quietvoid/hdr10plus_tool/releases".to_string(),
            _ => format!("sudo apt-get install {}", tool_name),
        }
    }

    /// Check if a tool is available and provide installation instructions if not
    pub fn check_tool_with_instructions(&self, name: &str, tool: &Path) -> Result<PathBuf, TaskError> {
        self.resolve_tool(tool).ok_or_else(|| {
            TaskError::MissingDependency(format!(
                "Tool '{}' not found ({}). To install:\n  {}",
                name,
                tool.display(),
                Self::install_instructions(name)
            ))
        })
    }

    /// Human readable availability report
    pub fn format_report(&self, tools: &ToolPaths) -> String {
        let mut report = String::from("Tool availability:\n");
        for status in self.report(tools) {
            match status.resolved {
                Some(path) => report.push_str(&format!("  ✅ {} -> {}\n", status.name, path.display())),
                None => report.push_str(&format!(
                    "  ❌ {} ({}) - install with: {}\n",
                    status.name,
                    status.configured.display(),
                    Self::install_instructions(status.name)
                )),
            }
        }
        report
    }
}

impl Default for ToolResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bare_name_found_in_search_path() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let tool_name = if cfg!(windows) { "mkvpropedit.exe" } else { "mkvpropedit" };
        std::fs::write(second.path().join(tool_name), "").unwrap();

        let search = env::join_paths([first.path(), second.path()]).unwrap();
        let resolver = ToolResolver::with_search_path(search);

        assert_eq!(
            resolver.resolve_tool(Path::new("mkvpropedit")),
            Some(second.path().join(tool_name))
        );
        assert_eq!(resolver.resolve_tool(Path::new("hdr10plus_parser")), None);
    }

    #[test]
    fn test_explicit_path_checked_directly() {
        let dir = TempDir::new().unwrap();
        let tool = dir.path().join("ffmpeg-custom");
        std::fs::write(&tool, "").unwrap();

        let resolver = ToolResolver::with_search_path("");
        assert_eq!(resolver.resolve_tool(&tool), Some(tool.clone()));
        assert_eq!(resolver.resolve_tool(&dir.path().join("missing")), None);
    }

    #[test]
    fn test_missing_tool_has_instructions() {
        let resolver = ToolResolver::with_search_path("");
        let err = resolver
            .check_tool_with_instructions("mkvpropedit", Path::new("mkvpropedit"))
            .unwrap_err();
        assert!(err.to_string().contains("mkvtoolnix"));
    }

    #[test]
    fn test_report_covers_all_tools() {
        let resolver = ToolResolver::with_search_path("");
        let report = resolver.report(&ToolPaths::default());
        let names: Vec<_> = report.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["ffmpeg", "ffprobe", "mkvpropedit", "hdr10plus_parser"]);
        assert!(report.iter().all(|s| s.resolved.is_none()));
        assert!(resolver.format_report(&ToolPaths::default()).contains("❌ ffmpeg"));
    }
}

//! # Utility Functions Module
//!
//! Small helpers shared by the command builders and the runners.

use std::path::Path;
use std::process::ExitStatus;

/// Builds an argument vector from heterogeneous `Display` items.
///
/// # Example
/// ```rust
/// use transcode_tasks::args;
///
/// let index = 3;
/// let args = args!["-map", format!("0:{}", index), "-y"];
/// assert_eq!(args, vec!["-map", "0:3", "-y"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$($item.to_string()),*]
    };
}

/// Rewrites every backslash in a path to a forward slash.
///
/// mkvpropedit and the HDR10+ parser on Windows only accept forward slashes.
pub fn normalize_separators(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Numeric exit code of a finished process.
///
/// Processes killed by a signal report the negated signal number.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    -1
}

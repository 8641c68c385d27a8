// Error types for the downloader core

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// Required executable is not resolvable on the search path
    ToolNotFound(String),

    /// Package-manager install exited non-zero; carries its combined output
    InstallFailed(String),

    /// Format listing invocation failed; carries the tool's stderr
    ListFormatsFailed(String),

    /// The listing succeeded but every row was filtered out or none existed
    NoMatchingFormats,

    /// Child process could not be spawned or waited on
    ProcessSpawnFailed(String),

    /// Download process exited non-zero
    DownloadFailed(i32),

    /// An operation of this kind is already running (single-flight guard)
    OperationInFlight(&'static str),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolNotFound(tool) => write!(f, "Tool not found: {}", tool),
            Self::InstallFailed(diag) => write!(f, "Install failed: {}", diag),
            Self::ListFormatsFailed(diag) => write!(f, "Format listing failed: {}", diag),
            Self::NoMatchingFormats => write!(f, "No matching formats for this URL"),
            Self::ProcessSpawnFailed(msg) => write!(f, "Failed to run process: {}", msg),
            Self::DownloadFailed(code) => write!(f, "Download failed (exit code: {})", code),
            Self::OperationInFlight(kind) => {
                write!(f, "A {} operation is already running", kind)
            }
        }
    }
}

impl std::error::Error for DownloadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_diagnostic_text() {
        let err = DownloadError::InstallFailed("winget: source agreement declined".to_string());
        assert!(err.to_string().contains("source agreement declined"));

        let err = DownloadError::ListFormatsFailed("ERROR: Video unavailable".to_string());
        assert!(err.to_string().contains("ERROR: Video unavailable"));
    }

    #[test]
    fn display_includes_exit_code() {
        assert!(DownloadError::DownloadFailed(101).to_string().contains("101"));
    }
}

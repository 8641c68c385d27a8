// Tool availability: PATH probing, winget install, self-update check

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::errors::DownloadError;
use super::process::{resolve_on_path, CommandRunner, SystemRunner};

pub const TOOL_NAME: &str = "yt-dlp";
pub const WINGET_PACKAGE_ID: &str = "yt-dlp.yt-dlp";

/// Outcome of the tool's self-update flag. CheckFailed is non-fatal by
/// design and never propagates as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStatus {
    UpToDate,
    Updated,
    CheckFailed(String),
}

/// Result of the startup readiness flow. When the tool was installed during
/// this process lifetime the current process cannot see the new binary
/// through its search-path cache; the caller must prompt for a restart.
/// That decision belongs to the caller, this is only the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    pub newly_installed: bool,
}

pub struct ToolAvailability {
    runner: Box<dyn CommandRunner>,
}

impl ToolAvailability {
    pub fn new() -> Self {
        Self {
            runner: Box::new(SystemRunner::default()),
        }
    }

    pub fn with_runner(runner: Box<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// True iff the executable resolves on the search path. Never errors,
    /// spawns no process.
    pub fn probe(&self, tool_name: &str) -> bool {
        resolve_on_path(tool_name).is_some()
    }

    /// Resolve the executable's path, or fail when it is absent. Callers
    /// that cannot proceed without the tool use this instead of [`probe`].
    ///
    /// [`probe`]: Self::probe
    pub fn require(&self, tool_name: &str) -> Result<PathBuf, DownloadError> {
        resolve_on_path(tool_name)
            .ok_or_else(|| DownloadError::ToolNotFound(tool_name.to_string()))
    }

    /// Install a package through winget, capturing its combined output.
    /// Succeeds iff the subprocess exit code is zero.
    pub async fn ensure_installed(
        &self,
        package_id: &str,
        display_name: &str,
    ) -> Result<(), DownloadError> {
        log::info!("installing {} via winget ({})", display_name, package_id);

        let args: Vec<String> = [
            "install",
            "--id",
            package_id,
            "--accept-source-agreements",
            "--accept-package-agreements",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let output = self
            .runner
            .capture("winget", &args)
            .await
            .map_err(DownloadError::InstallFailed)?;

        if output.status.success() {
            log::info!("{} installed", display_name);
            Ok(())
        } else {
            let mut diag = String::from_utf8_lossy(&output.stdout).into_owned();
            diag.push_str(&String::from_utf8_lossy(&output.stderr));
            Err(DownloadError::InstallFailed(diag))
        }
    }

    /// Run the tool's self-update flag and interpret its stdout.
    /// Any execution failure degrades to CheckFailed.
    pub async fn check_for_update(&self, tool_name: &str) -> UpdateStatus {
        match self.runner.capture(tool_name, &["-U".to_string()]).await {
            Ok(output) if output.status.success() => {
                interpret_update_output(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                UpdateStatus::CheckFailed(String::from_utf8_lossy(&output.stderr).into_owned())
            }
            Err(diag) => UpdateStatus::CheckFailed(diag),
        }
    }

    /// Startup flow: probe, install when absent, otherwise run the
    /// non-fatal update check.
    pub async fn ensure_ready(
        &self,
        tool_name: &str,
        package_id: &str,
        display_name: &str,
    ) -> Result<Readiness, DownloadError> {
        if !self.probe(tool_name) {
            log::warn!("{} not found on the search path", tool_name);
            self.ensure_installed(package_id, display_name).await?;
            return Ok(Readiness {
                newly_installed: true,
            });
        }

        match self.check_for_update(tool_name).await {
            UpdateStatus::Updated => log::info!("{} updated", tool_name),
            UpdateStatus::UpToDate => log::debug!("{} is up to date", tool_name),
            UpdateStatus::CheckFailed(diag) => {
                log::warn!("{} update check failed (non-fatal): {}", tool_name, diag)
            }
        }

        Ok(Readiness {
            newly_installed: false,
        })
    }
}

impl Default for ToolAvailability {
    fn default() -> Self {
        Self::new()
    }
}

/// Map the self-update stdout to a status by its known markers.
fn interpret_update_output(stdout: &str) -> UpdateStatus {
    if stdout.contains("Updated") {
        UpdateStatus::Updated
    } else if stdout.contains("up to date") {
        UpdateStatus::UpToDate
    } else {
        UpdateStatus::CheckFailed(format!("unrecognized self-update output: {}", stdout.trim()))
    }
}

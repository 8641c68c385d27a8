// Subprocess plumbing shared by tool checks and format listing

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

/// Seam over subprocess output capture so catalog and tool logic can be
/// unit-tested with a fake runner instead of real binaries.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and capture stdout/stderr. The error string is a
    /// human-readable diagnostic; callers map it to their own error variant.
    async fn capture(&self, program: &str, args: &[String]) -> Result<Output, String>;
}

/// Real subprocess runner with a hard timeout. The child is killed when the
/// deadline expires so a wedged tool cannot hang the worker forever.
pub struct SystemRunner {
    timeout_secs: u64,
}

impl SystemRunner {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        // winget installs and VR format listings are both slow
        Self::new(300)
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn capture(&self, program: &str, args: &[String]) -> Result<Output, String> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("Failed to start {}: {}", program, e))?;

        let mut stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| format!("Failed to capture stdout from {}", program))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| format!("Failed to capture stderr from {}", program))?;

        // Drain both pipes concurrently while waiting, so the child never
        // blocks on a full pipe buffer.
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stdout_pipe
                .read_to_end(&mut buf)
                .await
                .map_err(|e| format!("Failed to read stdout: {}", e))?;
            Ok::<Vec<u8>, String>(buf)
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr_pipe
                .read_to_end(&mut buf)
                .await
                .map_err(|e| format!("Failed to read stderr: {}", e))?;
            Ok::<Vec<u8>, String>(buf)
        });

        match timeout(Duration::from_secs(self.timeout_secs), child.wait()).await {
            Ok(status_res) => {
                let status =
                    status_res.map_err(|e| format!("Failed to wait for {}: {}", program, e))?;
                let stdout = stdout_task
                    .await
                    .map_err(|e| format!("stdout task failed: {}", e))??;
                let stderr = stderr_task
                    .await
                    .map_err(|e| format!("stderr task failed: {}", e))??;
                Ok(Output {
                    status,
                    stdout,
                    stderr,
                })
            }
            Err(_) => {
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                Err(format!("{} timed out after {}s", program, self.timeout_secs))
            }
        }
    }
}

/// Resolve an executable name on the process search path. No process is
/// spawned; the PATH entries are scanned directly.
pub fn resolve_on_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    search_path_for(name, &path_var)
}

fn search_path_for(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(path_var) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            for ext in ["exe", "cmd", "bat", "com"] {
                let candidate = dir.join(format!("{}.{}", name, ext));
                if is_executable(&candidate) {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && path
            .metadata()
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(windows)]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::process::ExitStatus;

    pub fn exit_status(code: i32) -> ExitStatus {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            ExitStatus::from_raw(code << 8)
        }
        #[cfg(windows)]
        {
            use std::os::windows::process::ExitStatusExt;
            ExitStatus::from_raw(code as u32)
        }
    }

    /// Canned-output runner for tests; records nothing, spawns nothing.
    pub struct FakeRunner {
        pub stdout: String,
        pub stderr: String,
        pub exit_code: i32,
    }

    impl FakeRunner {
        pub fn ok(stdout: &str) -> Self {
            Self {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: 0,
            }
        }

        pub fn failing(exit_code: i32, stderr: &str) -> Self {
            Self {
                stdout: String::new(),
                stderr: stderr.to_string(),
                exit_code,
            }
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn capture(&self, _program: &str, _args: &[String]) -> Result<Output, String> {
            Ok(Output {
                status: exit_status(self.exit_code),
                stdout: self.stdout.clone().into_bytes(),
                stderr: self.stderr.clone().into_bytes(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_does_not_resolve() {
        assert!(resolve_on_path("definitely-not-a-real-tool-zz9").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn resolves_executable_in_path_entry() {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("vrdl-path-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let tool = dir.join("fake-tool");
        std::fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let path_var = std::env::join_paths([dir.clone()]).unwrap();
        assert_eq!(search_path_for("fake-tool", &path_var), Some(tool));
        assert!(search_path_for("other-tool", &path_var).is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("vrdl-noexec-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let tool = dir.join("plain-file");
        std::fs::write(&tool, "data").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();

        let path_var = std::env::join_paths([dir.clone()]).unwrap();
        assert!(search_path_for("plain-file", &path_var).is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn capture_returns_output_and_status() {
        let runner = SystemRunner::new(10);
        let out = runner
            .capture("sh", &["-c".to_string(), "echo hello; exit 3".to_string()])
            .await
            .unwrap();
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "hello");
    }

    #[tokio::test]
    async fn capture_missing_program_is_an_error() {
        let runner = SystemRunner::new(5);
        let err = runner
            .capture("definitely-not-a-real-tool-zz9", &[])
            .await
            .unwrap_err();
        assert!(err.contains("Failed to start"));
    }
}

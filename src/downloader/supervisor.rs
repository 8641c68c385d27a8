// Download supervision: spawn the tool, stream its output line by line,
// classify each line, and report the final outcome.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedSender};

use super::errors::DownloadError;
use super::models::{Completion, DownloadJob, ProgressEvent, EXTRACTOR_HINT};
use super::progress::classify;
use super::tools::TOOL_NAME;

pub struct DownloadSupervisor {
    tool_path: String,
    download_active: AtomicBool,
}

impl DownloadSupervisor {
    pub fn new() -> Self {
        Self::with_tool(TOOL_NAME)
    }

    pub fn with_tool(tool_path: &str) -> Self {
        Self {
            tool_path: tool_path.to_string(),
            download_active: AtomicBool::new(false),
        }
    }

    pub fn is_downloading(&self) -> bool {
        self.download_active.load(Ordering::SeqCst)
    }

    /// Run a download to completion, forwarding classified events on the
    /// channel in the exact order their lines arrived. At most one download
    /// may be running at a time; only one process may write into a
    /// destination directory per job.
    ///
    /// There is no mid-operation cancellation: once spawned, the child runs
    /// to completion. Dropping the receiver does not stop the download.
    pub async fn run(
        &self,
        job: DownloadJob,
        events: UnboundedSender<ProgressEvent>,
    ) -> Result<Completion, DownloadError> {
        if self.download_active.swap(true, Ordering::SeqCst) {
            return Err(DownloadError::OperationInFlight("download"));
        }
        let result = self.supervise(&job, &events).await;
        self.download_active.store(false, Ordering::SeqCst);
        result
    }

    fn build_args(&self, job: &DownloadJob) -> Vec<String> {
        let output_template = job.destination_dir.join("%(title)s.%(ext)s");
        vec![
            "--extractor-args".to_string(),
            EXTRACTOR_HINT.to_string(),
            "-f".to_string(),
            job.format_expression.clone(),
            "-o".to_string(),
            output_template.to_string_lossy().into_owned(),
            "--progress".to_string(),
            "--newline".to_string(),
            job.url.clone(),
        ]
    }

    async fn supervise(
        &self,
        job: &DownloadJob,
        events: &UnboundedSender<ProgressEvent>,
    ) -> Result<Completion, DownloadError> {
        let args = self.build_args(job);
        log::debug!("spawning {} {}", self.tool_path, args.join(" "));

        let mut child = Command::new(&self.tool_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DownloadError::ProcessSpawnFailed(format!("{}: {}", self.tool_path, e))
            })?;

        // Fold stdout and stderr into one line stream in arrival order,
        // consumed while the process runs rather than after it exits.
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_lines(stdout, line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_lines(stderr, line_tx.clone()));
        }
        drop(line_tx);

        while let Some(line) = line_rx.recv().await {
            if let Some(event) = classify(&line) {
                // keep draining even if the receiver hung up, so the child
                // never blocks on a full pipe
                if events.send(event).is_err() {
                    log::warn!("event receiver dropped; draining remaining output");
                }
            }
        }

        let status = child.wait().await.map_err(|e| {
            DownloadError::ProcessSpawnFailed(format!("wait on {}: {}", self.tool_path, e))
        })?;
        let exit_code = status.code().unwrap_or(-1);
        let _ = events.send(ProgressEvent::Completed { exit_code });

        if status.success() {
            Ok(Completion { exit_code })
        } else {
            log::warn!("download exited with code {}", exit_code);
            Err(DownloadError::DownloadFailed(exit_code))
        }
    }
}

impl Default for DownloadSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

async fn pump_lines<R: AsyncRead + Unpin>(reader: R, tx: UnboundedSender<String>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            break;
        }
    }
}

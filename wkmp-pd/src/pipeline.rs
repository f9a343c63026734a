//! Pipeline Supervisor (C6): starts/stops/restarts the external
//! decoder/encoder subprocess per mount and demultiplexes its output.
//!
//! HQ/LQ demultiplexing is implemented with two named pipes (FIFOs) under
//! a per-mount temp directory rather than raw `dup2`'d file descriptors 3
//! and 4: both give the toolchain subprocess two independent output
//! channels, but a FIFO path is something `tokio::fs::File` can open
//! directly, with no unsafe `pre_exec`/`dup2` plumbing required.

use crate::error::SubprocessError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs::File;
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::time::{timeout, Duration};
use tracing::{info, warn};
use uuid::Uuid;

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Demultiplexed output for a running pipeline.
pub enum Output {
    /// stdout piped directly; when it closes the mount's HQ feed has ended.
    Single { reader: ChildStdout },
    /// Two independent channels plus an optional stdin writer for
    /// injecting raw PCM (used by the crossfade session).
    Dual {
        hq: File,
        lq: File,
        stdin: Option<ChildStdin>,
    },
}

/// A live subprocess and the FIFO paths it was told to write to, if any.
pub struct PipelineHandle {
    child: Child,
    fifo_dir: Option<PathBuf>,
}

/// Build the pair of FIFO paths a dual-output pipeline string should
/// reference as its HQ/LQ sink locations.
pub fn dual_output_fifo_paths(base_dir: &Path, mount_id: Uuid) -> (PathBuf, PathBuf) {
    let dir = base_dir.join(mount_id.to_string());
    (dir.join("hq.fifo"), dir.join("lq.fifo"))
}

async fn make_fifo(path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let status = tokio::process::Command::new("mkfifo")
        .arg(path)
        .status()
        .await
        .map_err(|e| SubprocessError::SpawnFailed(e.to_string()))?;
    if !status.success() {
        return Err(SubprocessError::SpawnFailed(format!("mkfifo failed for {path:?}")).into());
    }
    Ok(())
}

/// Spawn a dual-output pipeline: `pipeline_string` must already reference
/// `hq_path`/`lq_path` as its sink locations (the materializer/director
/// builds that string; this function only creates the FIFOs and runs it).
pub async fn spawn_dual(
    gstreamer_bin: &str,
    pipeline_string: &str,
    hq_path: &Path,
    lq_path: &Path,
    with_stdin: bool,
) -> crate::Result<(PipelineHandle, Output)> {
    make_fifo(hq_path).await?;
    make_fifo(lq_path).await?;

    let shell_command = format!("{gstreamer_bin} -e {pipeline_string}");

    let mut command = tokio::process::Command::new("sh");
    command.arg("-c").arg(&shell_command);
    command.stdin(if with_stdin { Stdio::piped() } else { Stdio::null() });
    command.stdout(Stdio::null());
    command.stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| SubprocessError::SpawnFailed(e.to_string()))?;
    let stdin = child.stdin.take();

    // Opening the read end blocks until the writer opens its end; the
    // subprocess is already spawned, so this resolves once its sink
    // elements open the FIFOs for writing.
    let hq = File::open(hq_path).await?;
    let lq = File::open(lq_path).await?;

    info!(pipeline = %shell_command, "spawned dual-output pipeline");

    Ok((
        PipelineHandle { child, fifo_dir: hq_path.parent().map(PathBuf::from) },
        Output::Dual { hq, lq, stdin },
    ))
}

/// Single-output pipeline: stdout is piped directly. Used for the
/// crossfade session's per-media decoder subprocess (§4.7), whose
/// pipeline writes raw PCM to stdout with real-time throttling.
pub async fn spawn_single(gstreamer_bin: &str, pipeline_string: &str) -> crate::Result<(PipelineHandle, Output)> {
    let shell_command = format!("{gstreamer_bin} -e {pipeline_string}");

    let mut child = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(&shell_command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SubprocessError::SpawnFailed(e.to_string()))?;

    let stdout = child.stdout.take().ok_or(SubprocessError::StreamClosed)?;

    info!(pipeline = %shell_command, "spawned single-output pipeline");

    Ok((PipelineHandle { child, fifo_dir: None }, Output::Single { reader: stdout }))
}

impl PipelineHandle {
    /// Graceful-terminate, wait up to 5s, hard-kill on timeout.
    pub async fn stop(mut self) -> crate::Result<()> {
        // tokio::process has no direct SIGTERM helper; send it via the id.
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            send_sigterm(pid);
        }

        let result = match timeout(GRACEFUL_SHUTDOWN_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => {
                if !status.success() {
                    warn!(?status, "pipeline exited non-zero during graceful stop");
                }
                Ok(())
            }
            Ok(Err(e)) => Err(SubprocessError::SpawnFailed(e.to_string()).into()),
            Err(_) => {
                warn!("pipeline did not exit within grace period, killing");
                self.child.kill().await.ok();
                Err(SubprocessError::KilledAfterTimeout.into())
            }
        };

        if let Some(dir) = self.fifo_dir.take() {
            tokio::fs::remove_dir_all(dir).await.ok();
        }

        result
    }
}

#[cfg(unix)]
fn send_sigterm(pid: u32) {
    // Equivalent to `kill -TERM <pid>`, invoked as a subprocess rather
    // than a raw libc call so this module stays free of unsafe FFI.
    let _ = std::process::Command::new("kill")
        .arg("-TERM")
        .arg(pid.to_string())
        .status();
}

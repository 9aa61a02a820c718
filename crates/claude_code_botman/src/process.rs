use std::{
    collections::BTreeMap,
    io,
    path::Path,
    process::{ExitStatus, Stdio},
    time::{Duration, Instant},
};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::{Child, Command},
    time,
};
use tracing::debug;

use crate::ClaudeCodeError;

/// Exit code reported when the child was terminated by a signal.
pub const SIGNAL_EXIT_CODE: i32 = -1;

#[derive(Clone, Copy)]
pub(crate) enum ConsoleTarget {
    Stdout,
    Stderr,
}

/// Captured result of one finished child process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(SIGNAL_EXIT_CODE)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

pub(crate) async fn tee_stream<R>(
    mut reader: R,
    target: ConsoleTarget,
    mirror_console: bool,
) -> Result<Vec<u8>, io::Error>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if mirror_console {
            match target {
                ConsoleTarget::Stdout => {
                    let mut out = tokio::io::stdout();
                    out.write_all(&chunk[..n]).await?;
                    out.flush().await?;
                }
                ConsoleTarget::Stderr => {
                    let mut out = tokio::io::stderr();
                    out.write_all(&chunk[..n]).await?;
                    out.flush().await?;
                }
            }
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
    Ok(buffer)
}

async fn spawn_with_retry(
    command: &mut Command,
    binary: &Path,
) -> Result<Child, ClaudeCodeError> {
    let mut backoff = Duration::from_millis(2);
    let mut attempt = 0;
    loop {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Err(ClaudeCodeError::NotFound {
                    binary: binary.to_path_buf(),
                    reason: source.to_string(),
                });
            }
            Err(source) => {
                // ETXTBSY: a freshly written executable can still be open for writing.
                let is_busy = source.kind() == io::ErrorKind::ExecutableFileBusy
                    || source.raw_os_error() == Some(26);
                attempt += 1;
                if is_busy && attempt < 5 {
                    time::sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, Duration::from_millis(50));
                    continue;
                }
                return Err(ClaudeCodeError::Spawn {
                    binary: binary.to_path_buf(),
                    source,
                });
            }
        }
    }
}

/// Spawns `command` with stdin closed, drains both pipes, and waits up to
/// `timeout`. The child is killed if the deadline passes.
pub(crate) async fn run_command(
    mut command: Command,
    binary: &Path,
    timeout: Option<Duration>,
    mirror_stdout: bool,
    mirror_stderr: bool,
) -> Result<CommandOutput, ClaudeCodeError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let started = Instant::now();
    let mut child = spawn_with_retry(&mut command, binary).await?;
    debug!(binary = ?binary, pid = ?child.id(), "spawned claude process");

    let stdout = child.stdout.take().ok_or(ClaudeCodeError::MissingStdout)?;
    let stderr = child.stderr.take().ok_or(ClaudeCodeError::MissingStderr)?;

    let stdout_task = tokio::spawn(tee_stream(stdout, ConsoleTarget::Stdout, mirror_stdout));
    let stderr_task = tokio::spawn(tee_stream(stderr, ConsoleTarget::Stderr, mirror_stderr));

    let status = match timeout {
        Some(dur) => match time::timeout(dur, child.wait()).await {
            Ok(result) => result.map_err(ClaudeCodeError::Wait)?,
            Err(_) => {
                if let Err(err) = child.start_kill() {
                    debug!(binary = ?binary, error = %err, "failed to kill timed out process");
                }
                stdout_task.abort();
                stderr_task.abort();
                debug!(binary = ?binary, timeout = ?dur, "claude process timed out");
                return Err(ClaudeCodeError::Timeout { timeout: dur });
            }
        },
        None => child.wait().await.map_err(ClaudeCodeError::Wait)?,
    };

    let stdout = stdout_task
        .await
        .map_err(|e| ClaudeCodeError::Join(e.to_string()))?
        .map_err(ClaudeCodeError::StdoutRead)?;
    let stderr = stderr_task
        .await
        .map_err(|e| ClaudeCodeError::Join(e.to_string()))?
        .map_err(ClaudeCodeError::StderrRead)?;

    debug!(
        binary = ?binary,
        exit_code = ?status.code(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        "claude process exited"
    );

    Ok(CommandOutput {
        status,
        stdout,
        stderr,
    })
}

pub(crate) fn apply_env(command: &mut Command, env: &BTreeMap<String, String>) {
    for (k, v) in env {
        command.env(k, v);
    }
}

//! Blocking subprocess execution with a hard deadline

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::defaults::PROCESS_POLL_INTERVAL;
use crate::error::BackendError;

/// Exit status and captured output of a finished process
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Run `command` to completion, killing it once `timeout` has elapsed.
///
/// stdout and stderr go to anonymous temp files, not pipes; nothing drains a pipe
/// while the child is being polled.
pub fn run_with_timeout(
    command: &mut Command,
    tool: &str,
    timeout: Duration,
) -> Result<ProcessOutput, BackendError> {
    let mut stdout_sink = tempfile::tempfile()?;
    let mut stderr_sink = tempfile::tempfile()?;

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_sink.try_clone()?))
        .stderr(Stdio::from(stderr_sink.try_clone()?))
        .spawn()
        .map_err(|source| BackendError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    let deadline = Instant::now() + timeout;
    let status = loop {
        let polled = match child.try_wait() {
            Ok(polled) => polled,
            Err(e) => {
                reap(&mut child);
                return Err(e.into());
            }
        };
        match polled {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                reap(&mut child);
                return Err(BackendError::Timeout {
                    tool: tool.to_string(),
                    timeout,
                });
            }
            None => thread::sleep(PROCESS_POLL_INTERVAL),
        }
    };

    Ok(ProcessOutput {
        status,
        stdout: read_back(&mut stdout_sink)?,
        stderr: read_back(&mut stderr_sink)?,
    })
}

/// Kill and wait so no zombie outlives the call; errors mean it already exited
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn read_back(file: &mut File) -> io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn test_captures_output_and_status() {
        let output = run_with_timeout(&mut sh("echo out; echo err >&2; exit 3"), "sh", Duration::from_secs(5))
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "out");
        assert_eq!(output.stderr_lossy(), "err");
    }

    #[test]
    fn test_timeout_kills_process() {
        let started = Instant::now();
        let err = run_with_timeout(&mut sh("sleep 30"), "sh", Duration::from_millis(200)).unwrap_err();
        assert!(matches!(
            err,
            BackendError::Timeout { timeout, .. } if timeout == Duration::from_millis(200)
        ));
        assert_eq!(err.to_string(), "sh timed out after 200ms");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_executable_is_spawn_error() {
        let mut cmd = Command::new("/nonexistent/definitely-not-a-tool");
        let err = run_with_timeout(&mut cmd, "missing", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, BackendError::Spawn { .. }));
        assert!(err.is_execution_failure());
    }
}

// GuidSleuth - platform/process.rs
//
// External command execution with a wall-clock deadline.
//
// stdout and stderr are drained on helper threads while the child runs so a
// chatty tool cannot block on a full pipe. The child is polled with
// `try_wait`; at the deadline it is killed and reaped.

use crate::util::constants;
use crate::util::error::ProcessError;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Captured result of a finished command.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run `command` to completion, capturing its output, or kill it after `timeout`.
pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<ProcessOutput, ProcessError> {
    let program = command.get_program().to_string_lossy().into_owned();

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

    tracing::debug!(program = %program, pid = child.id(), timeout_secs = timeout.as_secs(), "Process started");

    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let status = match wait_until(&mut child, timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            if let Err(e) = child.kill() {
                tracing::debug!(program = %program, error = %e, "Kill after timeout failed");
            }
            let _ = child.wait();
            // Not joined: a grandchild may still hold the pipes open.
            drop(stdout_reader);
            drop(stderr_reader);
            tracing::warn!(program = %program, timeout_secs = timeout.as_secs(), "Process timed out");
            return Err(ProcessError::Timeout { program, timeout });
        }
        Err(source) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProcessError::Wait { program, source });
        }
    };

    let stdout = collect(stdout_reader);
    let stderr = collect(stderr_reader);

    tracing::debug!(
        program = %program,
        code = ?status.code(),
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        "Process finished"
    );

    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
    })
}

/// Poll the child until it exits (`Some`) or the deadline passes (`None`).
fn wait_until(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    let poll = Duration::from_millis(constants::PROCESS_POLL_INTERVAL_MS);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        std::thread::sleep(poll.min(deadline - now));
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout_and_status() {
        let out = run_with_timeout(
            Command::new("sh").args(["-c", "echo hello; echo oops >&2"]),
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn test_non_zero_exit_is_not_an_error() {
        let out = run_with_timeout(
            Command::new("sh").args(["-c", "exit 3"]),
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(!out.success());
        assert_eq!(out.status.code(), Some(3));
    }

    #[test]
    fn test_deadline_kills_child() {
        let started = Instant::now();
        let result = run_with_timeout(
            Command::new("sleep").arg("30"),
            Duration::from_millis(200),
        );
        assert!(matches!(result, Err(ProcessError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let result = run_with_timeout(
            &mut Command::new("guidsleuth-definitely-not-installed"),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }
}

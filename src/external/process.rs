//! Subprocess execution with timeout and cancellation.

use crate::error::{Result, StitchError};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared flag a caller sets to abandon a run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(StitchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stderr if present, otherwise stdout.
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Run `program` with `args` from `cwd`, killing it on timeout or cancellation.
///
/// A non-zero exit is returned as a normal [`ProcessOutput`]; only spawn
/// failures, timeouts and cancellation are errors.
pub fn run_with_timeout(
    program: &Path,
    args: &[&std::ffi::OsStr],
    cwd: Option<&Path>,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<ProcessOutput> {
    let program_name = program
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| program.display().to_string());

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    log::debug!("Running {} {:?}", program.display(), args);
    let mut child = cmd.spawn()?;
    let start = Instant::now();

    // Drain pipes on helper threads so a chatty child cannot block on a full pipe.
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                if cancel.is_cancelled() {
                    let _ = child.kill();
                    let _ = child.wait();
                    log::warn!("Killed {} after cancellation", program_name);
                    return Err(StitchError::Cancelled);
                }
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(StitchError::Timeout {
                        program: program_name,
                        timeout,
                    });
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    };

    Ok(ProcessOutput {
        code: status.code(),
        stdout: join_reader(stdout_reader),
        stderr: join_reader(stderr_reader),
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<std::thread::JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(StitchError::Cancelled)));
    }

    #[test]
    fn test_diagnostics_prefers_stderr() {
        let out = ProcessOutput {
            code: Some(1),
            stdout: "out".to_string(),
            stderr: "  err \n".to_string(),
        };
        assert!(!out.success());
        assert_eq!(out.diagnostics(), "err");

        let quiet = ProcessOutput {
            code: Some(0),
            stdout: "only stdout".to_string(),
            stderr: String::new(),
        };
        assert_eq!(quiet.diagnostics(), "only stdout");
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let err = run_with_timeout(
            Path::new("/nonexistent/definitely-not-a-tool"),
            &[OsStr::new("--help")],
            None,
            Duration::from_secs(1),
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StitchError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let err = run_with_timeout(
            Path::new("sleep"),
            &[OsStr::new("5")],
            None,
            Duration::from_millis(200),
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StitchError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_pre_cancelled_run_is_killed() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = run_with_timeout(
            Path::new("sleep"),
            &[OsStr::new("5")],
            None,
            Duration::from_secs(10),
            &cancel,
        )
        .unwrap_err();
        assert!(matches!(err, StitchError::Cancelled));
    }
}

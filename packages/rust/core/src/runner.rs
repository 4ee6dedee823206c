//! Subprocess capability: run a command line under a wall-clock limit.
//!
//! Everything that launches an external program goes through [`ToolRunner`],
//! so the environment check and per-file processing can be exercised with a
//! fake runner instead of a real JVM.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use ontodocs_shared::{OntodocsError, Result};

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The argument following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }

    /// Whether `flag` appears anywhere in the arguments.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ToolExit
// ---------------------------------------------------------------------------

/// How a bounded run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolExit {
    /// The process exited on its own. `code` is `None` when it was killed by
    /// a signal.
    Exited {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The limit elapsed and the process was killed.
    TimedOut,
}

impl ToolExit {
    /// Exit status zero.
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited { code: Some(0), .. })
    }
}

// ---------------------------------------------------------------------------
// ToolRunner
// ---------------------------------------------------------------------------

/// Run a command to completion or until `limit` elapses.
///
/// Implementations return `Err` only when the process could not be started
/// or waited on; exit statuses and timeouts are reported through
/// [`ToolExit`].
pub trait ToolRunner: Send + Sync {
    fn run(
        &self,
        invocation: &Invocation,
        limit: Duration,
    ) -> impl Future<Output = Result<ToolExit>> + Send;
}

/// Runs real subprocesses via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation, limit: Duration) -> Result<ToolExit> {
        debug!(command = %invocation, limit_secs = limit.as_secs(), "spawning subprocess");

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout kills the child.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OntodocsError::launch(&invocation.program, e))?;

        match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ToolExit::Exited {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(OntodocsError::Process(format!(
                "failed to wait for `{}`: {e}",
                invocation.program
            ))),
            Err(_) => {
                warn!(program = %invocation.program, limit_secs = limit.as_secs(), "subprocess timed out, killed");
                Ok(ToolExit::TimedOut)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder_and_display() {
        let inv = Invocation::new("java")
            .args(["-jar", "widoco.jar"])
            .arg("-ontFile")
            .arg("ontology/acme/v1/widget.owl");

        assert_eq!(inv.to_string(), "java -jar widoco.jar -ontFile ontology/acme/v1/widget.owl");
        assert_eq!(inv.flag_value("-jar"), Some(OsStr::new("widoco.jar")));
        assert_eq!(inv.flag_value("-outFolder"), None);
        assert!(inv.has_flag("-ontFile"));
    }

    #[test]
    fn test_tool_exit_success() {
        let ok = ToolExit::Exited {
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        };
        let failed = ToolExit::Exited {
            code: Some(1),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!ToolExit::TimedOut.success());
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let inv = Invocation::new("ontodocs-definitely-not-a-real-program");
        let err = ProcessRunner
            .run(&inv, Duration::from_secs(5))
            .await
            .unwrap_err();

        match err {
            OntodocsError::Launch { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Launch, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_exit_code_and_stderr() {
        let inv = Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let exit = ProcessRunner.run(&inv, Duration::from_secs(10)).await.unwrap();

        match exit {
            ToolExit::Exited { code, stdout, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stdout.trim(), "out");
                assert_eq!(stderr.trim(), "err");
            }
            ToolExit::TimedOut => panic!("unexpected timeout"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let inv = Invocation::new("sh").args(["-c", "sleep 30"]);
        let started = std::time::Instant::now();
        let exit = ProcessRunner
            .run(&inv, Duration::from_millis(200))
            .await
            .unwrap();

        assert_eq!(exit, ToolExit::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}

//! Java runtime check.

use std::io;
use std::time::Duration;

use tracing::{info, instrument};

use ontodocs_shared::{OntodocsError, Result};

use crate::runner::{Invocation, ToolExit, ToolRunner};

/// What the runtime probe found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    /// Executable that was probed.
    pub program: String,
    /// First line of the version banner, if the runtime printed one.
    pub version_line: Option<String>,
}

/// Verify that `program` can be launched by running `<program> -version`
/// within `limit`.
///
/// A program that cannot be found yields [`OntodocsError::RuntimeMissing`].
/// The exit status is not inspected: being invocable is enough.
#[instrument(skip(runner))]
pub async fn check_runtime<R: ToolRunner>(
    runner: &R,
    program: &str,
    limit: Duration,
) -> Result<RuntimeInfo> {
    let invocation = Invocation::new(program).arg("-version");

    match runner.run(&invocation, limit).await {
        Ok(ToolExit::Exited { stdout, stderr, .. }) => {
            // Java prints its banner on stderr.
            let version_line = first_line(&stderr).or_else(|| first_line(&stdout));
            info!(program, version = version_line.as_deref().unwrap_or("unknown"), "runtime found");
            Ok(RuntimeInfo {
                program: program.to_string(),
                version_line,
            })
        }
        Ok(ToolExit::TimedOut) => Err(OntodocsError::Process(format!(
            "`{program} -version` did not finish within {}s \
             (raise runtime.probe_timeout_secs for slow JVM starts)",
            limit.as_secs()
        ))),
        Err(OntodocsError::Launch { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Err(OntodocsError::RuntimeMissing {
                program: program.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRunner;

    const PROBE: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_version_line_from_stderr() {
        let runner = FakeRunner::new(|_| {
            Ok(ToolExit::Exited {
                code: Some(0),
                stdout: String::new(),
                stderr: "\nopenjdk version \"17.0.9\" 2023-10-17\nOpenJDK Runtime Environment\n"
                    .into(),
            })
        });

        let info = check_runtime(&runner, "java", PROBE).await.unwrap();
        assert_eq!(info.program, "java");
        assert_eq!(info.version_line.as_deref(), Some("openjdk version \"17.0.9\" 2023-10-17"));

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to_string(), "java -version");
    }

    #[tokio::test]
    async fn test_nonzero_exit_still_counts_as_present() {
        let runner = FakeRunner::new(|_| {
            Ok(ToolExit::Exited {
                code: Some(1),
                stdout: "java 21".into(),
                stderr: String::new(),
            })
        });

        let info = check_runtime(&runner, "java", PROBE).await.unwrap();
        assert_eq!(info.version_line.as_deref(), Some("java 21"));
    }

    #[tokio::test]
    async fn test_not_found_is_runtime_missing() {
        let runner = FakeRunner::new(|inv| {
            Err(OntodocsError::launch(
                &inv.program,
                io::Error::new(io::ErrorKind::NotFound, "no such file"),
            ))
        });

        let err = check_runtime(&runner, "java", PROBE).await.unwrap_err();
        assert!(matches!(err, OntodocsError::RuntimeMissing { ref program } if program == "java"));
    }

    #[tokio::test]
    async fn test_other_launch_errors_propagate() {
        let runner = FakeRunner::new(|inv| {
            Err(OntodocsError::launch(
                &inv.program,
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            ))
        });

        let err = check_runtime(&runner, "java", PROBE).await.unwrap_err();
        assert!(matches!(err, OntodocsError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_real_missing_runtime() {
        let err = check_runtime(&crate::runner::ProcessRunner, "ontodocs-no-such-java", PROBE)
            .await
            .unwrap_err();
        assert!(matches!(err, OntodocsError::RuntimeMissing { .. }));
    }

    #[tokio::test]
    async fn test_probe_timeout_is_fatal_and_names_limit() {
        let runner = FakeRunner::new(|_| Ok(ToolExit::TimedOut));

        let err = check_runtime(&runner, "java", Duration::from_secs(45))
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(matches!(err, OntodocsError::Process(_)));
        assert!(msg.contains("45s"), "{msg}");
        assert!(msg.contains("runtime.probe_timeout_secs"), "{msg}");
        assert_eq!(runner.limits(), vec![Duration::from_secs(45)]);
    }
}

//! Collect data by running an external command.
//!
//! The command's stdout is the payload and must be UTF-8. A non-zero exit
//! fails with the captured stderr; no partial output is ever returned. The
//! wait is bounded and the child is killed when the limit elapses.

use std::ffi::OsString;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default bound on how long a collector may run.
pub const DEFAULT_COLLECT_TIMEOUT: Duration = Duration::from_secs(300);

/// Placeholder shown in logs instead of secret arguments.
const REDACTED: &str = "***";

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} failed ({status}): {stderr}")]
    NonZeroExit {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{program} did not finish within {secs} seconds and was killed")]
    TimedOut { program: String, secs: u64 },
    #[error("{program} wrote output that is not valid UTF-8: {source}")]
    InvalidOutput {
        program: String,
        source: std::string::FromUtf8Error,
    },
}

#[derive(Debug, Clone)]
struct Arg {
    value: OsString,
    secret: bool,
}

/// An external command whose stdout is the collected payload.
///
/// ```ignore
/// let payload = ExternalCollector::new("pwsh")
///     .args(["-NoProfile", "-File", "GetKustoLogs.ps1", "-KustoUri", uri])
///     .arg("-BearerToken")
///     .secret_arg(token)
///     .timeout(Duration::from_secs(120))
///     .collect()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ExternalCollector {
    program: OsString,
    args: Vec<Arg>,
    timeout: Duration,
}

impl ExternalCollector {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_COLLECT_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(Arg {
            value: arg.into(),
            secret: false,
        });
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        for a in args {
            self = self.arg(a);
        }
        self
    }

    /// An argument passed to the process but shown as `***` in logs and
    /// [`display_command`](Self::display_command).
    pub fn secret_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(Arg {
            value: arg.into(),
            secret: true,
        });
        self
    }

    /// Bound the wait. The child is killed when it elapses.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = limit;
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// The command line with secret arguments redacted.
    pub fn display_command(&self) -> String {
        let mut line = self.program_name();
        for a in &self.args {
            line.push(' ');
            if a.secret {
                line.push_str(REDACTED);
            } else {
                line.push_str(&a.value.to_string_lossy());
            }
        }
        line
    }

    /// Run the command to completion and return its stdout.
    pub async fn collect(&self) -> Result<String, CollectError> {
        let program = self.program_name();
        info!("Running collector: {}", self.display_command());
        let start = Instant::now();

        let child = tokio::process::Command::new(&self.program)
            .args(self.args.iter().map(|a| &a.value))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CollectError::Spawn {
                program: program.clone(),
                source,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let wait = child.wait_with_output();
        let limit = self.timeout;
        let output = match tokio::time::timeout(limit, wait).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Collector {program} exceeded {:.0}s; killed",
                    limit.as_secs_f64()
                );
                return Err(CollectError::TimedOut {
                    program,
                    secs: limit.as_secs(),
                });
            }
        }
        .map_err(|source| CollectError::Wait {
            program: program.clone(),
            source,
        })?;

        debug!(
            "Collector {program} exited with {} in {:.1}s ({} bytes stdout, {} bytes stderr)",
            output.status,
            start.elapsed().as_secs_f64(),
            output.stdout.len(),
            output.stderr.len()
        );

        if !output.status.success() {
            return Err(CollectError::NonZeroExit {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|source| CollectError::InvalidOutput { program, source })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ExternalCollector {
        ExternalCollector::new("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn stdout_is_the_payload() {
        let out = sh(r#"printf '[{"id":1}]'"#).collect().await.unwrap();
        assert_eq!(out, r#"[{"id":1}]"#);
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let err = sh("echo partial; echo 'auth error' >&2; exit 1")
            .collect()
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::NonZeroExit { .. }));
        assert!(err.to_string().contains("auth error"), "{err}");
    }

    #[tokio::test]
    async fn non_utf8_stdout_is_rejected() {
        let err = sh(r"printf '[\377\376]'").collect().await.unwrap_err();
        assert!(matches!(err, CollectError::InvalidOutput { .. }), "{err}");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = ExternalCollector::new("/nonexistent/logsage-collector")
            .collect()
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::Spawn { .. }));
    }

    #[tokio::test]
    async fn hung_process_times_out() {
        let start = Instant::now();
        let err = sh("sleep 30")
            .timeout(Duration::from_millis(200))
            .collect()
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn secrets_are_redacted_in_display() {
        let collector = ExternalCollector::new("pwsh")
            .args(["-KustoUri", "https://kusto.example"])
            .arg("-BearerToken")
            .secret_arg("s3cr3t");
        let shown = collector.display_command();
        assert_eq!(
            shown,
            "pwsh -KustoUri https://kusto.example -BearerToken ***"
        );
        assert!(!shown.contains("s3cr3t"));
    }
}
